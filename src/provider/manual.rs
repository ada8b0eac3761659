//! Provider backed by a server auth code obtained out of band
//!
//! Headless environments (the CLI, scripted setups) have no consent screen.
//! The user fetches a server auth code elsewhere and hands it over together
//! with the profile hints the backend expects. The code is handed out once;
//! a second sign-in on the same provider fails, mirroring single-use codes.

use super::{IdentityProvider, ProviderError};
use crate::models::ProviderProfile;
use async_trait::async_trait;
use std::sync::Mutex;

/// Identity provider that yields one pre-obtained profile
pub struct ManualProvider {
    name: String,
    profile: Mutex<Option<ProviderProfile>>,
}

impl ManualProvider {
    #[must_use]
    pub fn new(name: &str, profile: ProviderProfile) -> Self {
        Self {
            name: name.to_string(),
            profile: Mutex::new(Some(profile)),
        }
    }

    /// Provider with nothing to hand out; every sign-in fails
    ///
    /// Enough for flows that only restore or sign out.
    #[must_use]
    pub fn without_profile(name: &str) -> Self {
        Self {
            name: name.to_string(),
            profile: Mutex::new(None),
        }
    }
}

#[async_trait]
impl IdentityProvider for ManualProvider {
    async fn initialize(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn sign_in(&self) -> Result<ProviderProfile, ProviderError> {
        let taken = self
            .profile
            .lock()
            .map_err(|_| ProviderError::SignIn("provider state poisoned".to_string()))?
            .take();

        taken.ok_or_else(|| {
            ProviderError::SignIn("no unused server auth code available; obtain a new one".to_string())
        })
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}
