//! Identity provider seam
//!
//! The identity provider's OAuth implementation is consumed as an opaque
//! capability. This module defines the contract the session manager relies on
//! and a couple of adapters around it.

pub mod manual;
pub mod platform;

pub use manual::ManualProvider;
pub use platform::PlatformGatedProvider;

use crate::models::ProviderProfile;
use async_trait::async_trait;

/// Errors reported by an identity provider
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The user dismissed the consent screen
    #[error("sign-in was cancelled by the user")]
    Cancelled,

    /// Provider SDK could not be initialized
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// Provider sign-in failed for a reason other than cancellation
    #[error("sign-in failed: {0}")]
    SignIn(String),

    /// Provider sign-out failed
    #[error("sign-out failed: {0}")]
    SignOut(String),
}

/// Opaque identity provider capability
///
/// Implementations wrap a platform SDK (Google Sign-In and friends). The
/// session manager calls [`IdentityProvider::initialize`] before every
/// attempt, so it must be idempotent.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Prepare the provider SDK
    ///
    /// # Errors
    ///
    /// Returns an error if the SDK cannot be initialized.
    async fn initialize(&self) -> Result<(), ProviderError>;

    /// Run the interactive sign-in and return the user's profile
    ///
    /// # Errors
    ///
    /// Returns an error if the user cancels or the provider fails.
    async fn sign_in(&self) -> Result<ProviderProfile, ProviderError>;

    /// Sign out of the provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached.
    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}
