//! Service factory for creating a configured session manager
//!
//! This module provides the factory pattern for creating `AuthSessionManager`
//! instances with the backend verifier and session store described by the
//! settings. The identity provider is supplied by the caller, since it wraps a
//! platform SDK or an out-of-band code.

use crate::provider::{IdentityProvider, PlatformGatedProvider};
use crate::session::AuthSessionManager;
use crate::settings::AuthflowSettings;
use crate::store::FileSessionStore;
use crate::verifier::{HttpBackendVerifier, VerifierError};
use std::sync::Arc;

/// Factory for creating authentication services with dependency injection
pub struct AuthenticationServiceFactory;

impl AuthenticationServiceFactory {
    /// Create a fully configured `AuthSessionManager`
    ///
    /// The provider is gated on the configured platform, verification goes
    /// to the configured backend over HTTP and the session lives in the
    /// configured file.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend URL is invalid or the HTTP client
    /// cannot be built.
    pub fn create_session_manager<P>(
        settings: &AuthflowSettings,
        provider: P,
    ) -> Result<AuthSessionManager, VerifierError>
    where
        P: IdentityProvider + 'static,
    {
        log::info!("🏭 Starting authentication service factory...");

        let provider = Self::gate_provider(provider, settings);
        let verifier = Self::create_verifier(settings)?;
        let store = Self::create_store(settings);

        log::info!("🏭 Authentication service factory completed successfully");
        Ok(AuthSessionManager::new(
            Arc::new(provider),
            Arc::new(verifier),
            Arc::new(store),
        ))
    }

    fn gate_provider<P: IdentityProvider>(
        provider: P,
        settings: &AuthflowSettings,
    ) -> PlatformGatedProvider<P> {
        if settings.provider.native_platform {
            log::info!(
                "✅ Identity provider {} configured for native platform",
                provider.provider_name()
            );
        } else {
            log::info!(
                "⚠️  Identity provider {} running off-platform; initialize and sign-out are skipped",
                provider.provider_name()
            );
        }
        PlatformGatedProvider::new(provider, settings.provider.native_platform)
    }

    fn create_verifier(settings: &AuthflowSettings) -> Result<HttpBackendVerifier, VerifierError> {
        let verifier = HttpBackendVerifier::from_settings(&settings.backend)?;
        log::info!("✅ Backend verifier configured");
        log::info!("   └─ Endpoint: {}", verifier.endpoint());
        log::info!("   └─ Timeout: {}s", settings.backend.timeout_seconds);
        Ok(verifier)
    }

    fn create_store(settings: &AuthflowSettings) -> FileSessionStore {
        let store = FileSessionStore::from_settings(&settings.store);
        log::info!("✅ Session store configured at {}", store.path().display());
        if store.is_encrypted() {
            log::info!("   └─ Encrypted at rest (AES-256-GCM)");
        } else {
            log::info!("⚠️  Session store is not encrypted; set SESSION_STORE_KEY to seal it");
        }
        store
    }
}
