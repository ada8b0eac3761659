#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the authflow library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod authentication;
pub mod models;
pub mod provider;
pub mod session;
pub mod settings;
pub mod store;
pub mod utils;
pub mod verifier;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use authentication::AuthenticationServiceFactory;
pub use models::auth::{AuthError, AuthEvent, AuthState};
pub use models::{ProviderProfile, Session, UserRecord};
pub use provider::{IdentityProvider, ManualProvider, PlatformGatedProvider, ProviderError};
pub use session::AuthSessionManager;
pub use settings::AuthflowSettings;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoreError};
pub use verifier::{BackendVerifier, HttpBackendVerifier, VerifierError};
