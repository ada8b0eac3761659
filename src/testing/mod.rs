//! Unified testing utilities for authflow
//!
//! Test doubles for the three collaborators of the session manager, plus
//! shared fixtures.
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built test data (users, sessions, profiles, settings)
//! - [`mock`] - Scriptable provider, verifier and store implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use authflow::testing::{mock::{MockBackendVerifier, MockIdentityProvider}, TestFixtures};
//!
//! let provider = MockIdentityProvider::with_code("code123");
//! let verifier = MockBackendVerifier::accepting("tok1", TestFixtures::user());
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;

/// Common test constants
pub mod constants {
    /// Default test user id
    pub const TEST_USER_ID: &str = "1";

    /// Default test email address
    pub const TEST_EMAIL: &str = "a@b.com";

    /// Default test user name
    pub const TEST_USER_NAME: &str = "A B";

    /// Default test avatar URL
    pub const TEST_IMAGE_URL: &str = "u";

    /// Default server auth code
    pub const TEST_AUTH_CODE: &str = "code123";

    /// Default backend session token
    pub const TEST_TOKEN: &str = "tok1";

    /// Default provider name
    pub const TEST_PROVIDER: &str = "google";
}
