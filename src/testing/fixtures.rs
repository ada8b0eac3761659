//! Test fixtures providing pre-built test objects

use super::constants::{
    TEST_AUTH_CODE, TEST_EMAIL, TEST_IMAGE_URL, TEST_TOKEN, TEST_USER_ID, TEST_USER_NAME,
};
use crate::models::{ProviderProfile, Session, UserRecord};
use crate::settings::AuthflowSettings;

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// The user the backend vouches for in most tests
    #[must_use]
    pub fn user() -> UserRecord {
        UserRecord {
            id: TEST_USER_ID.to_string(),
            email: TEST_EMAIL.to_string(),
            name: TEST_USER_NAME.to_string(),
            image_url: TEST_IMAGE_URL.to_string(),
        }
    }

    /// A committed session for [`TestFixtures::user`]
    #[must_use]
    pub fn session() -> Session {
        Session::new(TEST_TOKEN.to_string(), Self::user())
    }

    /// Provider profile carrying `code` as the server auth code
    #[must_use]
    pub fn profile(code: &str) -> ProviderProfile {
        ProviderProfile {
            id: TEST_USER_ID.to_string(),
            email: TEST_EMAIL.to_string(),
            name: TEST_USER_NAME.to_string(),
            given_name: "A".to_string(),
            family_name: "B".to_string(),
            image_url: TEST_IMAGE_URL.to_string(),
            server_auth_code: Some(code.to_string()),
            id_token: Some("test_id_token".to_string()),
            access_token: Some("test_access_token".to_string()),
        }
    }

    /// Provider profile without a server auth code
    #[must_use]
    pub fn profile_without_code() -> ProviderProfile {
        ProviderProfile {
            server_auth_code: None,
            ..Self::profile(TEST_AUTH_CODE)
        }
    }

    /// Settings pointing at a local backend and a session file under `store_path`
    #[must_use]
    pub fn settings(backend_url: &str, store_path: &str) -> AuthflowSettings {
        let mut settings = AuthflowSettings::default();
        settings.backend.base_url = backend_url.to_string();
        settings.backend.timeout_seconds = 5;
        settings.provider.native_platform = false;
        settings.store.path = store_path.to_string();
        settings
    }
}
