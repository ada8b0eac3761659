//! Platform gating for native identity providers
//!
//! Native provider SDKs only need initialization and sign-out on native
//! targets; in a browser context the same calls are meaningless. The gate
//! forwards sign-in unchanged and turns the other two into no-ops when the
//! process is not running on a native platform.

use super::{IdentityProvider, ProviderError};
use crate::models::ProviderProfile;
use async_trait::async_trait;

/// Wrapper that skips native-only provider calls off-platform
pub struct PlatformGatedProvider<P> {
    inner: P,
    native_platform: bool,
}

impl<P: IdentityProvider> PlatformGatedProvider<P> {
    #[must_use]
    pub const fn new(inner: P, native_platform: bool) -> Self {
        Self {
            inner,
            native_platform,
        }
    }

    #[must_use]
    pub const fn is_native_platform(&self) -> bool {
        self.native_platform
    }

    #[must_use]
    pub const fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: IdentityProvider> IdentityProvider for PlatformGatedProvider<P> {
    async fn initialize(&self) -> Result<(), ProviderError> {
        if self.native_platform {
            self.inner.initialize().await
        } else {
            log::debug!(
                "Skipping {} initialization on non-native platform",
                self.inner.provider_name()
            );
            Ok(())
        }
    }

    async fn sign_in(&self) -> Result<ProviderProfile, ProviderError> {
        self.inner.sign_in().await
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        if self.native_platform {
            self.inner.sign_out().await
        } else {
            log::debug!(
                "Skipping {} sign-out on non-native platform",
                self.inner.provider_name()
            );
            Ok(())
        }
    }

    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock::MockIdentityProvider;

    #[tokio::test]
    async fn test_non_native_skips_initialize_and_sign_out() {
        let gated = PlatformGatedProvider::new(MockIdentityProvider::with_code("code123"), false);

        gated.initialize().await.unwrap();
        gated.sign_out().await.unwrap();
        let profile = gated.sign_in().await.unwrap();

        assert_eq!(profile.server_auth_code.as_deref(), Some("code123"));
        assert_eq!(gated.inner().initialize_calls(), 0);
        assert_eq!(gated.inner().sign_out_calls(), 0);
        assert_eq!(gated.inner().sign_in_calls(), 1);
    }

    #[tokio::test]
    async fn test_native_forwards_every_call() {
        let gated = PlatformGatedProvider::new(MockIdentityProvider::with_code("code123"), true);

        gated.initialize().await.unwrap();
        gated.sign_out().await.unwrap();

        assert!(gated.is_native_platform());
        assert_eq!(gated.inner().initialize_calls(), 1);
        assert_eq!(gated.inner().sign_out_calls(), 1);
    }
}
