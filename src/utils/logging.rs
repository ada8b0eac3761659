// Centralized logging helpers for the sign-in lifecycle
use log::{debug, info, warn};

use crate::models::auth::AuthState;

/// Mask a secret for logs and `Debug` output, keeping a short prefix
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{visible}…(redacted)")
    }
}

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log the start of a sign-in attempt
    pub fn log_sign_in_started(provider: &str, attempt: u64) {
        info!("🔐 Starting sign-in attempt #{attempt} with {provider}");
    }

    /// Log that the provider produced a usable artifact
    pub fn log_artifact_received(provider: &str, email: &str, has_provider_tokens: bool) {
        info!("✅ {provider} sign-in completed for {email}; verifying with backend");
        debug!("Provider tokens alongside server auth code: {has_provider_tokens}");
    }

    /// Log a committed session
    pub fn log_session_established(email: &str, token: &str) {
        info!(
            "Successfully established session for user: {email} (token {})",
            mask_secret(token)
        );
    }

    /// Log a failed attempt
    pub fn log_sign_in_failed(attempt: u64, reason: &dyn std::fmt::Display) {
        warn!("❌ Sign-in attempt #{attempt} failed: {reason}");
    }

    /// Log a restored session
    pub fn log_session_restored(email: &str) {
        info!("♻️  Restored session for {email} from local storage");
    }

    /// Log a corrupted stored record that is being discarded
    pub fn log_store_corrupted(reason: &str) {
        warn!("Discarding corrupted stored session: {reason}");
    }

    /// Log a state transition
    pub fn log_transition(from: AuthState, to: AuthState) {
        debug!("Auth state: {from} -> {to}");
    }

    /// Log the completion of a sign-out
    pub fn log_signed_out(provider: &str) {
        info!("👋 Signed out; local session cleared (provider: {provider})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret_hides_short_values_entirely() {
        assert_eq!(mask_secret("tok1"), "****");
        assert_eq!(mask_secret(""), "****");
    }

    #[test]
    fn test_mask_secret_keeps_prefix_of_long_values() {
        let masked = mask_secret("eyJhbGciOiJIUzI1NiJ9.payload.sig");
        assert!(masked.starts_with("eyJh"));
        assert!(!masked.contains("payload"));
    }
}
