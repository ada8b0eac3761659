//! HTTP implementation of the backend verifier
//!
//! Posts the verification request as JSON and parses the JSON verdict. Any
//! non-2xx status, unreadable body or transport failure maps to a
//! [`VerifierError`]; only a well-formed body reaches the caller as a
//! [`VerificationResult`].

use super::{BackendVerifier, VerifierError};
use crate::models::{VerificationRequest, VerificationResult};
use crate::settings::BackendSettings;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Backend verifier speaking JSON over HTTP(S)
#[derive(Clone, Debug)]
pub struct HttpBackendVerifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpBackendVerifier {
    /// Create a verifier for `base_url` + `verify_path`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The endpoint URL does not parse
    /// - The scheme is neither `http` nor `https`
    /// - The HTTP client cannot be built
    pub fn new(base_url: &str, verify_path: &str, timeout: Duration) -> Result<Self, VerifierError> {
        let endpoint = Self::build_endpoint(base_url, verify_path)?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifierError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    /// Create a verifier from backend settings
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoint is invalid.
    pub fn from_settings(settings: &BackendSettings) -> Result<Self, VerifierError> {
        Self::new(
            &settings.base_url,
            &settings.verify_path,
            Duration::from_secs(settings.timeout_seconds),
        )
    }

    /// The fully resolved verification endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    fn build_endpoint(base_url: &str, verify_path: &str) -> Result<Url, VerifierError> {
        let joined = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            verify_path.trim_start_matches('/')
        );

        let endpoint = Url::parse(&joined)
            .map_err(|e| VerifierError::Configuration(format!("{joined}: {e}")))?;

        match endpoint.scheme() {
            "http" | "https" => Ok(endpoint),
            other => Err(VerifierError::Configuration(format!(
                "unsupported scheme '{other}' in {joined}"
            ))),
        }
    }
}

#[async_trait]
impl BackendVerifier for HttpBackendVerifier {
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationResult, VerifierError> {
        log::debug!("Submitting server auth code to {}", self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| VerifierError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Backend verification endpoint answered with status {status}");
            return Err(VerifierError::Status(status.to_string()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| VerifierError::Request(format!("Failed to read response body: {e}")))?;

        let result: VerificationResult = serde_json::from_str(&body)
            .map_err(|e| VerifierError::MalformedResponse(e.to_string()))?;

        log::debug!(
            "Backend verdict received: success={}, token={}, user={}",
            result.success,
            if result.token.is_some() { "present" } else { "missing" },
            if result.user.is_some() { "present" } else { "missing" },
        );
        Ok(result)
    }
}
