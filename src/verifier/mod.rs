//! Backend verification seam
//!
//! A verifier performs exactly one request/response exchange with the backend:
//! it submits the provider's one-time code and receives the backend's verdict.
//! Infrastructure failures are reported as [`VerifierError`], which is kept
//! apart from an in-band `success: false` verdict.

pub mod http;

pub use http::HttpBackendVerifier;

use crate::models::{VerificationRequest, VerificationResult};
use async_trait::async_trait;

/// Transport-level verification failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifierError {
    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("request to backend failed: {0}")]
    Request(String),

    /// The backend answered with a non-success HTTP status
    #[error("Backend authentication failed: {0}")]
    Status(String),

    /// The response body was not a valid verification result
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    /// The verifier was configured with an unusable endpoint
    #[error("invalid backend endpoint: {0}")]
    Configuration(String),
}

/// Protocol client for the backend verification endpoint
///
/// Implementations must not retry: server auth codes are single-use, so a
/// retried exchange would fail regardless and only obscure the real error.
#[async_trait]
pub trait BackendVerifier: Send + Sync {
    /// Exchange a verification request for the backend's verdict
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable, answers with a
    /// non-2xx status, or returns a body that does not parse.
    async fn verify(&self, request: &VerificationRequest)
        -> Result<VerificationResult, VerifierError>;
}
