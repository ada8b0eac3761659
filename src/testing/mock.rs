//! Mock objects and fake implementations for testing
//!
//! Each mock counts its calls and can be scripted to fail. The provider and
//! verifier can also be held open on a [`Notify`] gate to exercise
//! interleavings with an in-flight sign-in.

use super::constants::TEST_PROVIDER;
use super::fixtures::TestFixtures;
use crate::models::{ProviderProfile, Session, UserRecord, VerificationRequest, VerificationResult};
use crate::provider::{IdentityProvider, ProviderError};
use crate::store::{MemorySessionStore, SessionRead, SessionStore, StoreError};
use crate::verifier::{BackendVerifier, VerifierError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

/// Scriptable identity provider
pub struct MockIdentityProvider {
    outcome: Mutex<Result<ProviderProfile, ProviderError>>,
    sign_out_error: Option<ProviderError>,
    gate: Option<Arc<Notify>>,
    sign_out_gate: Option<Arc<Notify>>,
    initialize_calls: AtomicUsize,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl MockIdentityProvider {
    /// Provider whose sign-in yields the given profile
    #[must_use]
    pub fn with_profile(profile: ProviderProfile) -> Self {
        Self::scripted(Ok(profile))
    }

    /// Provider whose sign-in yields a profile carrying `code`
    #[must_use]
    pub fn with_code(code: &str) -> Self {
        Self::with_profile(TestFixtures::profile(code))
    }

    /// Provider whose sign-in succeeds but yields no server auth code
    #[must_use]
    pub fn without_code() -> Self {
        Self::with_profile(TestFixtures::profile_without_code())
    }

    /// Provider whose sign-in fails with `error`
    #[must_use]
    pub fn failing(error: ProviderError) -> Self {
        Self::scripted(Err(error))
    }

    fn scripted(outcome: Result<ProviderProfile, ProviderError>) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            sign_out_error: None,
            gate: None,
            sign_out_gate: None,
            initialize_calls: AtomicUsize::new(0),
            sign_in_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        }
    }

    /// Make sign-out fail with `error`
    #[must_use]
    pub fn with_sign_out_error(mut self, error: ProviderError) -> Self {
        self.sign_out_error = Some(error);
        self
    }

    /// Hold sign-in open until `gate` is notified
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Hold sign-out open until `gate` is notified
    #[must_use]
    pub fn with_sign_out_gate(mut self, gate: Arc<Notify>) -> Self {
        self.sign_out_gate = Some(gate);
        self
    }

    #[must_use]
    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    /// Calls of any kind
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.initialize_calls() + self.sign_in_calls() + self.sign_out_calls()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn initialize(&self) -> Result<(), ProviderError> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_in(&self) -> Result<ProviderProfile, ProviderError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.sign_out_gate {
            gate.notified().await;
        }
        match &self.sign_out_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn provider_name(&self) -> &str {
        TEST_PROVIDER
    }
}

/// Scriptable backend verifier
pub struct MockBackendVerifier {
    result: Mutex<Result<VerificationResult, VerifierError>>,
    last_request: Mutex<Option<VerificationRequest>>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl MockBackendVerifier {
    /// Verifier answering every request with `result`
    #[must_use]
    pub fn with_result(result: VerificationResult) -> Self {
        Self::scripted(Ok(result))
    }

    /// Verifier issuing `token` for `user`
    #[must_use]
    pub fn accepting(token: &str, user: UserRecord) -> Self {
        Self::with_result(VerificationResult::accepted(token, user))
    }

    /// Verifier declining every request
    #[must_use]
    pub fn rejecting(message: Option<&str>) -> Self {
        Self::with_result(VerificationResult::rejected(message))
    }

    /// Verifier that cannot reach the backend
    #[must_use]
    pub fn failing(error: VerifierError) -> Self {
        Self::scripted(Err(error))
    }

    fn scripted(result: Result<VerificationResult, VerifierError>) -> Self {
        Self {
            result: Mutex::new(result),
            last_request: Mutex::new(None),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Hold verification open until `gate` is notified
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Replace the scripted answer
    pub fn set_result(&self, result: Result<VerificationResult, VerifierError>) {
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = result;
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request received
    #[must_use]
    pub fn last_request(&self) -> Option<VerificationRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl BackendVerifier for MockBackendVerifier {
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationResult, VerifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// In-memory store whose operations can be made to fail
#[derive(Default)]
pub struct MockSessionStore {
    inner: MemorySessionStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_clears: AtomicBool,
}

impl MockSessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_clears(&self, fail: bool) {
        self.fail_clears.store(fail, Ordering::SeqCst);
    }

    /// The backing slot map
    #[must_use]
    pub const fn inner(&self) -> &MemorySessionStore {
        &self.inner
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn read(&self) -> Result<SessionRead, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Io("simulated read failure".to_string()));
        }
        self.inner.read().await
    }

    async fn write(&self, session: &Session) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io("simulated write failure".to_string()));
        }
        self.inner.write(session).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        if self.fail_clears.load(Ordering::SeqCst) {
            return Err(StoreError::Io("simulated clear failure".to_string()));
        }
        self.inner.clear().await
    }
}
