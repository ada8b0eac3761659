//! Auth Session Manager - sign-in orchestration and session lifecycle
//!
//! The `AuthSessionManager` owns the authentication state machine and is the
//! only writer of the [`SessionStore`]. It drives one sign-in flow at a time:
//!
//! 1. initialize the identity provider
//! 2. obtain an authorization artifact from it
//! 3. redeem the artifact's server auth code with the backend
//! 4. persist the resulting session and flip to `Authenticated`
//!
//! ## Organization
//!
//! 1. **Construction** - wiring the provider, verifier and store
//! 2. **Reads** - pure accessors over in-memory state
//! 3. **Restore** - adopting a previously persisted session
//! 4. **Sign-in** - the attempt state machine
//! 5. **Sign-out** - teardown
//! 6. **Tests**
//!
//! ## Consistency
//!
//! In-memory state sits behind a `std::sync::RwLock` that is never held across
//! an `.await`. Every attempt carries a generation number; sign-out bumps the
//! generation so a result that arrives late can be recognised and dropped.
//! Store mutations are serialised through an async mutex, and a commit checks
//! the generation both before writing and before publishing `Authenticated`.
//! Sign-out bumps the generation and clears the store under that same mutex,
//! so memory and store never disagree once it is released.

use crate::models::auth::{AuthError, AuthEvent, AuthState};
use crate::models::{AuthorizationArtifact, Session, UserRecord, VerificationRequest};
use crate::provider::IdentityProvider;
use crate::store::{SessionRead, SessionStore};
use crate::utils::logging::LoggingHelper;
use crate::verifier::BackendVerifier;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{broadcast, Mutex};

/// Capacity of the state transition channel
const EVENT_CHANNEL_CAPACITY: usize = 32;

struct ManagerState {
    state: AuthState,
    session: Option<Session>,
    generation: u64,
}

// =============================================================================
// 1. Construction
// =============================================================================

/// Orchestrates sign-in, sign-out and session restoration
pub struct AuthSessionManager {
    provider: Arc<dyn IdentityProvider>,
    verifier: Arc<dyn BackendVerifier>,
    store: Arc<dyn SessionStore>,
    inner: RwLock<ManagerState>,
    store_guard: Mutex<()>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthSessionManager {
    /// Create a manager in the `Unauthenticated` state
    ///
    /// Call [`AuthSessionManager::restore`] afterwards to adopt a session
    /// persisted by a previous run.
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        verifier: Arc<dyn BackendVerifier>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            provider,
            verifier,
            store,
            inner: RwLock::new(ManagerState {
                state: AuthState::Unauthenticated,
                session: None,
                generation: 0,
            }),
            store_guard: Mutex::new(()),
            events,
        }
    }

    /// Subscribe to state transitions
    ///
    /// Transitions are published even when nobody listens; a slow subscriber
    /// only loses old events, it never blocks the manager.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ManagerState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ManagerState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, state: &mut ManagerState, to: AuthState) {
        let from = state.state;
        if from == to {
            return;
        }
        state.state = to;
        LoggingHelper::log_transition(from, to);
        // No receivers is fine
        let _ = self.events.send(AuthEvent { from, to });
    }
}

// =============================================================================
// 2. Reads
// =============================================================================

impl AuthSessionManager {
    /// Current state of the state machine
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.read_state().state
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let state = self.read_state();
        state.state == AuthState::Authenticated && state.session.is_some()
    }

    /// The signed-in user, if any
    #[must_use]
    pub fn get_user(&self) -> Option<UserRecord> {
        self.read_state().session.as_ref().map(|s| s.user.clone())
    }

    /// The backend-issued session token, if any
    #[must_use]
    pub fn get_token(&self) -> Option<String> {
        self.read_state().session.as_ref().map(|s| s.token.clone())
    }

    /// Name of the configured identity provider
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }
}

// =============================================================================
// 3. Restore
// =============================================================================

impl AuthSessionManager {
    /// Adopt the session persisted in the store, if there is a usable one
    ///
    /// Never contacts the provider or the backend. A corrupted record is
    /// discarded and the manager stays `Unauthenticated`. While a sign-in is
    /// in flight, while a session is already active, or when the store cannot
    /// be read, in-memory state is left as it is and the current user is
    /// returned.
    pub async fn restore(&self) -> Option<UserRecord> {
        let _guard = self.store_guard.lock().await;

        match self.state() {
            AuthState::Authenticating => {
                log::debug!("Sign-in in progress; skipping session restore");
                return None;
            }
            AuthState::Authenticated => {
                log::debug!("Session already active; skipping session restore");
                return self.get_user();
            }
            AuthState::Unauthenticated | AuthState::Error => {}
        }

        let read = match self.store.read().await {
            Ok(read) => read,
            Err(e) => {
                log::warn!("Could not read session store; keeping current state: {e}");
                return self.get_user();
            }
        };

        let corrupted = matches!(read, SessionRead::Corrupted(_));
        if let SessionRead::Corrupted(reason) = &read {
            LoggingHelper::log_store_corrupted(reason);
        }

        let restored = {
            let mut state = self.write_state();
            if state.state == AuthState::Authenticating {
                return None;
            }
            match read.into_session() {
                Some(session) => {
                    let user = session.user.clone();
                    state.session = Some(session);
                    self.transition(&mut state, AuthState::Authenticated);
                    Some(user)
                }
                None => {
                    state.session = None;
                    self.transition(&mut state, AuthState::Unauthenticated);
                    None
                }
            }
        };

        if corrupted {
            if let Err(e) = self.store.clear().await {
                log::warn!("Failed to clear corrupted session record: {e}");
            }
        }

        if let Some(user) = &restored {
            LoggingHelper::log_session_restored(&user.email);
        }
        restored
    }
}

// =============================================================================
// 4. Sign-in
// =============================================================================

impl AuthSessionManager {
    /// Run a complete sign-in attempt
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Another attempt is in flight (`AlreadyInProgress`)
    /// - A session is already active (`AlreadyAuthenticated`)
    /// - The provider fails or the user cancels (`Provider`)
    /// - The provider returns no server auth code (`MissingAuthCode`)
    /// - The backend cannot be reached (`VerificationTransport`)
    /// - The backend declines or breaks the protocol (`BackendRejected`)
    /// - The session cannot be persisted (`Storage`)
    /// - A sign-out happened while the attempt was running (`Superseded`)
    pub async fn sign_in(&self) -> Result<UserRecord, AuthError> {
        let attempt = self.begin_attempt()?;
        LoggingHelper::log_sign_in_started(self.provider.provider_name(), attempt);

        match self.run_attempt(attempt).await {
            Ok(user) => Ok(user),
            Err(err) => {
                self.fail_attempt(attempt, &err);
                Err(err)
            }
        }
    }

    fn begin_attempt(&self) -> Result<u64, AuthError> {
        let mut state = self.write_state();
        if !state.state.accepts_sign_in() {
            return Err(match state.state {
                AuthState::Authenticating => AuthError::AlreadyInProgress,
                _ => AuthError::AlreadyAuthenticated,
            });
        }

        state.generation += 1;
        let attempt = state.generation;
        self.transition(&mut state, AuthState::Authenticating);
        Ok(attempt)
    }

    async fn run_attempt(&self, attempt: u64) -> Result<UserRecord, AuthError> {
        self.provider.initialize().await?;

        let profile = self.provider.sign_in().await?;
        let artifact =
            AuthorizationArtifact::from_profile(profile).ok_or(AuthError::MissingAuthCode)?;
        LoggingHelper::log_artifact_received(
            self.provider.provider_name(),
            artifact.email(),
            artifact.has_provider_tokens(),
        );

        // The artifact is consumed here; a retry needs a fresh one from the provider
        let request = VerificationRequest::from_artifact(artifact);
        let verdict = self.verifier.verify(&request).await?;

        let (token, user) = verdict
            .into_session_parts()
            .map_err(AuthError::BackendRejected)?;

        self.commit(attempt, Session::new(token, user)).await
    }

    fn is_current(&self, attempt: u64) -> bool {
        let state = self.read_state();
        state.generation == attempt && state.state == AuthState::Authenticating
    }

    async fn commit(&self, attempt: u64, session: Session) -> Result<UserRecord, AuthError> {
        let _guard = self.store_guard.lock().await;

        if !self.is_current(attempt) {
            return Err(AuthError::Superseded);
        }

        if let Err(e) = self.store.write(&session).await {
            if let Err(clear_err) = self.store.clear().await {
                log::warn!("Failed to clear session store after write failure: {clear_err}");
            }
            return Err(AuthError::Storage(e));
        }

        let committed = {
            let mut state = self.write_state();
            if state.generation == attempt && state.state == AuthState::Authenticating {
                LoggingHelper::log_session_established(&session.user.email, &session.token);
                let user = session.user.clone();
                state.session = Some(session);
                self.transition(&mut state, AuthState::Authenticated);
                Some(user)
            } else {
                None
            }
        };

        match committed {
            Some(user) => Ok(user),
            None => {
                // Signed out while the write was in flight
                if let Err(e) = self.store.clear().await {
                    log::warn!("Failed to clear superseded session: {e}");
                }
                Err(AuthError::Superseded)
            }
        }
    }

    fn fail_attempt(&self, attempt: u64, err: &AuthError) {
        LoggingHelper::log_sign_in_failed(attempt, err);

        let mut state = self.write_state();
        if state.generation == attempt && state.state == AuthState::Authenticating {
            self.transition(&mut state, AuthState::Error);
            self.transition(&mut state, AuthState::Unauthenticated);
        }
    }
}

// =============================================================================
// 5. Sign-out
// =============================================================================

impl AuthSessionManager {
    /// Tear down the session
    ///
    /// Local state and the store are torn down together under the store
    /// guard; any in-flight sign-in is superseded. Provider sign-out runs
    /// afterwards, outside the guard. It is best effort and its failure is only
    /// logged. Calling this while signed out is harmless.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the persisted session could not be removed. The
    /// in-memory session is gone either way.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let cleared = {
            let _guard = self.store_guard.lock().await;
            {
                let mut state = self.write_state();
                state.generation += 1;
                state.session = None;
                self.transition(&mut state, AuthState::Unauthenticated);
            }
            self.store.clear().await
        };

        if let Err(e) = self.provider.sign_out().await {
            log::warn!(
                "{} sign-out failed; local session already cleared: {e}",
                self.provider.provider_name()
            );
        }

        cleared?;
        LoggingHelper::log_signed_out(self.provider.provider_name());
        Ok(())
    }
}

// =============================================================================
// 6. Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VerificationResult;
    use crate::provider::ProviderError;
    use crate::store::{MemorySessionStore, TOKEN_SLOT, USER_SLOT};
    use crate::testing::mock::{MockBackendVerifier, MockIdentityProvider, MockSessionStore};
    use crate::testing::TestFixtures;
    use crate::verifier::VerifierError;
    use tokio::sync::Notify;

    type Harness = (
        AuthSessionManager,
        Arc<MockIdentityProvider>,
        Arc<MockBackendVerifier>,
        Arc<MemorySessionStore>,
    );

    fn manager(provider: MockIdentityProvider, verifier: MockBackendVerifier) -> Harness {
        let provider = Arc::new(provider);
        let verifier = Arc::new(verifier);
        let store = Arc::new(MemorySessionStore::new());
        let manager = AuthSessionManager::new(provider.clone(), verifier.clone(), store.clone());
        (manager, provider, verifier, store)
    }

    fn drain(rx: &mut broadcast::Receiver<AuthEvent>) -> Vec<AuthState> {
        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event.to);
        }
        seen
    }

    #[tokio::test]
    async fn test_successful_sign_in_persists_session() {
        let (manager, provider, verifier, store) = manager(
            MockIdentityProvider::with_code("code123"),
            MockBackendVerifier::accepting("tok1", TestFixtures::user()),
        );

        let user = manager.sign_in().await.unwrap();

        assert_eq!(user, TestFixtures::user());
        assert!(manager.is_authenticated());
        assert_eq!(manager.get_token().as_deref(), Some("tok1"));
        assert_eq!(manager.get_user(), Some(TestFixtures::user()));
        assert_eq!(provider.initialize_calls(), 1);
        assert_eq!(verifier.calls(), 1);
        assert_eq!(
            verifier.last_request().map(|r| r.server_auth_code),
            Some("code123".to_string())
        );

        let stored = store.read().await.unwrap().into_session().unwrap();
        assert_eq!(stored.token, "tok1");
    }

    #[tokio::test]
    async fn test_rejection_leaves_store_untouched() {
        let (manager, _, _, store) = manager(
            MockIdentityProvider::with_code("code123"),
            MockBackendVerifier::rejecting(Some("revoked")),
        );
        store.insert_raw(TOKEN_SLOT, "legacy-token");
        store.insert_raw(USER_SLOT, "legacy-user");

        let err = manager.sign_in().await.unwrap_err();

        assert!(matches!(&err, AuthError::BackendRejected(msg) if msg == "revoked"));
        assert_eq!(manager.state(), AuthState::Unauthenticated);
        assert!(!manager.is_authenticated());
        assert_eq!(store.raw(TOKEN_SLOT).as_deref(), Some("legacy-token"));
        assert_eq!(store.raw(USER_SLOT).as_deref(), Some("legacy-user"));
    }

    #[tokio::test]
    async fn test_failure_passes_through_error_state() {
        let (manager, _, _, _) = manager(
            MockIdentityProvider::with_code("code123"),
            MockBackendVerifier::rejecting(None),
        );
        let mut events = manager.subscribe();

        let err = manager.sign_in().await.unwrap_err();

        assert_eq!(err.to_string(), "Backend authentication failed");
        assert_eq!(
            drain(&mut events),
            vec![
                AuthState::Authenticating,
                AuthState::Error,
                AuthState::Unauthenticated
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_code_never_reaches_backend() {
        let (manager, _, verifier, _) = manager(
            MockIdentityProvider::without_code(),
            MockBackendVerifier::accepting("tok1", TestFixtures::user()),
        );

        let err = manager.sign_in().await.unwrap_err();

        assert!(matches!(err, AuthError::MissingAuthCode));
        assert_eq!(verifier.calls(), 0);
        assert_eq!(manager.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_provider_cancellation() {
        let (manager, _, verifier, _) = manager(
            MockIdentityProvider::failing(ProviderError::Cancelled),
            MockBackendVerifier::accepting("tok1", TestFixtures::user()),
        );

        let err = manager.sign_in().await.unwrap_err();

        assert!(matches!(err, AuthError::Provider(ProviderError::Cancelled)));
        assert_eq!(verifier.calls(), 0);
        assert_eq!(manager.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_transport_error_is_distinct_from_rejection() {
        let (manager, _, _, store) = manager(
            MockIdentityProvider::with_code("code123"),
            MockBackendVerifier::failing(VerifierError::Status("502 Bad Gateway".to_string())),
        );

        let err = manager.sign_in().await.unwrap_err();

        assert!(matches!(err, AuthError::VerificationTransport(VerifierError::Status(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_partial_success_is_protocol_violation() {
        let (manager, _, _, store) = manager(
            MockIdentityProvider::with_code("code123"),
            MockBackendVerifier::with_result(VerificationResult {
                success: true,
                token: Some("tok1".to_string()),
                user: None,
                message: None,
            }),
        );

        let err = manager.sign_in().await.unwrap_err();

        assert!(matches!(err, AuthError::BackendRejected(_)));
        assert!(store.is_empty());
        assert!(manager.get_token().is_none());
    }

    #[tokio::test]
    async fn test_retry_after_failure_solicits_new_artifact() {
        let (manager, provider, verifier, _) = manager(
            MockIdentityProvider::with_code("code123"),
            MockBackendVerifier::rejecting(Some("invalid_grant")),
        );

        assert!(manager.sign_in().await.is_err());
        verifier.set_result(Ok(VerificationResult::accepted("tok2", TestFixtures::user())));
        manager.sign_in().await.unwrap();

        assert_eq!(provider.sign_in_calls(), 2);
        assert_eq!(provider.initialize_calls(), 2);
        assert_eq!(manager.get_token().as_deref(), Some("tok2"));
    }

    #[tokio::test]
    async fn test_sign_in_while_authenticated_is_refused() {
        let (manager, provider, _, _) = manager(
            MockIdentityProvider::with_code("code123"),
            MockBackendVerifier::accepting("tok1", TestFixtures::user()),
        );
        manager.sign_in().await.unwrap();

        let err = manager.sign_in().await.unwrap_err();

        assert!(matches!(err, AuthError::AlreadyAuthenticated));
        assert_eq!(provider.sign_in_calls(), 1);
        assert!(manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_concurrent_sign_in_is_rejected() {
        let gate = Arc::new(Notify::new());
        let (manager, _, _, _) = manager(
            MockIdentityProvider::with_code("code123").with_gate(gate.clone()),
            MockBackendVerifier::accepting("tok1", TestFixtures::user()),
        );
        let manager = Arc::new(manager);

        let first = tokio::spawn({
            let manager = manager.clone();
            async move { manager.sign_in().await }
        });
        while manager.state() != AuthState::Authenticating {
            tokio::task::yield_now().await;
        }

        let second = manager.sign_in().await;
        assert!(matches!(second, Err(AuthError::AlreadyInProgress)));
        assert_eq!(manager.state(), AuthState::Authenticating);

        gate.notify_one();
        let user = first.await.unwrap().unwrap();
        assert_eq!(user, TestFixtures::user());
        assert!(manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_out_supersedes_in_flight_sign_in() {
        let gate = Arc::new(Notify::new());
        let (manager, _, _, store) = manager(
            MockIdentityProvider::with_code("code123").with_gate(gate.clone()),
            MockBackendVerifier::accepting("tok1", TestFixtures::user()),
        );
        let manager = Arc::new(manager);

        let first = tokio::spawn({
            let manager = manager.clone();
            async move { manager.sign_in().await }
        });
        while manager.state() != AuthState::Authenticating {
            tokio::task::yield_now().await;
        }

        manager.sign_out().await.unwrap();
        gate.notify_one();

        let result = first.await.unwrap();
        assert!(matches!(result, Err(AuthError::Superseded)));
        assert_eq!(manager.state(), AuthState::Unauthenticated);
        assert!(manager.get_token().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_is_idempotent() {
        let (manager, provider, _, store) = manager(
            MockIdentityProvider::with_code("code123"),
            MockBackendVerifier::accepting("tok1", TestFixtures::user()),
        );
        manager.sign_in().await.unwrap();

        manager.sign_out().await.unwrap();
        let after_one = (manager.state(), manager.get_user(), store.is_empty());
        manager.sign_out().await.unwrap();
        let after_two = (manager.state(), manager.get_user(), store.is_empty());

        assert_eq!(after_one, (AuthState::Unauthenticated, None, true));
        assert_eq!(after_one, after_two);
        assert_eq!(provider.sign_out_calls(), 2);
    }

    #[tokio::test]
    async fn test_provider_sign_out_failure_still_clears_locally() {
        let (manager, _, _, store) = manager(
            MockIdentityProvider::with_code("code123")
                .with_sign_out_error(ProviderError::SignOut("network unreachable".to_string())),
            MockBackendVerifier::accepting("tok1", TestFixtures::user()),
        );
        manager.sign_in().await.unwrap();

        manager.sign_out().await.unwrap();

        assert!(!manager.is_authenticated());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_restore_adopts_stored_session_without_network() {
        let store = Arc::new(MemorySessionStore::new());
        store.write(&TestFixtures::session()).await.unwrap();

        let provider = Arc::new(MockIdentityProvider::with_code("unused"));
        let verifier = Arc::new(MockBackendVerifier::accepting("unused", TestFixtures::user()));
        let manager = AuthSessionManager::new(provider.clone(), verifier.clone(), store);

        let user = manager.restore().await;

        assert_eq!(user, Some(TestFixtures::user()));
        assert!(manager.is_authenticated());
        assert_eq!(manager.get_token(), Some(TestFixtures::session().token));
        assert_eq!(provider.total_calls(), 0);
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_restore_discards_corrupted_record() {
        let (manager, _, _, store) = manager(
            MockIdentityProvider::with_code("code123"),
            MockBackendVerifier::accepting("tok1", TestFixtures::user()),
        );
        store.insert_raw(TOKEN_SLOT, "tok1");
        store.insert_raw(USER_SLOT, "{{{not json");

        assert!(manager.restore().await.is_none());
        assert_eq!(manager.state(), AuthState::Unauthenticated);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_restore_survives_unreadable_store() {
        let store = Arc::new(MockSessionStore::new());
        store.fail_reads(true);
        let manager = AuthSessionManager::new(
            Arc::new(MockIdentityProvider::with_code("code123")),
            Arc::new(MockBackendVerifier::accepting("tok1", TestFixtures::user())),
            store,
        );

        assert!(manager.restore().await.is_none());
        assert_eq!(manager.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_store_write_failure_fails_attempt() {
        let store = Arc::new(MockSessionStore::new());
        store.fail_writes(true);
        let manager = AuthSessionManager::new(
            Arc::new(MockIdentityProvider::with_code("code123")),
            Arc::new(MockBackendVerifier::accepting("tok1", TestFixtures::user())),
            store.clone(),
        );

        let err = manager.sign_in().await.unwrap_err();

        assert!(matches!(err, AuthError::Storage(_)));
        assert_eq!(manager.state(), AuthState::Unauthenticated);
        assert!(store.inner().is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_allowed_again_after_sign_out() {
        let (manager, provider, _, _) = manager(
            MockIdentityProvider::with_code("code123"),
            MockBackendVerifier::accepting("tok1", TestFixtures::user()),
        );

        manager.sign_in().await.unwrap();
        manager.sign_out().await.unwrap();
        manager.sign_in().await.unwrap();

        assert!(manager.is_authenticated());
        assert_eq!(provider.sign_in_calls(), 2);
    }

    #[tokio::test]
    async fn test_sign_in_while_provider_signs_out_stays_persisted() {
        let gate = Arc::new(Notify::new());
        let (manager, provider, _, store) = manager(
            MockIdentityProvider::with_code("code123").with_sign_out_gate(gate.clone()),
            MockBackendVerifier::accepting("tok1", TestFixtures::user()),
        );
        let manager = Arc::new(manager);

        let sign_out = tokio::spawn({
            let manager = manager.clone();
            async move { manager.sign_out().await }
        });
        while provider.sign_out_calls() == 0 {
            tokio::task::yield_now().await;
        }

        manager.sign_in().await.unwrap();
        gate.notify_one();
        sign_out.await.unwrap().unwrap();

        assert!(manager.is_authenticated());
        assert_eq!(manager.get_token().as_deref(), Some("tok1"));
        assert_eq!(
            store.read().await.unwrap().into_session(),
            Some(TestFixtures::session())
        );
    }

    #[tokio::test]
    async fn test_restore_while_provider_signs_out_finds_nothing() {
        let gate = Arc::new(Notify::new());
        let (manager, provider, _, store) = manager(
            MockIdentityProvider::with_code("code123").with_sign_out_gate(gate.clone()),
            MockBackendVerifier::accepting("tok1", TestFixtures::user()),
        );
        let manager = Arc::new(manager);
        manager.sign_in().await.unwrap();

        let sign_out = tokio::spawn({
            let manager = manager.clone();
            async move { manager.sign_out().await }
        });
        while provider.sign_out_calls() == 0 {
            tokio::task::yield_now().await;
        }

        assert!(manager.restore().await.is_none());
        assert!(!manager.is_authenticated());
        assert!(store.is_empty());

        gate.notify_one();
        sign_out.await.unwrap().unwrap();
        assert!(!manager.is_authenticated());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_store_keeps_active_session() {
        let store = Arc::new(MockSessionStore::new());
        let manager = AuthSessionManager::new(
            Arc::new(MockIdentityProvider::with_code("code123")),
            Arc::new(MockBackendVerifier::accepting("tok1", TestFixtures::user())),
            store.clone(),
        );
        manager.sign_in().await.unwrap();

        store.fail_reads(true);
        let user = manager.restore().await;
        store.fail_reads(false);

        assert_eq!(user, Some(TestFixtures::user()));
        assert!(manager.is_authenticated());
        assert_eq!(
            store.read().await.unwrap().into_session(),
            Some(TestFixtures::session())
        );
    }

    #[tokio::test]
    async fn test_sign_out_reports_clear_failure_after_local_teardown() {
        let store = Arc::new(MockSessionStore::new());
        let provider = Arc::new(MockIdentityProvider::with_code("code123"));
        let manager = AuthSessionManager::new(
            provider.clone(),
            Arc::new(MockBackendVerifier::accepting("tok1", TestFixtures::user())),
            store.clone(),
        );
        manager.sign_in().await.unwrap();
        store.fail_clears(true);

        let result = manager.sign_out().await;

        assert!(matches!(result, Err(AuthError::Storage(_))));
        assert_eq!(manager.state(), AuthState::Unauthenticated);
        assert!(manager.get_token().is_none());
        assert!(manager.get_user().is_none());
        assert_eq!(provider.sign_out_calls(), 1);
    }

    #[tokio::test]
    async fn test_restore_of_corrupted_record_survives_clear_failure() {
        let store = Arc::new(MockSessionStore::new());
        store.inner().insert_raw(TOKEN_SLOT, "tok1");
        store.inner().insert_raw(USER_SLOT, "{{{not json");
        store.fail_clears(true);
        let manager = AuthSessionManager::new(
            Arc::new(MockIdentityProvider::with_code("code123")),
            Arc::new(MockBackendVerifier::accepting("tok1", TestFixtures::user())),
            store.clone(),
        );

        assert!(manager.restore().await.is_none());
        assert_eq!(manager.state(), AuthState::Unauthenticated);
        assert_eq!(store.inner().raw(TOKEN_SLOT).as_deref(), Some("tok1"));
    }
}
