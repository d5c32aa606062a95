//! SessionStore: owns the session and its three transitions
//! (sign-in, sign-out, onboarding completion).

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::forms::{LoginForm, SignUpForm};
use super::identity::IdentityProvider;
use super::model::{Identity, Session, SessionEvent, SessionStatus};
use super::policy::is_returning_user;
use crate::error::{AuthError, SessionError};
use crate::store::{FlagStore, PreferenceStore, flag_keys};

const EVENT_CAPACITY: usize = 64;

/// Injectable session state with defined transition functions.
///
/// Starts in `Loading` until [`SessionStore::restore`] (or a sign-in) runs.
/// Every transition replaces the whole `Session` under one write lock, so
/// readers never observe a partially applied change. Transitions are also
/// serialized end to end, flag writes included, by the `transition` guard.
pub struct SessionStore {
    state: RwLock<SessionStatus>,
    transition: Mutex<()>,
    identity: Arc<dyn IdentityProvider>,
    flags: Arc<dyn FlagStore>,
    preferences: Arc<dyn PreferenceStore>,
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        flags: Arc<dyn FlagStore>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            state: RwLock::new(SessionStatus::Loading),
            transition: Mutex::new(()),
            identity,
            flags,
            preferences,
            tx,
        })
    }

    /// Subscribe to session transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.read().await.clone()
    }

    /// The current session, `None` while loading.
    pub async fn session(&self) -> Option<Session> {
        self.state.read().await.session().cloned()
    }

    /// Load the persisted session: the provider's current identity plus the
    /// local onboarding flag. Flags left behind without an identity are
    /// cleared.
    pub async fn restore(&self) -> Session {
        let _transition = self.transition.lock().await;
        let identity = match self.identity.current_identity().await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Identity provider unavailable during restore, continuing anonymous");
                None
            }
        };

        let session = match identity {
            Some(identity) => {
                let onboarded = self.flag_is_set(flag_keys::IS_ONBOARDED).await;
                Session::authenticated(identity, onboarded)
            }
            None => {
                self.clear_session_flags().await;
                Session::anonymous()
            }
        };

        *self.state.write().await = SessionStatus::Ready(session.clone());
        info!(phase = %session.phase(), "Session restored");
        self.emit(SessionEvent::Restored(session.phase()));
        session
    }

    /// Sign in with email and password.
    ///
    /// On failure the session is left anonymous. The new session starts
    /// onboarded when the identity is a returning user or already has stored
    /// preferences.
    pub async fn sign_in(&self, form: &LoginForm) -> Result<Session, AuthError> {
        form.validate()?;
        let _transition = self.transition.lock().await;
        let identity = match self
            .identity
            .sign_in(form.email.trim(), &form.password)
            .await
        {
            Ok(identity) => identity,
            Err(e) => {
                self.settle_anonymous().await;
                return Err(e);
            }
        };
        let onboarded = self.has_prior_onboarding(&identity).await;
        Ok(self.establish(identity, onboarded).await)
    }

    /// Create an account and sign in as it. New accounts are never onboarded.
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<Session, AuthError> {
        form.validate()?;
        let _transition = self.transition.lock().await;
        let identity = match self
            .identity
            .sign_up(form.email.trim(), &form.password)
            .await
        {
            Ok(identity) => identity,
            Err(e) => {
                self.settle_anonymous().await;
                return Err(e);
            }
        };
        Ok(self.establish(identity, false).await)
    }

    /// Sign out from any state. The identity and onboarding flag are cleared
    /// together; provider and flag-store failures are logged, not returned.
    pub async fn sign_out(&self) -> Session {
        let _transition = self.transition.lock().await;
        let previous = {
            let mut state = self.state.write().await;
            std::mem::replace(&mut *state, SessionStatus::Ready(Session::anonymous()))
        };

        if let Err(e) = self.identity.sign_out().await {
            warn!(error = %e, "Identity provider sign-out failed");
        }
        self.clear_session_flags().await;

        let user_id = previous
            .session()
            .and_then(|s| s.identity())
            .map(|i| i.id);
        info!(user_id = ?user_id, "Signed out");
        self.emit(SessionEvent::SignedOut);
        Session::anonymous()
    }

    /// Mark `user_id` as onboarded.
    ///
    /// Fails with `IdentityChanged` when a different identity is signed in by
    /// now, e.g. a wizard that finished after its user signed out and someone
    /// else signed in. Nothing is changed in that case.
    pub async fn complete_onboarding(&self, user_id: Uuid) -> Result<Session, SessionError> {
        let _transition = self.transition.lock().await;
        let session = {
            let mut state = self.state.write().await;
            let session = match &mut *state {
                SessionStatus::Loading => return Err(SessionError::Loading),
                SessionStatus::Ready(session) => session,
            };
            match session.identity().map(|i| i.id) {
                None => return Err(SessionError::NotAuthenticated),
                Some(current) if current != user_id => {
                    warn!(user_id = %user_id, current = %current, "Onboarding completed for a stale identity, ignoring");
                    return Err(SessionError::IdentityChanged);
                }
                Some(_) => {}
            }
            session.mark_onboarded();
            session.clone()
        };

        self.set_flag(flag_keys::IS_ONBOARDED).await;
        info!(user_id = %user_id, "Onboarding completed");
        self.emit(SessionEvent::Onboarded { user_id });
        Ok(session)
    }

    /// One-time promotion of a returning user evaluated by the guard.
    ///
    /// Only applies if `user_id` is still the signed-in, not-yet-onboarded
    /// identity and still qualifies as a returning user. Returns whether the
    /// session is onboarded afterwards.
    pub(crate) async fn promote_returning_user(&self, user_id: Uuid) -> bool {
        let _transition = self.transition.lock().await;
        let promoted = {
            let mut state = self.state.write().await;
            match &mut *state {
                SessionStatus::Ready(session) => match session.identity() {
                    Some(identity) if identity.id == user_id => {
                        if session.is_onboarded() {
                            return true;
                        }
                        if !is_returning_user(identity) {
                            return false;
                        }
                        session.mark_onboarded()
                    }
                    _ => false,
                },
                SessionStatus::Loading => false,
            }
        };

        if promoted {
            self.set_flag(flag_keys::IS_ONBOARDED).await;
            info!(user_id = %user_id, "Returning user promoted to onboarded");
            self.emit(SessionEvent::PromotedReturningUser { user_id });
        }
        promoted
    }

    async fn establish(&self, identity: Identity, onboarded: bool) -> Session {
        let user_id = identity.id;
        let session = Session::authenticated(identity, onboarded);
        *self.state.write().await = SessionStatus::Ready(session.clone());

        self.set_flag(flag_keys::IS_AUTHENTICATED).await;
        if onboarded {
            self.set_flag(flag_keys::IS_ONBOARDED).await;
        } else {
            self.remove_flag(flag_keys::IS_ONBOARDED).await;
        }

        info!(user_id = %user_id, phase = %session.phase(), "Signed in");
        self.emit(SessionEvent::SignedIn {
            user_id,
            phase: session.phase(),
        });
        session
    }

    /// A failed sign-in attempt ends loading, but never un-signs an existing
    /// session.
    async fn settle_anonymous(&self) {
        let mut state = self.state.write().await;
        if state.is_loading() {
            *state = SessionStatus::Ready(Session::anonymous());
        }
    }

    async fn has_prior_onboarding(&self, identity: &Identity) -> bool {
        if is_returning_user(identity) {
            return true;
        }
        match self.preferences.get_preferences(identity.id).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                warn!(user_id = %identity.id, error = %e, "Preference lookup failed, treating as new user");
                false
            }
        }
    }

    async fn clear_session_flags(&self) {
        self.remove_flag(flag_keys::IS_AUTHENTICATED).await;
        self.remove_flag(flag_keys::IS_ONBOARDED).await;
    }

    async fn flag_is_set(&self, key: &str) -> bool {
        match self.flags.is_flag_set(key).await {
            Ok(set) => set,
            Err(e) => {
                warn!(key, error = %e, "Failed to read flag");
                false
            }
        }
    }

    async fn set_flag(&self, key: &str) {
        if let Err(e) = self.flags.set_flag(key, flag_keys::TRUE).await {
            warn!(key, error = %e, "Failed to persist flag");
        }
    }

    async fn remove_flag(&self, key: &str) {
        match self.flags.remove_flag(key).await {
            Ok(true) => debug!(key, "Flag cleared"),
            Ok(false) => {}
            Err(e) => warn!(key, error = %e, "Failed to clear flag"),
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use secrecy::SecretString;
    use tokio::sync::Notify;

    use super::*;
    use crate::error::DatabaseError;
    use crate::onboarding::model::PreferencesRecord;
    use crate::session::identity::MemoryIdentityProvider;
    use crate::session::model::SessionPhase;
    use crate::store::LibSqlBackend;

    struct Harness {
        store: Arc<SessionStore>,
        provider: Arc<MemoryIdentityProvider>,
        db: Arc<LibSqlBackend>,
    }

    async fn harness() -> Harness {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let store = SessionStore::new(provider.clone(), db.clone(), db.clone());
        Harness {
            store,
            provider,
            db,
        }
    }

    fn signup_form(email: &str) -> SignUpForm {
        SignUpForm {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: email.to_string(),
            phone: "5550001111".to_string(),
            password: SecretString::from("Cobol1959"),
            accepted_terms: true,
        }
    }

    #[tokio::test]
    async fn starts_loading_until_restore() {
        let h = harness().await;
        assert!(h.store.status().await.is_loading());
        let session = h.store.restore().await;
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert!(!h.store.status().await.is_loading());
    }

    #[tokio::test]
    async fn restore_clears_stale_flags_without_identity() {
        let h = harness().await;
        h.db.set_flag(flag_keys::IS_AUTHENTICATED, "true").await.unwrap();
        h.db.set_flag(flag_keys::IS_ONBOARDED, "true").await.unwrap();

        let session = h.store.restore().await;
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert!(h.db.get_flag(flag_keys::IS_ONBOARDED).await.unwrap().is_none());
        assert!(h.db.get_flag(flag_keys::IS_AUTHENTICATED).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn restore_reads_onboarding_flag_for_current_identity() {
        let h = harness().await;
        h.provider
            .set_current(Some(Identity::new("back@example.com")))
            .await;
        h.db.set_flag(flag_keys::IS_ONBOARDED, "true").await.unwrap();

        let session = h.store.restore().await;
        assert_eq!(session.phase(), SessionPhase::AuthenticatedOnboarded);
    }

    #[tokio::test]
    async fn sign_up_lands_not_onboarded() {
        let h = harness().await;
        h.store.restore().await;
        let mut rx = h.store.subscribe();

        let session = h.store.sign_up(&signup_form("new@example.com")).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::AuthenticatedNotOnboarded);
        assert!(h.db.is_flag_set(flag_keys::IS_AUTHENTICATED).await.unwrap());
        assert!(!h.db.is_flag_set(flag_keys::IS_ONBOARDED).await.unwrap());

        match rx.recv().await.unwrap() {
            SessionEvent::SignedIn { phase, .. } => {
                assert_eq!(phase, SessionPhase::AuthenticatedNotOnboarded)
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_sign_in_stays_anonymous() {
        let h = harness().await;
        let err = h
            .store
            .sign_in(&LoginForm::new("nobody@example.com", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(
            h.store.session().await.map(|s| s.phase()),
            Some(SessionPhase::Anonymous)
        );
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_provider() {
        let h = harness().await;
        h.store.restore().await;
        let err = h
            .store
            .sign_in(&LoginForm::new("bad", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert!(h.provider.current_identity().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_in_with_metadata_is_onboarded() {
        let h = harness().await;
        let identity = Identity::new("old@example.com")
            .with_metadata("first_name", serde_json::json!("Old"));
        h.provider.insert_account(identity, "pw").await;

        let session = h
            .store
            .sign_in(&LoginForm::new("old@example.com", "pw"))
            .await
            .unwrap();
        assert_eq!(session.phase(), SessionPhase::AuthenticatedOnboarded);
        assert!(h.db.is_flag_set(flag_keys::IS_ONBOARDED).await.unwrap());
    }

    #[tokio::test]
    async fn sign_in_with_stored_preferences_is_onboarded() {
        let h = harness().await;
        let identity = Identity::new("prefs@example.com");
        h.db.upsert_preferences(identity.id, &PreferencesRecord::default())
            .await
            .unwrap();
        h.provider.insert_account(identity, "pw").await;

        let session = h
            .store
            .sign_in(&LoginForm::new("prefs@example.com", "pw"))
            .await
            .unwrap();
        assert!(session.is_onboarded());
    }

    #[tokio::test]
    async fn sign_out_clears_identity_and_flags_from_every_state() {
        let h = harness().await;

        // Loading
        assert_eq!(h.store.sign_out().await, Session::anonymous());

        // Authenticated, not onboarded
        h.store.sign_up(&signup_form("one@example.com")).await.unwrap();
        assert_eq!(h.store.sign_out().await, Session::anonymous());

        // Authenticated, onboarded
        let two = h.store.sign_up(&signup_form("two@example.com")).await.unwrap();
        h.store
            .complete_onboarding(two.identity().unwrap().id)
            .await
            .unwrap();
        let session = h.store.sign_out().await;
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert!(!session.is_onboarded());
        assert_eq!(h.store.session().await, Some(Session::anonymous()));
        assert!(h.db.get_flag(flag_keys::IS_ONBOARDED).await.unwrap().is_none());
        assert!(h.db.get_flag(flag_keys::IS_AUTHENTICATED).await.unwrap().is_none());
        assert!(h.provider.current_identity().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn complete_onboarding_requires_identity() {
        let h = harness().await;
        let someone = Uuid::new_v4();
        assert!(matches!(
            h.store.complete_onboarding(someone).await,
            Err(SessionError::Loading)
        ));
        h.store.restore().await;
        assert!(matches!(
            h.store.complete_onboarding(someone).await,
            Err(SessionError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn complete_onboarding_ignores_previous_identity() {
        let h = harness().await;
        h.store.restore().await;
        let first = h.store.sign_up(&signup_form("a@example.com")).await.unwrap();
        let first_id = first.identity().unwrap().id;
        h.store.sign_out().await;
        h.store.sign_up(&signup_form("b@example.com")).await.unwrap();

        assert!(matches!(
            h.store.complete_onboarding(first_id).await,
            Err(SessionError::IdentityChanged)
        ));
        assert!(!h.store.session().await.unwrap().is_onboarded());
        assert!(!h.db.is_flag_set(flag_keys::IS_ONBOARDED).await.unwrap());
    }

    /// Flag store whose first `isOnboarded` write blocks until released.
    struct GatedFlags {
        inner: Arc<LibSqlBackend>,
        armed: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl FlagStore for GatedFlags {
        async fn get_flag(&self, key: &str) -> Result<Option<String>, DatabaseError> {
            self.inner.get_flag(key).await
        }

        async fn set_flag(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
            if key == flag_keys::IS_ONBOARDED && self.armed.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.set_flag(key, value).await
        }

        async fn remove_flag(&self, key: &str) -> Result<bool, DatabaseError> {
            self.inner.remove_flag(key).await
        }
    }

    #[tokio::test]
    async fn slow_flag_write_cannot_leak_onboarding_to_next_identity() {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let flags = Arc::new(GatedFlags {
            inner: db.clone(),
            armed: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let store = SessionStore::new(provider.clone(), flags.clone(), db.clone());
        store.restore().await;
        let first = store.sign_up(&signup_form("a@example.com")).await.unwrap();
        let first_id = first.identity().unwrap().id;

        let completing = tokio::spawn({
            let store = store.clone();
            async move { store.complete_onboarding(first_id).await }
        });
        flags.entered.notified().await;

        let switching = tokio::spawn({
            let store = store.clone();
            async move {
                store.sign_out().await;
                store.sign_up(&signup_form("b@example.com")).await.unwrap();
            }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!switching.is_finished(), "sign-out ran inside another transition");

        flags.release.notify_one();
        completing.await.unwrap().unwrap();
        switching.await.unwrap();
        assert!(!store.session().await.unwrap().is_onboarded());

        // Same device, fresh process.
        let reloaded = SessionStore::new(provider, db.clone(), db);
        let session = reloaded.restore().await;
        assert_eq!(session.identity().unwrap().email, "b@example.com");
        assert!(!session.is_onboarded());
    }

    #[tokio::test]
    async fn promotion_only_applies_to_matching_returning_user() {
        let h = harness().await;
        let returning = Identity::new("r@example.com")
            .with_metadata("avatar_url", serde_json::json!("https://img"));
        h.provider.set_current(Some(returning.clone())).await;
        h.store.restore().await;

        assert!(!h.store.promote_returning_user(Uuid::new_v4()).await);
        assert!(h.store.promote_returning_user(returning.id).await);
        assert!(h.store.session().await.unwrap().is_onboarded());
        assert!(h.db.is_flag_set(flag_keys::IS_ONBOARDED).await.unwrap());

        h.store.sign_out().await;
        let fresh = h.store.sign_up(&signup_form("f@example.com")).await.unwrap();
        let fresh_id = fresh.identity().unwrap().id;
        assert!(!h.store.promote_returning_user(fresh_id).await);
    }
}
