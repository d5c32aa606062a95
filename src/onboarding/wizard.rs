//! OnboardingWizard — the four-step preference flow and its finalization.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::model::{Choice, PreferenceField, PreferencesRecord};
use super::state::{OnboardingStep, Progress};
use crate::error::SessionError;
use crate::notice::Notice;
use crate::routing::Screen;
use crate::session::SessionStore;
use crate::store::{FlagStore, PreferenceStore, flag_keys};

/// Outcome of a finalized wizard, handed to the presenting layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionReport {
    pub preferences: PreferencesRecord,
    /// Whether the preference store accepted the record.
    pub persisted: bool,
    pub notice: Notice,
    pub redirect: Screen,
}

/// Result of `advance`.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Moved(OnboardingStep),
    Completed(CompletionReport),
}

/// Linear four-step wizard accumulating a `PreferencesRecord`.
///
/// No step validates its selections; empty sets are fine everywhere. Once
/// completed the record is frozen and further calls are no-ops.
pub struct OnboardingWizard {
    step: OnboardingStep,
    record: PreferencesRecord,
    completed: Option<CompletionReport>,
    session: Arc<SessionStore>,
    preferences: Arc<dyn PreferenceStore>,
    flags: Arc<dyn FlagStore>,
}

impl OnboardingWizard {
    pub fn new(
        session: Arc<SessionStore>,
        preferences: Arc<dyn PreferenceStore>,
        flags: Arc<dyn FlagStore>,
    ) -> Self {
        Self {
            step: OnboardingStep::default(),
            record: PreferencesRecord::default(),
            completed: None,
            session,
            preferences,
            flags,
        }
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn progress(&self) -> Progress {
        Progress::of(self.step)
    }

    pub fn record(&self) -> &PreferencesRecord {
        &self.record
    }

    pub fn is_completed(&self) -> bool {
        self.completed.is_some()
    }

    /// Toggle a choice (reminder frequency is replaced). Returns whether the
    /// value is selected afterwards.
    pub fn toggle(&mut self, choice: Choice) -> bool {
        if self.completed.is_some() {
            return self.record.is_selected(choice);
        }
        self.record.toggle(choice)
    }

    /// Toggle by displayed value. `None` if the value is not in the field's
    /// catalog; the record is left unchanged.
    pub fn toggle_value(&mut self, field: PreferenceField, value: &str) -> Option<bool> {
        let choice = Choice::parse(field, value)?;
        Some(self.toggle(choice))
    }

    /// Move back one step. No-op on the first step.
    pub fn retreat(&mut self) -> OnboardingStep {
        if self.completed.is_none() {
            self.step = self.step.previous().unwrap_or(self.step);
        }
        self.step
    }

    /// Move forward one step, or finalize on the last step.
    ///
    /// Finalizing hands the record to the preference store, caches it in local
    /// flags and marks the session onboarded. A store failure only changes
    /// the notice; the session is marked onboarded either way.
    pub async fn advance(&mut self) -> Result<Advance, SessionError> {
        if let Some(report) = &self.completed {
            return Ok(Advance::Completed(report.clone()));
        }
        if let Some(next) = self.step.next() {
            self.step = next;
            return Ok(Advance::Moved(next));
        }

        let report = self.finalize().await?;
        self.completed = Some(report.clone());
        Ok(Advance::Completed(report))
    }

    async fn finalize(&self) -> Result<CompletionReport, SessionError> {
        let session = self.session.session().await.ok_or(SessionError::Loading)?;
        let user_id = session
            .identity()
            .map(|i| i.id)
            .ok_or(SessionError::NotAuthenticated)?;

        let persisted = match self
            .preferences
            .upsert_preferences(user_id, &self.record)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Error saving preferences");
                false
            }
        };

        // Fails if the user signed out while the upsert was in flight.
        self.session.complete_onboarding(user_id).await?;

        match serde_json::to_string(&self.record) {
            Ok(json) => {
                if let Err(e) = self.flags.set_flag(flag_keys::USER_PREFERENCES, &json).await {
                    warn!(error = %e, "Failed to cache preferences locally");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize preferences"),
        }

        let notice = if persisted {
            Notice::info("Setup complete!", "Your preferences have been saved.")
        } else {
            Notice::error(
                "Warning",
                "Your preferences were saved locally, but we couldn't save them to your profile.",
            )
        };
        info!(user_id = %user_id, persisted, "Onboarding wizard finalized");

        Ok(CompletionReport {
            preferences: self.record.clone(),
            persisted,
            notice,
            redirect: Screen::Dashboard,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use uuid::Uuid;

    use super::*;
    use crate::error::DatabaseError;
    use crate::onboarding::catalog::{HealthGoal, ReminderFrequency};
    use crate::session::{MemoryIdentityProvider, SignUpForm};
    use crate::store::LibSqlBackend;

    struct FailingPreferences;

    #[async_trait]
    impl PreferenceStore for FailingPreferences {
        async fn upsert_preferences(
            &self,
            _user_id: Uuid,
            _preferences: &PreferencesRecord,
        ) -> Result<(), DatabaseError> {
            Err(DatabaseError::Query("connection reset".into()))
        }

        async fn get_preferences(
            &self,
            _user_id: Uuid,
        ) -> Result<Option<PreferencesRecord>, DatabaseError> {
            Err(DatabaseError::Query("connection reset".into()))
        }
    }

    /// Preference store whose upsert waits until released.
    struct HeldPreferences {
        inner: Arc<LibSqlBackend>,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl PreferenceStore for HeldPreferences {
        async fn upsert_preferences(
            &self,
            user_id: Uuid,
            preferences: &PreferencesRecord,
        ) -> Result<(), DatabaseError> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.upsert_preferences(user_id, preferences).await
        }

        async fn get_preferences(
            &self,
            user_id: Uuid,
        ) -> Result<Option<PreferencesRecord>, DatabaseError> {
            self.inner.get_preferences(user_id).await
        }
    }

    fn signup() -> SignUpForm {
        SignUpForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "5551234567".into(),
            password: secrecy::SecretString::from("Analytical1"),
            accepted_terms: true,
        }
    }

    async fn signed_up(
        prefs: Option<Arc<dyn PreferenceStore>>,
    ) -> (OnboardingWizard, Arc<SessionStore>, Arc<LibSqlBackend>) {
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let prefs: Arc<dyn PreferenceStore> = prefs.unwrap_or_else(|| db.clone() as Arc<dyn PreferenceStore>);
        let store = SessionStore::new(
            Arc::new(MemoryIdentityProvider::new()),
            db.clone(),
            prefs.clone(),
        );
        store.sign_up(&signup()).await.unwrap();
        let wizard = OnboardingWizard::new(store.clone(), prefs, db.clone());
        (wizard, store, db)
    }

    async fn finish(wizard: &mut OnboardingWizard) -> CompletionReport {
        for _ in 0..OnboardingStep::TOTAL {
            if let Advance::Completed(report) = wizard.advance().await.unwrap() {
                return report;
            }
        }
        panic!("wizard did not complete");
    }

    #[tokio::test]
    async fn advance_and_retreat_walk_the_steps() {
        let (mut wizard, _store, _db) = signed_up(None).await;
        assert_eq!(wizard.retreat(), OnboardingStep::HealthGoals);
        assert_eq!(wizard.progress().to_string(), "Step 1 of 4");

        assert_eq!(
            wizard.advance().await.unwrap(),
            Advance::Moved(OnboardingStep::DoctorTypes)
        );
        assert_eq!(
            wizard.advance().await.unwrap(),
            Advance::Moved(OnboardingStep::ReminderFrequency)
        );
        assert_eq!(wizard.retreat(), OnboardingStep::DoctorTypes);
        assert_eq!(wizard.progress().current, 2);
    }

    #[tokio::test]
    async fn toggle_twice_restores_the_set() {
        let (mut wizard, _store, _db) = signed_up(None).await;
        assert_eq!(
            wizard.toggle_value(PreferenceField::HealthGoals, "Improve fitness"),
            Some(true)
        );
        assert_eq!(
            wizard.toggle_value(PreferenceField::HealthGoals, "Improve fitness"),
            Some(false)
        );
        assert!(wizard.record().health_goals.is_empty());
        assert_eq!(
            wizard.toggle_value(PreferenceField::HealthGoals, "Fly to the moon"),
            None
        );
    }

    #[tokio::test]
    async fn completes_with_empty_selections() {
        let (mut wizard, store, db) = signed_up(None).await;
        let report = finish(&mut wizard).await;

        assert!(report.persisted);
        assert_eq!(report.notice.title, "Setup complete!");
        assert_eq!(report.redirect, Screen::Dashboard);
        assert!(store.session().await.unwrap().is_onboarded());

        let user_id = store.session().await.unwrap().identity().unwrap().id;
        let stored = db.get_preferences(user_id).await.unwrap().unwrap();
        assert_eq!(stored, PreferencesRecord::default());
        assert!(db.get_flag(flag_keys::USER_PREFERENCES).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn persistence_failure_still_completes() {
        let (mut wizard, store, db) = signed_up(Some(Arc::new(FailingPreferences))).await;
        wizard.toggle(Choice::HealthGoal(HealthGoal::BetterSleep));
        wizard.toggle(Choice::ReminderFrequency(ReminderFrequency::TwiceDaily));

        let report = finish(&mut wizard).await;
        assert!(!report.persisted);
        assert!(report.notice.is_error());
        assert!(store.session().await.unwrap().is_onboarded());
        assert!(db.is_flag_set(flag_keys::IS_ONBOARDED).await.unwrap());

        let cached = db.get_flag(flag_keys::USER_PREFERENCES).await.unwrap().unwrap();
        let cached: PreferencesRecord = serde_json::from_str(&cached).unwrap();
        assert_eq!(cached.reminder_frequency, ReminderFrequency::TwiceDaily);
    }

    #[tokio::test]
    async fn completed_wizard_is_frozen() {
        let (mut wizard, _store, _db) = signed_up(None).await;
        let report = finish(&mut wizard).await;

        assert!(!wizard.toggle(Choice::HealthGoal(HealthGoal::ImproveFitness)));
        assert!(wizard.record().health_goals.is_empty());
        assert_eq!(wizard.retreat(), OnboardingStep::ChronicConditions);
        assert_eq!(wizard.advance().await.unwrap(), Advance::Completed(report));
    }

    #[tokio::test]
    async fn anonymous_session_cannot_finalize() {
        let (mut wizard, store, _db) = signed_up(None).await;
        store.sign_out().await;
        for _ in 1..OnboardingStep::TOTAL {
            wizard.advance().await.unwrap();
        }
        assert!(matches!(
            wizard.advance().await,
            Err(SessionError::NotAuthenticated)
        ));
        assert!(!wizard.is_completed());
    }

    #[tokio::test]
    async fn late_finalize_does_not_onboard_the_next_user() {
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let held = Arc::new(HeldPreferences {
            inner: db.clone(),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let store = SessionStore::new(
            Arc::new(MemoryIdentityProvider::new()),
            db.clone(),
            held.clone(),
        );
        store.sign_up(&signup()).await.unwrap();

        let mut wizard = OnboardingWizard::new(store.clone(), held.clone(), db.clone());
        for _ in 1..OnboardingStep::TOTAL {
            wizard.advance().await.unwrap();
        }
        let finishing = tokio::spawn(async move {
            let outcome = wizard.advance().await;
            (wizard, outcome)
        });
        held.entered.notified().await;

        store.sign_out().await;
        let mut other = signup();
        other.email = "charles@example.com".into();
        store.sign_up(&other).await.unwrap();
        held.release.notify_one();

        let (wizard, outcome) = finishing.await.unwrap();
        assert!(matches!(outcome, Err(SessionError::IdentityChanged)));
        assert!(!wizard.is_completed());

        let session = store.session().await.unwrap();
        assert_eq!(session.identity().unwrap().email, "charles@example.com");
        assert!(!session.is_onboarded());
        assert!(!db.is_flag_set(flag_keys::IS_ONBOARDED).await.unwrap());
        assert!(db.get_flag(flag_keys::USER_PREFERENCES).await.unwrap().is_none());
    }
}
