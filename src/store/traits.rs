//! Storage traits: local key/flag storage and the preference-persistence
//! collaborator.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::onboarding::model::PreferencesRecord;

/// Keys used in local flag storage.
pub mod flag_keys {
    /// Legacy "true" sentinel written on sign-in, removed on sign-out.
    pub const IS_AUTHENTICATED: &str = "isAuthenticated";
    /// "true" sentinel once onboarding completed for the current identity.
    pub const IS_ONBOARDED: &str = "isOnboarded";
    /// Serialized `PreferencesRecord`, a best-effort cache of the remote copy.
    pub const USER_PREFERENCES: &str = "userPreferences";
    /// Value written for boolean sentinels.
    pub const TRUE: &str = "true";
}

/// Local key/value flag storage (the device-side persisted state).
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Read a flag, `None` if absent.
    async fn get_flag(&self, key: &str) -> Result<Option<String>, DatabaseError>;

    /// Write (or overwrite) a flag.
    async fn set_flag(&self, key: &str, value: &str) -> Result<(), DatabaseError>;

    /// Remove a flag. Returns whether it existed.
    async fn remove_flag(&self, key: &str) -> Result<bool, DatabaseError>;

    /// Whether a boolean sentinel is set to "true".
    async fn is_flag_set(&self, key: &str) -> Result<bool, DatabaseError> {
        Ok(self.get_flag(key).await?.as_deref() == Some(flag_keys::TRUE))
    }
}

/// Remote persistence of completed onboarding preferences, keyed by identity.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Insert or replace the preferences for a user.
    async fn upsert_preferences(
        &self,
        user_id: Uuid,
        preferences: &PreferencesRecord,
    ) -> Result<(), DatabaseError>;

    /// Load the stored preferences for a user.
    async fn get_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PreferencesRecord>, DatabaseError>;
}
