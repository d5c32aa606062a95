//! Session data model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    /// Provider-supplied profile metadata. Empty for freshly created accounts.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Gating state derived from a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Anonymous,
    AuthenticatedNotOnboarded,
    AuthenticatedOnboarded,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Anonymous => "anonymous",
            Self::AuthenticatedNotOnboarded => "authenticated_not_onboarded",
            Self::AuthenticatedOnboarded => "authenticated_onboarded",
        };
        write!(f, "{s}")
    }
}

/// The client's current belief about who is logged in and whether they
/// finished onboarding.
///
/// Fields are private so `onboarded` can never be true without an identity.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Session {
    identity: Option<Identity>,
    onboarded: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: Identity, onboarded: bool) -> Self {
        Self {
            identity: Some(identity),
            onboarded,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn is_onboarded(&self) -> bool {
        self.onboarded
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.identity, self.onboarded) {
            (None, _) => SessionPhase::Anonymous,
            (Some(_), false) => SessionPhase::AuthenticatedNotOnboarded,
            (Some(_), true) => SessionPhase::AuthenticatedOnboarded,
        }
    }

    /// Set the onboarding flag. No-op (returns false) for an anonymous session.
    pub(crate) fn mark_onboarded(&mut self) -> bool {
        if self.identity.is_none() {
            return false;
        }
        self.onboarded = true;
        true
    }
}

/// Session as seen by the guard: still loading from the identity provider,
/// or known.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionStatus {
    #[default]
    Loading,
    Ready(Session),
}

impl SessionStatus {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Loading => None,
            Self::Ready(session) => Some(session),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Broadcast to subscribers after every session transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Restored(SessionPhase),
    SignedIn { user_id: Uuid, phase: SessionPhase },
    SignedOut,
    Onboarded { user_id: Uuid },
    PromotedReturningUser { user_id: Uuid },
}
