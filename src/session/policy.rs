//! Returning-user policy.
//!
//! An authenticated identity with no local onboarding flag is treated as
//! new, unless the identity provider already holds profile metadata for it.
//! Such an identity is promoted to onboarded without visiting the wizard.

use super::model::Identity;

/// Whether an identity counts as a returning user.
///
/// True iff the provider-supplied metadata has at least one entry.
pub fn is_returning_user(identity: &Identity) -> bool {
    !identity.metadata.is_empty()
}
