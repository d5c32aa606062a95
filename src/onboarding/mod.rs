//! Onboarding — the first-login preference wizard.
//!
//! A new identity walks four fixed steps (health goals, doctor types,
//! reminder frequency, chronic conditions), building a `PreferencesRecord`.
//! Finishing the last step persists the record and marks the session
//! onboarded, even when persistence fails.

pub mod catalog;
pub mod model;
pub mod state;
pub mod wizard;

pub use catalog::{CatalogItem, ChronicCondition, DoctorType, HealthGoal, ReminderFrequency};
pub use model::{Choice, PreferenceField, PreferencesRecord};
pub use state::{OnboardingStep, Progress};
pub use wizard::{Advance, CompletionReport, OnboardingWizard};
