//! Onboarding steps: a fixed, linear four-step sequence.

use serde::{Deserialize, Serialize};

use super::model::PreferenceField;

/// The steps of the onboarding wizard.
///
/// Progresses linearly: HealthGoals → DoctorTypes → ReminderFrequency →
/// ChronicConditions. Moving back stops at the first step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    #[default]
    HealthGoals,
    DoctorTypes,
    ReminderFrequency,
    ChronicConditions,
}

impl OnboardingStep {
    pub const TOTAL: u8 = 4;

    /// 1-based position.
    pub fn number(&self) -> u8 {
        match self {
            Self::HealthGoals => 1,
            Self::DoctorTypes => 2,
            Self::ReminderFrequency => 3,
            Self::ChronicConditions => 4,
        }
    }

    pub fn next(&self) -> Option<OnboardingStep> {
        match self {
            Self::HealthGoals => Some(Self::DoctorTypes),
            Self::DoctorTypes => Some(Self::ReminderFrequency),
            Self::ReminderFrequency => Some(Self::ChronicConditions),
            Self::ChronicConditions => None,
        }
    }

    pub fn previous(&self) -> Option<OnboardingStep> {
        match self {
            Self::HealthGoals => None,
            Self::DoctorTypes => Some(Self::HealthGoals),
            Self::ReminderFrequency => Some(Self::DoctorTypes),
            Self::ChronicConditions => Some(Self::ReminderFrequency),
        }
    }

    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }

    /// The preference this step edits.
    pub fn field(&self) -> PreferenceField {
        match self {
            Self::HealthGoals => PreferenceField::HealthGoals,
            Self::DoctorTypes => PreferenceField::PreferredDoctorType,
            Self::ReminderFrequency => PreferenceField::ReminderFrequency,
            Self::ChronicConditions => PreferenceField::ChronicConditions,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::HealthGoals => "What are your health goals?",
            Self::DoctorTypes => "What type of doctors do you consult?",
            Self::ReminderFrequency => "How often would you like medication reminders?",
            Self::ChronicConditions => "Do you have any chronic conditions?",
        }
    }

    pub fn subtitle(&self) -> &'static str {
        match self {
            Self::HealthGoals => "Select all that apply to you",
            Self::DoctorTypes => "This helps us connect you with relevant specialists",
            Self::ReminderFrequency => "We'll set up notifications based on your preference",
            Self::ChronicConditions => "This helps us personalize your experience",
        }
    }

    /// Label of the forward button on this step.
    pub fn action_label(&self) -> &'static str {
        if self.is_last() {
            "Complete Setup"
        } else {
            "Continue"
        }
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::HealthGoals => "health_goals",
            Self::DoctorTypes => "doctor_types",
            Self::ReminderFrequency => "reminder_frequency",
            Self::ChronicConditions => "chronic_conditions",
        };
        write!(f, "{s}")
    }
}

/// Derived progress indicator: `current / total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: u8,
    pub total: u8,
}

impl Progress {
    pub fn of(step: OnboardingStep) -> Self {
        Self {
            current: step.number(),
            total: OnboardingStep::TOTAL,
        }
    }

    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        f32::from(self.current) / f32::from(self.total)
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Step {} of {}", self.current, self.total)
    }
}
