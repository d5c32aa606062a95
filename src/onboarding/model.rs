//! Preferences record built by the onboarding wizard.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::catalog::{CatalogItem, ChronicCondition, DoctorType, HealthGoal, ReminderFrequency};

/// Which preference a choice belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreferenceField {
    HealthGoals,
    PreferredDoctorType,
    ReminderFrequency,
    ChronicConditions,
}

impl PreferenceField {
    /// Whether more than one value may be selected.
    pub fn is_multi_select(&self) -> bool {
        !matches!(self, Self::ReminderFrequency)
    }
}

/// A single catalog value tagged with the field it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    HealthGoal(HealthGoal),
    DoctorType(DoctorType),
    ReminderFrequency(ReminderFrequency),
    ChronicCondition(ChronicCondition),
}

impl Choice {
    /// Resolve a displayed value for a field. Returns `None` for anything
    /// outside the field's catalog.
    ///
    /// Reminder frequency accepts either its key ("twice-daily") or its label.
    pub fn parse(field: PreferenceField, value: &str) -> Option<Self> {
        match field {
            PreferenceField::HealthGoals => HealthGoal::from_label(value).map(Self::HealthGoal),
            PreferenceField::PreferredDoctorType => {
                DoctorType::from_label(value).map(Self::DoctorType)
            }
            PreferenceField::ReminderFrequency => ReminderFrequency::from_key(value)
                .or_else(|| ReminderFrequency::from_label(value))
                .map(Self::ReminderFrequency),
            PreferenceField::ChronicConditions => {
                ChronicCondition::from_label(value).map(Self::ChronicCondition)
            }
        }
    }

    pub fn field(&self) -> PreferenceField {
        match self {
            Self::HealthGoal(_) => PreferenceField::HealthGoals,
            Self::DoctorType(_) => PreferenceField::PreferredDoctorType,
            Self::ReminderFrequency(_) => PreferenceField::ReminderFrequency,
            Self::ChronicCondition(_) => PreferenceField::ChronicConditions,
        }
    }
}

/// Preferences collected during onboarding.
///
/// Set-valued fields only ever hold catalog members; the JSON shape matches
/// the stored `userPreferences` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesRecord {
    pub reminder_frequency: ReminderFrequency,
    pub preferred_doctor_type: BTreeSet<DoctorType>,
    pub health_goals: BTreeSet<HealthGoal>,
    pub chronic_conditions: BTreeSet<ChronicCondition>,
}

impl PreferencesRecord {
    /// Apply a choice. Multi-select fields take the symmetric difference with
    /// `{value}`; reminder frequency is replaced.
    ///
    /// Returns whether the value is selected afterwards.
    pub fn toggle(&mut self, choice: Choice) -> bool {
        match choice {
            Choice::HealthGoal(goal) => toggle_in(&mut self.health_goals, goal),
            Choice::DoctorType(doctor) => toggle_in(&mut self.preferred_doctor_type, doctor),
            Choice::ChronicCondition(condition) => {
                toggle_in(&mut self.chronic_conditions, condition)
            }
            Choice::ReminderFrequency(frequency) => {
                self.reminder_frequency = frequency;
                true
            }
        }
    }

    /// Whether a choice is currently selected.
    pub fn is_selected(&self, choice: Choice) -> bool {
        match choice {
            Choice::HealthGoal(goal) => self.health_goals.contains(&goal),
            Choice::DoctorType(doctor) => self.preferred_doctor_type.contains(&doctor),
            Choice::ChronicCondition(condition) => self.chronic_conditions.contains(&condition),
            Choice::ReminderFrequency(frequency) => self.reminder_frequency == frequency,
        }
    }
}

fn toggle_in<T: Ord>(set: &mut BTreeSet<T>, value: T) -> bool {
    if set.remove(&value) {
        false
    } else {
        set.insert(value);
        true
    }
}
