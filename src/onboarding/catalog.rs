//! Fixed choice catalogs offered by the onboarding steps.
//!
//! Each catalog value serializes as the label shown to the user, so a stored
//! preferences record reads the same as what was selected on screen.
//! Reminder frequency is the exception: it serializes as its short key.

use serde::{Deserialize, Serialize};

/// A closed set of selectable values.
pub trait CatalogItem: Copy + Ord + Sized + 'static {
    /// Every member, in display order.
    const ALL: &'static [Self];

    /// Text shown for this member.
    fn label(&self) -> &'static str;

    /// Look up a member by its label.
    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.label() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthGoal {
    #[serde(rename = "Manage chronic condition")]
    ManageChronicCondition,
    #[serde(rename = "Improve fitness")]
    ImproveFitness,
    #[serde(rename = "Better sleep")]
    BetterSleep,
    #[serde(rename = "Mental wellbeing")]
    MentalWellbeing,
    #[serde(rename = "Weight management")]
    WeightManagement,
    #[serde(rename = "Medication adherence")]
    MedicationAdherence,
}

impl CatalogItem for HealthGoal {
    const ALL: &'static [Self] = &[
        Self::ManageChronicCondition,
        Self::ImproveFitness,
        Self::BetterSleep,
        Self::MentalWellbeing,
        Self::WeightManagement,
        Self::MedicationAdherence,
    ];

    fn label(&self) -> &'static str {
        match self {
            Self::ManageChronicCondition => "Manage chronic condition",
            Self::ImproveFitness => "Improve fitness",
            Self::BetterSleep => "Better sleep",
            Self::MentalWellbeing => "Mental wellbeing",
            Self::WeightManagement => "Weight management",
            Self::MedicationAdherence => "Medication adherence",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DoctorType {
    #[serde(rename = "Primary Care Physician")]
    PrimaryCarePhysician,
    Cardiologist,
    Dermatologist,
    Neurologist,
    Psychiatrist,
    Endocrinologist,
    Gynecologist,
    Orthopedist,
}

impl CatalogItem for DoctorType {
    const ALL: &'static [Self] = &[
        Self::PrimaryCarePhysician,
        Self::Cardiologist,
        Self::Dermatologist,
        Self::Neurologist,
        Self::Psychiatrist,
        Self::Endocrinologist,
        Self::Gynecologist,
        Self::Orthopedist,
    ];

    fn label(&self) -> &'static str {
        match self {
            Self::PrimaryCarePhysician => "Primary Care Physician",
            Self::Cardiologist => "Cardiologist",
            Self::Dermatologist => "Dermatologist",
            Self::Neurologist => "Neurologist",
            Self::Psychiatrist => "Psychiatrist",
            Self::Endocrinologist => "Endocrinologist",
            Self::Gynecologist => "Gynecologist",
            Self::Orthopedist => "Orthopedist",
        }
    }
}

/// How often medication reminders fire. Single-select.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderFrequency {
    #[default]
    Daily,
    TwiceDaily,
    Custom,
}

impl ReminderFrequency {
    /// Storage key ("daily", "twice-daily", "custom").
    pub fn key(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::TwiceDaily => "twice-daily",
            Self::Custom => "custom",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }
}

impl CatalogItem for ReminderFrequency {
    const ALL: &'static [Self] = &[Self::Daily, Self::TwiceDaily, Self::Custom];

    fn label(&self) -> &'static str {
        match self {
            Self::Daily => "Once daily",
            Self::TwiceDaily => "Twice daily (morning and evening)",
            Self::Custom => "Custom schedule",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChronicCondition {
    Diabetes,
    Hypertension,
    Asthma,
    #[serde(rename = "Heart disease")]
    HeartDisease,
    Arthritis,
    #[serde(rename = "Thyroid disorder")]
    ThyroidDisorder,
    /// Explicit "no conditions" answer.
    None,
}

impl CatalogItem for ChronicCondition {
    const ALL: &'static [Self] = &[
        Self::Diabetes,
        Self::Hypertension,
        Self::Asthma,
        Self::HeartDisease,
        Self::Arthritis,
        Self::ThyroidDisorder,
        Self::None,
    ];

    fn label(&self) -> &'static str {
        match self {
            Self::Diabetes => "Diabetes",
            Self::Hypertension => "Hypertension",
            Self::Asthma => "Asthma",
            Self::HeartDisease => "Heart disease",
            Self::Arthritis => "Arthritis",
            Self::ThyroidDisorder => "Thyroid disorder",
            Self::None => "None",
        }
    }
}
