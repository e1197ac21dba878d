use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Number of features consumed by the classifier.
pub const FEATURE_COUNT: usize = 9;

/// Raw, unvalidated intake as submitted: field name to raw text.
pub type RawIntake = BTreeMap<String, String>;

/// Intake fields in canonical feature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeField {
    Age,
    Sex,
    WaistHipRatio,
    ActiveSmoking,
    PassiveSmoking,
    Alcohol,
    PhysicalActivity,
    DietQuality,
    MentalHealth,
}

impl IntakeField {
    /// Wire name used by intake forms and feature headers.
    pub fn name(self) -> &'static str {
        match self {
            IntakeField::Age => "age",
            IntakeField::Sex => "sex",
            IntakeField::WaistHipRatio => "waist_hip_ratio",
            IntakeField::ActiveSmoking => "active_smoking",
            IntakeField::PassiveSmoking => "passive_smoking",
            IntakeField::Alcohol => "alcohol",
            IntakeField::PhysicalActivity => "physical_activity",
            IntakeField::DietQuality => "diet_quality",
            IntakeField::MentalHealth => "mental_health",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            IntakeField::Age => "Age",
            IntakeField::Sex => "Sex",
            IntakeField::WaistHipRatio => "Waist-Hip Ratio",
            IntakeField::ActiveSmoking => "Active smoking",
            IntakeField::PassiveSmoking => "Passive smoking",
            IntakeField::Alcohol => "Alcohol consumption",
            IntakeField::PhysicalActivity => "Physical activity",
            IntakeField::DietQuality => "Diet quality",
            IntakeField::MentalHealth => "Mental health stress level",
        }
    }
}

impl fmt::Display for IntakeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

/// A fully validated assessment intake.
///
/// Only [`IntakeValidator`](super::IntakeValidator) constructs records, so every
/// value held here is already within its declared bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntakeRecord {
    pub(crate) age: u8,
    pub(crate) sex: Sex,
    pub(crate) waist_hip_ratio: f64,
    pub(crate) active_smoking: bool,
    pub(crate) passive_smoking: bool,
    pub(crate) alcohol: u8,
    pub(crate) physical_activity: u8,
    pub(crate) diet_quality: u8,
    pub(crate) mental_health: f64,
}

impl IntakeRecord {
    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn waist_hip_ratio(&self) -> f64 {
        self.waist_hip_ratio
    }

    pub fn active_smoking(&self) -> bool {
        self.active_smoking
    }

    pub fn passive_smoking(&self) -> bool {
        self.passive_smoking
    }

    /// Drinks per week.
    pub fn alcohol(&self) -> u8 {
        self.alcohol
    }

    pub fn physical_activity(&self) -> u8 {
        self.physical_activity
    }

    pub fn diet_quality(&self) -> u8 {
        self.diet_quality
    }

    pub fn mental_health(&self) -> f64 {
        self.mental_health
    }
}

/// Fixed-order numeric encoding of an intake.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub(crate) fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        self.0
    }

    pub fn get(&self, field: IntakeField) -> f64 {
        self.0[field as usize]
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}
