use serde::Serialize;

use super::domain::{IntakeField, IntakeRecord, RawIntake, Sex};

/// Category of a rejected intake field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeErrorKind {
    MissingField,
    ParseError,
    RangeError,
    InvalidChoice,
}

impl IntakeErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            IntakeErrorKind::MissingField => "missing-field",
            IntakeErrorKind::ParseError => "parse-error",
            IntakeErrorKind::RangeError => "range-error",
            IntakeErrorKind::InvalidChoice => "invalid-choice",
        }
    }
}

/// First constraint violated by an intake.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct IntakeValidationError {
    pub kind: IntakeErrorKind,
    pub field: IntakeField,
    pub message: String,
}

impl IntakeValidationError {
    fn new(kind: IntakeErrorKind, field: IntakeField, message: impl Into<String>) -> Self {
        Self {
            kind,
            field,
            message: message.into(),
        }
    }
}

/// Validation failure paired with the submitted values so a form can be re-rendered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error}")]
pub struct IntakeRejection {
    pub error: IntakeValidationError,
    pub echoed_fields: RawIntake,
}

/// Accepted values for a single intake field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldConstraint {
    Number { min: f64, max: f64, integer: bool },
    Choice { options: &'static [&'static str] },
}

/// Published description of one intake field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub field: IntakeField,
    pub label: &'static str,
    #[serde(flatten)]
    pub constraint: FieldConstraint,
}

#[derive(Debug, Clone, Copy)]
struct NumberRule {
    field: IntakeField,
    min: f64,
    max: f64,
    integer: bool,
}

impl NumberRule {
    const fn spec(self) -> FieldSpec {
        FieldSpec {
            field: self.field,
            label: self.field.label(),
            constraint: FieldConstraint::Number {
                min: self.min,
                max: self.max,
                integer: self.integer,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ChoiceRule {
    field: IntakeField,
    options: &'static [&'static str],
    message: &'static str,
}

impl ChoiceRule {
    const fn spec(self) -> FieldSpec {
        FieldSpec {
            field: self.field,
            label: self.field.label(),
            constraint: FieldConstraint::Choice {
                options: self.options,
            },
        }
    }
}

const SEX_OPTIONS: &[&str] = &["male", "female"];
const YES_NO: &[&str] = &["yes", "no"];

const AGE: NumberRule = NumberRule {
    field: IntakeField::Age,
    min: 30.0,
    max: 70.0,
    integer: true,
};
const SEX: ChoiceRule = ChoiceRule {
    field: IntakeField::Sex,
    options: SEX_OPTIONS,
    message: "Please select a valid sex",
};
const WAIST_HIP_RATIO: NumberRule = NumberRule {
    field: IntakeField::WaistHipRatio,
    min: 0.5,
    max: 1.5,
    integer: false,
};
const ACTIVE_SMOKING: ChoiceRule = ChoiceRule {
    field: IntakeField::ActiveSmoking,
    options: YES_NO,
    message: "Please select active smoking status",
};
const PASSIVE_SMOKING: ChoiceRule = ChoiceRule {
    field: IntakeField::PassiveSmoking,
    options: YES_NO,
    message: "Please select passive smoking status",
};
const ALCOHOL: NumberRule = NumberRule {
    field: IntakeField::Alcohol,
    min: 0.0,
    max: 14.0,
    integer: true,
};
const PHYSICAL_ACTIVITY: NumberRule = NumberRule {
    field: IntakeField::PhysicalActivity,
    min: 0.0,
    max: 10.0,
    integer: true,
};
const DIET_QUALITY: NumberRule = NumberRule {
    field: IntakeField::DietQuality,
    min: 0.0,
    max: 10.0,
    integer: true,
};
const MENTAL_HEALTH: NumberRule = NumberRule {
    field: IntakeField::MentalHealth,
    min: 0.0,
    max: 20.0,
    integer: false,
};

/// Field rules in canonical order.
pub const FIELD_SPECS: [FieldSpec; 9] = [
    AGE.spec(),
    SEX.spec(),
    WAIST_HIP_RATIO.spec(),
    ACTIVE_SMOKING.spec(),
    PASSIVE_SMOKING.spec(),
    ALCOHOL.spec(),
    PHYSICAL_ACTIVITY.spec(),
    DIET_QUALITY.spec(),
    MENTAL_HEALTH.spec(),
];

/// Parses and range-checks raw intake fields, failing on the first violation.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntakeValidator;

impl IntakeValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, raw: &RawIntake) -> Result<IntakeRecord, IntakeValidationError> {
        let age = self.number(raw, AGE)?;
        let sex = match self.choice(raw, SEX)? {
            "male" => Sex::Male,
            _ => Sex::Female,
        };
        let waist_hip_ratio = self.number(raw, WAIST_HIP_RATIO)?;
        let active_smoking = self.choice(raw, ACTIVE_SMOKING)? == "yes";
        let passive_smoking = self.choice(raw, PASSIVE_SMOKING)? == "yes";
        let alcohol = self.number(raw, ALCOHOL)?;
        let physical_activity = self.number(raw, PHYSICAL_ACTIVITY)?;
        let diet_quality = self.number(raw, DIET_QUALITY)?;
        let mental_health = self.number(raw, MENTAL_HEALTH)?;

        // Integer fields are range-checked whole numbers, so the narrowing casts are lossless.
        Ok(IntakeRecord {
            age: age as u8,
            sex,
            waist_hip_ratio,
            active_smoking,
            passive_smoking,
            alcohol: alcohol as u8,
            physical_activity: physical_activity as u8,
            diet_quality: diet_quality as u8,
            mental_health,
        })
    }

    /// Validate, returning the raw submission alongside any failure.
    pub fn validate_or_reject(&self, raw: RawIntake) -> Result<IntakeRecord, IntakeRejection> {
        match self.validate(&raw) {
            Ok(record) => Ok(record),
            Err(error) => Err(IntakeRejection {
                error,
                echoed_fields: raw,
            }),
        }
    }

    fn present<'a>(
        &self,
        raw: &'a RawIntake,
        field: IntakeField,
    ) -> Result<&'a str, IntakeValidationError> {
        raw.get(field.name())
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                IntakeValidationError::new(
                    IntakeErrorKind::MissingField,
                    field,
                    format!("{} is required", field.label()),
                )
            })
    }

    /// Any finite number is range-checked first; a fractional value in range
    /// for an integer field is then a parse error.
    fn number(&self, raw: &RawIntake, rule: NumberRule) -> Result<f64, IntakeValidationError> {
        let NumberRule {
            field,
            min,
            max,
            integer,
        } = rule;
        let label = field.label();
        let value = self.present(raw, field)?;

        let parse_error = |expected: &str| {
            IntakeValidationError::new(
                IntakeErrorKind::ParseError,
                field,
                format!("{label} must be {expected}"),
            )
        };
        let expected = if integer { "a whole number" } else { "a number" };

        let parsed = value
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .ok_or_else(|| parse_error(expected))?;

        if !(min..=max).contains(&parsed) {
            return Err(IntakeValidationError::new(
                IntakeErrorKind::RangeError,
                field,
                format!("{label} must be between {min} and {max}"),
            ));
        }

        if integer && parsed.fract() != 0.0 {
            return Err(parse_error(expected));
        }

        Ok(parsed)
    }

    fn choice(
        &self,
        raw: &RawIntake,
        rule: ChoiceRule,
    ) -> Result<&'static str, IntakeValidationError> {
        let value = self.present(raw, rule.field)?;

        rule.options
            .iter()
            .copied()
            .find(|option| option.eq_ignore_ascii_case(value))
            .ok_or_else(|| {
                IntakeValidationError::new(IntakeErrorKind::InvalidChoice, rule.field, rule.message)
            })
    }
}
