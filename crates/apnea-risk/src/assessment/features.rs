use super::domain::{FeatureVector, IntakeRecord, Sex};

/// Encodes a validated record into the classifier's canonical feature order:
/// age, sex, waist-hip ratio, active smoking, passive smoking, alcohol,
/// physical activity, diet quality, mental health.
///
/// Reordering these features breaks compatibility with every trained artifact.
pub fn encode(record: &IntakeRecord) -> FeatureVector {
    FeatureVector::new([
        f64::from(record.age),
        match record.sex {
            Sex::Male => 1.0,
            Sex::Female => 0.0,
        },
        record.waist_hip_ratio,
        flag(record.active_smoking),
        flag(record.passive_smoking),
        f64::from(record.alcohol),
        f64::from(record.physical_activity),
        f64::from(record.diet_quality),
        record.mental_health,
    ])
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
