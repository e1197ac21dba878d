use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Classifier output, guaranteed to lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct RiskProbability(f64);

impl RiskProbability {
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && (0.0..=1.0).contains(&value)).then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Moderate,
    Mild,
    High,
}

impl RiskCategory {
    pub fn label(self) -> &'static str {
        match self {
            RiskCategory::Low => "Low Risk",
            RiskCategory::Moderate => "Moderate Risk",
            RiskCategory::Mild => "Mild Risk",
            RiskCategory::High => "High Risk",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Named probability thresholds. Each tier's lower bound is inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdPolicy {
    /// Below 0.30 low, below 0.70 moderate, otherwise high.
    #[default]
    WideMiddle,
    /// Below 0.33 low, below 0.66 mild, otherwise high.
    EvenSplit,
}

impl ThresholdPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ThresholdPolicy::WideMiddle => "wide-middle",
            ThresholdPolicy::EvenSplit => "even-split",
        }
    }

    /// Lower bounds of the middle and high tiers.
    pub fn thresholds(self) -> (f64, f64) {
        match self {
            ThresholdPolicy::WideMiddle => (0.30, 0.70),
            ThresholdPolicy::EvenSplit => (0.33, 0.66),
        }
    }

    pub fn categorize(self, probability: RiskProbability) -> RiskCategory {
        let (middle, high) = self.thresholds();
        let p = probability.value();
        if p < middle {
            RiskCategory::Low
        } else if p < high {
            match self {
                ThresholdPolicy::WideMiddle => RiskCategory::Moderate,
                ThresholdPolicy::EvenSplit => RiskCategory::Mild,
            }
        } else {
            RiskCategory::High
        }
    }
}

impl fmt::Display for ThresholdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown threshold policy '{0}'")]
pub struct UnknownPolicy(pub String);

impl FromStr for ThresholdPolicy {
    type Err = UnknownPolicy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "wide-middle" | "wide_middle" | "a" | "30-70" => Ok(Self::WideMiddle),
            "even-split" | "even_split" | "b" | "33-66" => Ok(Self::EvenSplit),
            _ => Err(UnknownPolicy(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(value: f64) -> RiskProbability {
        RiskProbability::new(value).expect("probability in range")
    }

    #[test]
    fn wide_middle_boundaries() {
        let policy = ThresholdPolicy::WideMiddle;
        assert_eq!(policy.categorize(p(0.29)), RiskCategory::Low);
        assert_eq!(policy.categorize(p(0.30)), RiskCategory::Moderate);
        assert_eq!(policy.categorize(p(0.69)), RiskCategory::Moderate);
        assert_eq!(policy.categorize(p(0.70)), RiskCategory::High);
    }

    #[test]
    fn even_split_boundaries() {
        let policy = ThresholdPolicy::EvenSplit;
        assert_eq!(policy.categorize(p(0.32)), RiskCategory::Low);
        assert_eq!(policy.categorize(p(0.33)), RiskCategory::Mild);
        assert_eq!(policy.categorize(p(0.65)), RiskCategory::Mild);
        assert_eq!(policy.categorize(p(0.66)), RiskCategory::High);
    }

    #[test]
    fn extremes_map_to_outer_tiers() {
        for policy in [ThresholdPolicy::WideMiddle, ThresholdPolicy::EvenSplit] {
            assert_eq!(policy.categorize(p(0.0)), RiskCategory::Low);
            assert_eq!(policy.categorize(p(1.0)), RiskCategory::High);
        }
    }

    #[test]
    fn probability_rejects_out_of_range_values() {
        assert!(RiskProbability::new(-0.01).is_none());
        assert!(RiskProbability::new(1.01).is_none());
        assert!(RiskProbability::new(f64::NAN).is_none());
    }

    #[test]
    fn parses_policy_aliases() {
        assert_eq!("A".parse::<ThresholdPolicy>(), Ok(ThresholdPolicy::WideMiddle));
        assert_eq!("33-66".parse::<ThresholdPolicy>(), Ok(ThresholdPolicy::EvenSplit));
        assert_eq!(
            " even-split ".parse::<ThresholdPolicy>(),
            Ok(ThresholdPolicy::EvenSplit)
        );
        assert!("median".parse::<ThresholdPolicy>().is_err());
    }

    #[test]
    fn labels_match_result_page_wording() {
        assert_eq!(RiskCategory::Moderate.label(), "Moderate Risk");
        assert_eq!(RiskCategory::Mild.to_string(), "Mild Risk");
    }
}
