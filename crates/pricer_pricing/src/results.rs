//! Engine results.

use std::collections::BTreeMap;

/// Value, error estimate and secondary outputs of an engine call.
///
/// `error_estimate` is `None` for low-discrepancy runs, whose sample
/// variance says nothing about the integration error.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PricingResult {
    /// Present value
    pub value: f64,
    /// Standard error of the value
    pub error_estimate: Option<f64>,
    /// Number of pricing samples
    pub samples: usize,
    /// Named secondary outputs, such as `exercise_probability`
    pub additional_results: BTreeMap<String, f64>,
}

impl PricingResult {
    /// Creates a result without secondary outputs.
    pub fn new(value: f64, error_estimate: Option<f64>, samples: usize) -> Self {
        Self {
            value,
            error_estimate,
            samples,
            additional_results: BTreeMap::new(),
        }
    }

    /// Adds a secondary output.
    pub fn with_additional(mut self, name: &str, value: f64) -> Self {
        self.additional_results.insert(name.to_string(), value);
        self
    }

    /// Secondary output `name`, if reported.
    pub fn additional(&self, name: &str) -> Option<f64> {
        self.additional_results.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additional_results() {
        let result = PricingResult::new(4.48, Some(0.01), 50_000)
            .with_additional("exercise_probability", 0.62);
        assert_eq!(result.additional("exercise_probability"), Some(0.62));
        assert_eq!(result.additional("delta"), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialises_missing_error_as_null() {
        let result = PricingResult::new(1.0, None, 8);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"error_estimate\":null"));
    }
}
