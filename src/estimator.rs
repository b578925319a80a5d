// 📐 Effect Estimator - treatment → outcome scalar effect
// The pipeline only depends on the trait contract; the regression behind it
// is swappable.

use thiserror::Error;

// ============================================================================
// FAILURE TAXONOMY
// ============================================================================

/// EstimateError - why estimation failed for one entity
///
/// Recoverable at entity granularity, and deliberately a different type from
/// the Aligner's no-window outcomes: "estimator broke" and "no data to feed
/// it" must not be conflated by callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("treatment and outcome lengths differ ({treatment} vs {outcome})")]
    LengthMismatch { treatment: usize, outcome: usize },

    #[error("no samples to fit")]
    NoSamples,

    #[error("need at least 2 observations, got {0}")]
    InsufficientObservations(usize),

    #[error("treatment series has zero variance, slope is undefined")]
    DegenerateTreatment,

    #[error("estimate is not finite")]
    NonFinite,
}

// ============================================================================
// ESTIMATOR TRAIT
// ============================================================================

/// EffectEstimator - pluggable capability consumed by the pipeline
///
/// Contract: `treatment` and `outcome` are index-aligned (same year per
/// position) and non-empty. Returns one scalar: the estimated effect of a
/// unit of treatment on the outcome over the window.
pub trait EffectEstimator {
    fn estimate(&self, treatment: &[f64], outcome: &[f64]) -> Result<f64, EstimateError>;

    /// Short identifier recorded in run provenance
    fn name(&self) -> &'static str {
        "unnamed"
    }
}

// ============================================================================
// LINEAR REGRESSION ESTIMATOR
// ============================================================================

/// LinearEffectEstimator - OLS slope of outcome on treatment
///
/// For the single-edge causal graph (treatment → outcome) the backdoor
/// adjustment set is empty, so the adjusted linear-regression estimand is
/// exactly the plain OLS coefficient.
#[derive(Debug, Clone, Default)]
pub struct LinearEffectEstimator;

impl LinearEffectEstimator {
    pub fn new() -> Self {
        LinearEffectEstimator
    }
}

impl EffectEstimator for LinearEffectEstimator {
    fn estimate(&self, treatment: &[f64], outcome: &[f64]) -> Result<f64, EstimateError> {
        if treatment.len() != outcome.len() {
            return Err(EstimateError::LengthMismatch {
                treatment: treatment.len(),
                outcome: outcome.len(),
            });
        }
        if treatment.is_empty() {
            return Err(EstimateError::NoSamples);
        }
        let n = treatment.len();
        if n < 2 {
            return Err(EstimateError::InsufficientObservations(n));
        }

        let t_mean = treatment.iter().sum::<f64>() / n as f64;
        let o_mean = outcome.iter().sum::<f64>() / n as f64;

        let mut num = 0.0;
        let mut den = 0.0;
        for i in 0..n {
            let t_diff = treatment[i] - t_mean;
            num += t_diff * (outcome[i] - o_mean);
            den += t_diff * t_diff;
        }

        if den.abs() < 1e-12 {
            return Err(EstimateError::DegenerateTreatment);
        }

        let slope = num / den;
        if !slope.is_finite() {
            return Err(EstimateError::NonFinite);
        }

        Ok(slope)
    }

    fn name(&self) -> &'static str {
        "ols_linear_regression"
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_linear_relationship() {
        let estimator = LinearEffectEstimator::new();
        let treatment = vec![1.0, 2.0, 3.0, 4.0];
        let outcome: Vec<f64> = treatment.iter().map(|t| 2.0 * t + 1.0).collect();

        let effect = estimator.estimate(&treatment, &outcome).unwrap();
        assert!((effect - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_slope() {
        let estimator = LinearEffectEstimator::new();
        let treatment = vec![80.0, 85.0, 90.0, 95.0];
        let outcome = vec![120.0, 90.0, 60.0, 30.0];

        let effect = estimator.estimate(&treatment, &outcome).unwrap();
        assert!((effect - (-6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_noisy_data_still_fits() {
        let estimator = LinearEffectEstimator::new();
        let treatment = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let outcome = vec![21.0, 39.0, 62.0, 78.0, 103.0];

        let effect = estimator.estimate(&treatment, &outcome).unwrap();
        assert!(effect > 1.5 && effect < 2.5);
    }

    #[test]
    fn test_length_mismatch() {
        let estimator = LinearEffectEstimator::new();

        let err = estimator.estimate(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert_eq!(
            err,
            EstimateError::LengthMismatch {
                treatment: 2,
                outcome: 1
            }
        );
    }

    #[test]
    fn test_empty_input() {
        let estimator = LinearEffectEstimator::new();
        assert_eq!(estimator.estimate(&[], &[]).unwrap_err(), EstimateError::NoSamples);
    }

    #[test]
    fn test_single_observation() {
        let estimator = LinearEffectEstimator::new();

        let err = estimator.estimate(&[80.0], &[50.0]).unwrap_err();
        assert_eq!(err, EstimateError::InsufficientObservations(1));
    }

    #[test]
    fn test_constant_treatment_is_degenerate() {
        let estimator = LinearEffectEstimator::new();

        let err = estimator.estimate(&[90.0, 90.0, 90.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, EstimateError::DegenerateTreatment);
    }

    #[test]
    fn test_error_messages_name_the_problem() {
        let err = EstimateError::InsufficientObservations(1);
        assert!(err.to_string().contains("at least 2"));

        let err = EstimateError::DegenerateTreatment;
        assert!(err.to_string().contains("zero variance"));
    }
}
