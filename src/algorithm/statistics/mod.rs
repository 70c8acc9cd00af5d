//! Association statistics between two numeric samples
//!
//! Every statistic is a fallible computation returning [`StatResult`]. A
//! degenerate sample (constant variable, too few points, singular fit)
//! fails that statistic only; callers store [`or_sentinel`] of the result
//! so the other statistics of the same sample are still reported.

pub mod correlation;
pub mod mutual_info;
pub mod regression;

pub use correlation::{kendall_tau_b, pearson, spearman};
pub use mutual_info::MutualInfoEstimator;
pub use regression::{linear_fit, polynomial_r2, slope};

/// Why a statistic could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DegenerateInput {
    /// One of the variables is constant
    #[error("zero variance")]
    ZeroVariance,

    /// The sample is smaller than the statistic needs
    #[error("too few samples: {actual} < {required}")]
    TooFewSamples {
        /// Minimum sample size
        required: usize,
        /// Sample size given
        actual: usize,
    },

    /// The two samples differ in length
    #[error("sample length mismatch: {0} vs {1}")]
    LengthMismatch(usize, usize),

    /// The least-squares system has no unique solution
    #[error("singular system")]
    SingularSystem,
}

/// Value of a statistic, or why it is undefined
pub type StatResult = std::result::Result<f64, DegenerateInput>;

/// The value of a statistic, NaN when it is undefined
#[must_use]
pub fn or_sentinel(result: StatResult) -> f64 {
    result.unwrap_or(f64::NAN)
}

/// Check two samples have equal length of at least `required`
pub(crate) fn check_sample(x: &[f64], y: &[f64], required: usize) -> Result<(), DegenerateInput> {
    if x.len() != y.len() {
        return Err(DegenerateInput::LengthMismatch(x.len(), y.len()));
    }
    if x.len() < required {
        return Err(DegenerateInput::TooFewSamples {
            required,
            actual: x.len(),
        });
    }
    Ok(())
}

/// Whether every value equals the first
pub(crate) fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_nan() {
        assert!(or_sentinel(Err(DegenerateInput::ZeroVariance)).is_nan());
        assert_eq!(or_sentinel(Ok(0.5)), 0.5);
    }

    #[test]
    fn sample_checks() {
        assert_eq!(
            check_sample(&[1.0], &[1.0, 2.0], 2),
            Err(DegenerateInput::LengthMismatch(1, 2))
        );
        assert_eq!(
            check_sample(&[1.0], &[1.0], 2),
            Err(DegenerateInput::TooFewSamples {
                required: 2,
                actual: 1
            })
        );
        assert!(is_constant(&[0.1, 0.1, 0.1]));
        assert!(!is_constant(&[0.1, 0.2]));
    }
}
