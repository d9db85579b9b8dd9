use ndarray::Array2;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;

/// Weight initialization policy for the learned embedding table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    Uniform { low: f32, high: f32 },
    Normal { mean: f32, std_dev: f32 },
    Zeros,
    Constant(f32),
}

impl Default for Initializer {
    fn default() -> Self {
        Self::Uniform {
            low: -0.05,
            high: 0.05,
        }
    }
}

impl Initializer {
    pub fn build(&self, rows: usize, cols: usize) -> Result<Array2<f32>, EmbeddingError> {
        let mut rng = rand::thread_rng();
        match *self {
            Initializer::Uniform { low, high } => {
                if low >= high {
                    return Err(EmbeddingError::InitializationError(format!(
                        "uniform range [{}, {}) is empty",
                        low, high
                    )));
                }
                let dist = Uniform::new(low, high);
                Ok(Array2::from_shape_fn((rows, cols), |_| dist.sample(&mut rng)))
            }
            Initializer::Normal { mean, std_dev } => {
                let dist = Normal::new(mean, std_dev)
                    .map_err(|e| EmbeddingError::InitializationError(e.to_string()))?;
                Ok(Array2::from_shape_fn((rows, cols), |_| dist.sample(&mut rng)))
            }
            Initializer::Zeros => Ok(Array2::zeros((rows, cols))),
            Initializer::Constant(value) => Ok(Array2::from_elem((rows, cols), value)),
        }
    }
}

/// Weight penalty read by the training collaborator; never applied on the
/// encoder's own read path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Regularizer {
    L1(f32),
    L2(f32),
}

impl Regularizer {
    pub fn penalty(&self, weights: &Array2<f32>) -> f32 {
        match *self {
            Regularizer::L1(l) => l * weights.iter().map(|w| w.abs()).sum::<f32>(),
            Regularizer::L2(l) => l * weights.iter().map(|w| w * w).sum::<f32>(),
        }
    }

    pub fn grad(&self, weights: &Array2<f32>) -> Array2<f32> {
        match *self {
            Regularizer::L1(l) => weights.mapv(|w| l * w.signum()),
            Regularizer::L2(l) => weights.mapv(|w| 2.0 * l * w),
        }
    }
}

/// Projection applied to the table after each gradient update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    NonNeg,
    /// Caps the L2 norm of each embedding vector.
    MaxNorm(f32),
}

impl Constraint {
    pub fn apply(&self, weights: &mut Array2<f32>) {
        match *self {
            Constraint::NonNeg => weights.mapv_inplace(|w| w.max(0.0)),
            Constraint::MaxNorm(max_norm) => {
                for mut row in weights.rows_mut() {
                    let norm = row.iter().map(|w| w * w).sum::<f32>().sqrt();
                    if norm > max_norm && norm > 0.0 {
                        let scale = max_norm / norm;
                        row.mapv_inplace(|w| w * scale);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr2;

    #[test]
    fn test_default_uniform_range() {
        let weights = Initializer::default().build(50, 8).unwrap();
        assert_eq!(weights.shape(), &[50, 8]);
        assert!(weights.iter().all(|w| (-0.05..0.05).contains(w)));
    }

    #[test]
    fn test_zeros_and_constant() {
        let zeros = Initializer::Zeros.build(3, 2).unwrap();
        assert!(zeros.iter().all(|&w| w == 0.0));

        let threes = Initializer::Constant(3.0).build(3, 2).unwrap();
        assert!(threes.iter().all(|&w| w == 3.0));
    }

    #[test]
    fn test_empty_uniform_range_rejected() {
        let result = Initializer::Uniform {
            low: 0.5,
            high: 0.5,
        }
        .build(2, 2);
        assert!(matches!(
            result,
            Err(EmbeddingError::InitializationError(_))
        ));
    }

    #[test]
    fn test_l2_penalty() {
        let weights = arr2(&[[1.0, 2.0], [3.0, 0.0]]);
        let penalty = Regularizer::L2(0.1).penalty(&weights);
        assert_abs_diff_eq!(penalty, 0.1 * 14.0, epsilon = 1e-6);
    }

    #[test]
    fn test_l1_grad_is_scaled_sign() {
        let weights = arr2(&[[-2.0, 3.0]]);
        let grad = Regularizer::L1(0.5).grad(&weights);
        assert_abs_diff_eq!(grad[[0, 0]], -0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(grad[[0, 1]], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_non_neg_constraint() {
        let mut weights = arr2(&[[-1.0, 2.0]]);
        Constraint::NonNeg.apply(&mut weights);
        assert_abs_diff_eq!(weights[[0, 0]], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(weights[[0, 1]], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_max_norm_rescales_rows() {
        let mut weights = arr2(&[[3.0, 4.0], [0.3, 0.4]]);
        Constraint::MaxNorm(1.0).apply(&mut weights);

        // First row had norm 5, rescaled to unit norm; second row untouched.
        assert_abs_diff_eq!(weights[[0, 0]], 0.6, epsilon = 1e-6);
        assert_abs_diff_eq!(weights[[0, 1]], 0.8, epsilon = 1e-6);
        assert_abs_diff_eq!(weights[[1, 0]], 0.3, epsilon = 1e-6);
    }
}
