use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::combine::{self, CombineMode};
use crate::config::TrigPosEmbeddingConfig;
use crate::encoder::PositionEncoder;
use crate::error::EmbeddingError;

/// Fixed sinusoidal position embedding from "Attention is All You Need".
///
/// PE(pos, 2i)   = sin(pos / 10000^(2i / dim))
/// PE(pos, 2i+1) = cos(pos / 10000^(2i / dim))
///
/// Holds no learned state; values are a pure function of the position, the
/// feature index and the output dimension. Angles are computed in `f64` so
/// large positions do not drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrigPosEmbedding {
    mode: CombineMode,
    output_dim: Option<usize>,
}

impl TrigPosEmbedding {
    /// `output_dim` must be even; it may be left unset only in add mode,
    /// where the input's feature dimension supplies it. Violations are
    /// rejected here, not at call time.
    pub fn new(mode: CombineMode, output_dim: Option<usize>) -> Result<Self, EmbeddingError> {
        match output_dim {
            Some(dim) if dim == 0 || dim % 2 != 0 => {
                return Err(EmbeddingError::InvalidConfig(format!(
                    "output_dim must be a positive even number, got {}",
                    dim
                )));
            }
            None if mode != CombineMode::Add => {
                return Err(EmbeddingError::InvalidConfig(format!(
                    "output_dim is required in {:?} mode",
                    mode
                )));
            }
            _ => {}
        }
        Ok(Self { mode, output_dim })
    }

    pub fn from_config(config: TrigPosEmbeddingConfig) -> Result<Self, EmbeddingError> {
        Self::new(config.mode, config.output_dim)
    }

    /// The config is this encoder's entire persistent state.
    pub fn config(&self) -> TrigPosEmbeddingConfig {
        TrigPosEmbeddingConfig::new(self.mode, self.output_dim)
    }

    fn value(position: i64, j: usize, dim: usize) -> f32 {
        // sin/cos pairs share the frequency of the even index.
        let pair = (j - j % 2) as f64;
        let angle = position as f64 / 10000f64.powf(pair / dim as f64);
        if j % 2 == 0 {
            angle.sin() as f32
        } else {
            angle.cos() as f32
        }
    }

    /// Encoding table for positions `0..seq_len`, shape `(seq_len, dim)`.
    pub fn compute_encoding(seq_len: usize, dim: usize) -> Array2<f32> {
        Array2::from_shape_fn((seq_len, dim), |(position, j)| {
            Self::value(position as i64, j, dim)
        })
    }
}

#[typetag::serde]
impl PositionEncoder for TrigPosEmbedding {
    fn encode(&self, positions: &Array2<i64>) -> Result<Array3<f32>, EmbeddingError> {
        let dim = self.output_dim.ok_or_else(|| {
            EmbeddingError::InvalidConfig(
                "output_dim is not set; it is only inferred when combining with an input tensor"
                    .to_string(),
            )
        })?;
        let (batch, seq_len) = positions.dim();
        Ok(Array3::from_shape_fn((batch, seq_len, dim), |(b, t, j)| {
            Self::value(positions[[b, t]], j, dim)
        }))
    }

    fn forward(&self, input: &Array3<f32>) -> Result<Array3<f32>, EmbeddingError> {
        let (_, seq_len, features) = input.dim();
        let dim = match self.mode {
            // A configured dim that disagrees with the input surfaces as a
            // shape error in the add itself.
            CombineMode::Add => self.output_dim.unwrap_or(features),
            CombineMode::Expand | CombineMode::Concat => self.output_dim.ok_or_else(|| {
                EmbeddingError::InvalidConfig("output_dim is required".to_string())
            })?,
        };
        let table = Self::compute_encoding(seq_len, dim);
        combine::combine(self.mode, Some(input), &table)
    }

    fn output_dim(&self) -> Option<usize> {
        self.output_dim
    }

    fn mode(&self) -> CombineMode {
        self.mode
    }

    fn output_shape(&self, input_shape: &[usize]) -> Vec<usize> {
        combine::output_shape(self.mode, input_shape, self.output_dim.unwrap_or(0))
    }
}
