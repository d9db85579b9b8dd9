use ndarray::{s, Array2, Array3, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::combine::{self, CombineMode};
use crate::config::PositionEmbeddingConfig;
use crate::encoder::PositionEncoder;
use crate::error::EmbeddingError;
use crate::init::{Constraint, Initializer, Regularizer};

/// Learned position embedding backed by a trainable lookup table.
///
/// In expand mode the table has `2 * input_dim + 1` rows and row `i` holds the
/// vector for position `i - input_dim`, so signed positions in
/// `[-input_dim, input_dim]` are valid and anything outside saturates at the
/// boundary. In add/concat mode row `i` holds position `i` directly and the
/// table has `input_dim` rows.
#[derive(Debug, Serialize, Deserialize)]
pub struct PositionEmbedding {
    input_dim: usize,
    output_dim: usize,
    mode: CombineMode,
    mask_index: Option<i64>,
    initializer: Initializer,
    regularizer: Option<Regularizer>,
    constraint: Option<Constraint>,
    weights: Array2<f32>,
}

impl PositionEmbedding {
    pub fn new(input_dim: usize, output_dim: usize) -> Result<Self, EmbeddingError> {
        Self::from_config(PositionEmbeddingConfig::new(input_dim, output_dim))
    }

    pub fn from_config(config: PositionEmbeddingConfig) -> Result<Self, EmbeddingError> {
        if config.input_dim == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "input_dim must be positive".to_string(),
            ));
        }
        if config.output_dim == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "output_dim must be positive".to_string(),
            ));
        }

        let rows = Self::table_rows(config.mode, config.input_dim);
        let weights = config.initializer.build(rows, config.output_dim)?;

        Ok(Self {
            input_dim: config.input_dim,
            output_dim: config.output_dim,
            mode: config.mode,
            mask_index: config.mask_index,
            initializer: config.initializer,
            regularizer: config.regularizer,
            constraint: config.constraint,
            weights,
        })
    }

    fn table_rows(mode: CombineMode, input_dim: usize) -> usize {
        match mode {
            CombineMode::Expand => 2 * input_dim + 1,
            CombineMode::Add | CombineMode::Concat => input_dim,
        }
    }

    /// Exports every construction option; together with `weights` this is
    /// sufficient to rebuild an identical encoder.
    pub fn config(&self) -> PositionEmbeddingConfig {
        PositionEmbeddingConfig {
            input_dim: self.input_dim,
            output_dim: self.output_dim,
            mode: self.mode,
            mask_index: self.mask_index,
            initializer: self.initializer,
            regularizer: self.regularizer,
            constraint: self.constraint,
        }
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    /// Replaces the table, e.g. when loading pretrained weights.
    pub fn set_weights(&mut self, weights: Array2<f32>) -> Result<(), EmbeddingError> {
        if weights.dim() != self.weights.dim() {
            return Err(EmbeddingError::DimensionMismatch(format!(
                "expected table shape {:?}, got {:?}",
                self.weights.dim(),
                weights.dim()
            )));
        }
        self.weights = weights;
        Ok(())
    }

    /// Table row for a (possibly out-of-range) position. Saturates instead
    /// of erroring.
    fn row_for(&self, position: i64) -> usize {
        match self.mode {
            CombineMode::Expand => {
                let limit = self.input_dim as i64;
                (position.clamp(-limit, limit) + limit) as usize
            }
            CombineMode::Add | CombineMode::Concat => {
                let last = self.weights.nrows() as i64 - 1;
                position.clamp(0, last) as usize
            }
        }
    }

    /// Rows for positions `0..seq_len`, used when positions are synthesized
    /// from an input's sequence axis.
    fn position_table(&self, seq_len: usize) -> Result<Array2<f32>, EmbeddingError> {
        let start = match self.mode {
            CombineMode::Expand => self.input_dim,
            CombineMode::Add | CombineMode::Concat => 0,
        };
        let capacity = self.weights.nrows() - start;
        if seq_len > capacity {
            return Err(EmbeddingError::DimensionMismatch(format!(
                "sequence length {} exceeds positional capacity {}",
                seq_len, capacity
            )));
        }
        Ok(self.weights.slice(s![start..start + seq_len, ..]).to_owned())
    }

    /// Accumulates gradients into the looked-up rows, then re-applies the
    /// configured constraint. Driven by the external training process.
    pub fn backward(&mut self, positions: &Array2<i64>, grad_output: ArrayView3<f32>) {
        for (b, row) in positions.rows().into_iter().enumerate() {
            for (t, &position) in row.iter().enumerate() {
                let idx = self.row_for(position);
                let mut weights_row = self.weights.row_mut(idx);
                weights_row += &grad_output.slice(s![b, t, ..]);
            }
        }
        if let Some(constraint) = self.constraint {
            constraint.apply(&mut self.weights);
        }
    }

    /// Current weight penalty under the configured regularizer.
    pub fn penalty(&self) -> f32 {
        self.regularizer
            .map_or(0.0, |regularizer| regularizer.penalty(&self.weights))
    }
}

#[typetag::serde]
impl PositionEncoder for PositionEmbedding {
    fn encode(&self, positions: &Array2<i64>) -> Result<Array3<f32>, EmbeddingError> {
        let (batch, seq_len) = positions.dim();
        let mut output = Array3::zeros((batch, seq_len, self.output_dim));
        for (b, row) in positions.rows().into_iter().enumerate() {
            for (t, &position) in row.iter().enumerate() {
                output
                    .slice_mut(s![b, t, ..])
                    .assign(&self.weights.row(self.row_for(position)));
            }
        }
        Ok(output)
    }

    fn forward(&self, input: &Array3<f32>) -> Result<Array3<f32>, EmbeddingError> {
        let seq_len = input.shape()[1];
        let table = self.position_table(seq_len)?;
        combine::combine(self.mode, Some(input), &table)
    }

    fn compute_mask(&self, positions: &Array2<i64>) -> Option<Array2<bool>> {
        self.mask_index
            .map(|sentinel| positions.mapv(|p| p != sentinel))
    }

    fn output_dim(&self) -> Option<usize> {
        Some(self.output_dim)
    }

    fn mode(&self) -> CombineMode {
        self.mode
    }

    fn output_shape(&self, input_shape: &[usize]) -> Vec<usize> {
        combine::output_shape(self.mode, input_shape, self.output_dim)
    }
}
