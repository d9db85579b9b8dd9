use ndarray::{s, Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;

/// How a positional tensor is merged with an input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombineMode {
    /// Positions are the sole input; the output is the positional tensor itself.
    Expand,
    /// Elementwise sum; requires matching feature dimensions.
    Add,
    /// Append the positional vector along the feature axis.
    Concat,
}

impl Default for CombineMode {
    fn default() -> Self {
        Self::Expand
    }
}

/// Merges a positional table `pos` of shape `(seq_len, dim)` with `input` of
/// shape `(batch, seq_len, features)`, broadcasting `pos` over the batch axis.
///
/// In `Expand` mode the input's values are ignored; only its batch size is
/// used (batch 1 when absent).
pub fn combine(
    mode: CombineMode,
    input: Option<&Array3<f32>>,
    pos: &Array2<f32>,
) -> Result<Array3<f32>, EmbeddingError> {
    let (pos_len, dim) = pos.dim();
    match mode {
        CombineMode::Expand => {
            let batch = input.map_or(1, |x| x.shape()[0]);
            let mut output = Array3::zeros((batch, pos_len, dim));
            for mut row in output.outer_iter_mut() {
                row.assign(pos);
            }
            Ok(output)
        }
        CombineMode::Add => {
            let x = required_input(input, CombineMode::Add)?;
            let (_, seq_len, features) = x.dim();
            check_seq_len(seq_len, pos_len)?;
            if features != dim {
                return Err(EmbeddingError::DimensionMismatch(format!(
                    "cannot add positional dimension {} to feature dimension {}",
                    dim, features
                )));
            }
            let mut output = x.to_owned();
            for mut batch in output.outer_iter_mut() {
                batch += pos;
            }
            Ok(output)
        }
        CombineMode::Concat => {
            let x = required_input(input, CombineMode::Concat)?;
            let (batch, seq_len, features) = x.dim();
            check_seq_len(seq_len, pos_len)?;
            let mut output = Array3::zeros((batch, seq_len, features + dim));
            output.slice_mut(s![.., .., ..features]).assign(x);
            for b in 0..batch {
                output.slice_mut(s![b, .., features..]).assign(pos);
            }
            Ok(output)
        }
    }
}

/// Output shape as a function of the input shape (trailing axis is features).
pub fn output_shape(mode: CombineMode, input_shape: &[usize], output_dim: usize) -> Vec<usize> {
    let mut shape = input_shape.to_vec();
    match mode {
        CombineMode::Expand => shape.push(output_dim),
        CombineMode::Add => {}
        CombineMode::Concat => {
            if let Some(features) = shape.last_mut() {
                *features += output_dim;
            }
        }
    }
    shape
}

fn required_input<'a>(
    input: Option<&'a Array3<f32>>,
    mode: CombineMode,
) -> Result<&'a Array3<f32>, EmbeddingError> {
    input.ok_or_else(|| {
        EmbeddingError::DimensionMismatch(format!("{:?} mode requires an input tensor", mode))
    })
}

fn check_seq_len(seq_len: usize, pos_len: usize) -> Result<(), EmbeddingError> {
    if seq_len != pos_len {
        return Err(EmbeddingError::DimensionMismatch(format!(
            "input sequence length {} does not match positional length {}",
            seq_len, pos_len
        )));
    }
    Ok(())
}
