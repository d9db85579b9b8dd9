use ndarray::{Array2, Array3};

use crate::combine::CombineMode;
use crate::error::EmbeddingError;

/// Common capability of all position encoders.
///
/// `encode` maps explicit integer positions to embedding vectors; `forward`
/// merges synthesized positions with a batched input tensor of shape
/// `(batch, seq_len, features)` according to the encoder's combination mode.
#[typetag::serde]
pub trait PositionEncoder {
    /// Positions shape: `(batch, seq_len)`. Output: `(batch, seq_len, output_dim)`.
    fn encode(&self, positions: &Array2<i64>) -> Result<Array3<f32>, EmbeddingError>;

    /// Input shape: `(batch, seq_len, features)`.
    fn forward(&self, input: &Array3<f32>) -> Result<Array3<f32>, EmbeddingError>;

    /// Flags positions that downstream consumers should treat as padding.
    /// `None` means masking is inactive; `true` entries are active positions.
    fn compute_mask(&self, _positions: &Array2<i64>) -> Option<Array2<bool>> {
        None
    }

    /// `None` when the dimension is inferred from the input at forward time.
    fn output_dim(&self) -> Option<usize>;

    fn mode(&self) -> CombineMode;

    /// Shape of `forward`'s output (or `encode`'s, in expand mode) for a
    /// given input shape.
    fn output_shape(&self, input_shape: &[usize]) -> Vec<usize>;
}
