//! Positional embeddings for sequence models.
//!
//! Two encoders behind one [`PositionEncoder`] trait: a learned, trainable
//! lookup table ([`PositionEmbedding`]) and the fixed sinusoidal encoding
//! ([`TrigPosEmbedding`]). Both support the same combination modes: expand
//! (positions alone), add (elementwise sum with an input tensor) and concat
//! (append along the feature axis).

pub mod checkpoint;
pub use checkpoint::{load, load_encoder, save, save_encoder};

pub mod combine;
pub use combine::{combine, output_shape, CombineMode};

pub mod config;
pub use config::{PositionEmbeddingConfig, TrigPosEmbeddingConfig};

pub mod encoder;
pub use encoder::PositionEncoder;

pub mod init;
pub use init::{Constraint, Initializer, Regularizer};

pub mod learned;
pub use learned::PositionEmbedding;

pub mod trig;
pub use trig::TrigPosEmbedding;

pub mod error;
pub use error::EmbeddingError;
