use serde::{Deserialize, Serialize};

use crate::combine::CombineMode;
use crate::error::EmbeddingError;
use crate::init::{Constraint, Initializer, Regularizer};

/// Full configuration of a learned position embedding. Every option is
/// explicit here and resolved at construction; reconstructing from an
/// exported config never re-derives a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEmbeddingConfig {
    /// Maximum absolute position value the table covers.
    pub input_dim: usize,
    /// Embedding dimension.
    pub output_dim: usize,
    #[serde(default)]
    pub mode: CombineMode,
    /// Sentinel position reported as padding by `compute_mask`.
    #[serde(default)]
    pub mask_index: Option<i64>,
    #[serde(default)]
    pub initializer: Initializer,
    #[serde(default)]
    pub regularizer: Option<Regularizer>,
    #[serde(default)]
    pub constraint: Option<Constraint>,
}

impl PositionEmbeddingConfig {
    pub fn new(input_dim: usize, output_dim: usize) -> Self {
        Self {
            input_dim,
            output_dim,
            mode: CombineMode::default(),
            mask_index: None,
            initializer: Initializer::default(),
            regularizer: None,
            constraint: None,
        }
    }

    pub fn with_mode(mut self, mode: CombineMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_mask_index(mut self, mask_index: i64) -> Self {
        self.mask_index = Some(mask_index);
        self
    }

    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = initializer;
        self
    }

    pub fn with_regularizer(mut self, regularizer: Regularizer) -> Self {
        self.regularizer = Some(regularizer);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn to_json(&self) -> Result<String, EmbeddingError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, EmbeddingError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Configuration of a trigonometric position embedding. This is the
/// encoder's entire persistent state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TrigPosEmbeddingConfig {
    #[serde(default)]
    pub mode: CombineMode,
    /// Must be even when set; may be left unset only in add mode, where it
    /// is inferred from the input's feature dimension.
    #[serde(default)]
    pub output_dim: Option<usize>,
}

impl TrigPosEmbeddingConfig {
    pub fn new(mode: CombineMode, output_dim: Option<usize>) -> Self {
        Self { mode, output_dim }
    }

    pub fn to_json(&self) -> Result<String, EmbeddingError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, EmbeddingError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learned_config_json_round_trip() {
        let config = PositionEmbeddingConfig::new(10, 4)
            .with_mode(CombineMode::Concat)
            .with_mask_index(0)
            .with_initializer(Initializer::Normal {
                mean: 0.0,
                std_dev: 0.02,
            })
            .with_regularizer(Regularizer::L2(0.01))
            .with_constraint(Constraint::MaxNorm(2.0));

        let json = config.to_json().unwrap();
        let restored = PositionEmbeddingConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn test_learned_config_defaults_from_partial_json() {
        let config =
            PositionEmbeddingConfig::from_json(r#"{"input_dim": 10, "output_dim": 2}"#).unwrap();
        assert_eq!(config.mode, CombineMode::Expand);
        assert_eq!(config.mask_index, None);
        assert_eq!(config.initializer, Initializer::default());
    }

    #[test]
    fn test_trig_config_json_round_trip() {
        let config = TrigPosEmbeddingConfig::new(CombineMode::Add, None);
        let json = config.to_json().unwrap();
        assert_eq!(TrigPosEmbeddingConfig::from_json(&json).unwrap(), config);
    }
}
