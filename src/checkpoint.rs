use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::encoder::PositionEncoder;
use crate::error::EmbeddingError;

/// Saves a concrete encoder (weights included) as binary.
pub fn save<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), EmbeddingError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, value)?;
    Ok(())
}

pub fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, EmbeddingError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    Ok(bincode::deserialize_from(reader)?)
}

/// Saves a type-erased encoder. Trait objects need a self-describing format,
/// so this writes tagged JSON rather than bincode.
pub fn save_encoder(
    path: impl AsRef<Path>,
    encoder: &dyn PositionEncoder,
) -> Result<(), EmbeddingError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer(writer, encoder)?;
    Ok(())
}

pub fn load_encoder(path: impl AsRef<Path>) -> Result<Box<dyn PositionEncoder>, EmbeddingError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::CombineMode;
    use crate::config::PositionEmbeddingConfig;
    use crate::learned::PositionEmbedding;
    use crate::trig::TrigPosEmbedding;
    use ndarray::arr2;
    use tempfile::tempdir;

    #[test]
    fn test_concrete_round_trip_is_bit_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pos_embd.bin");

        let embedding = PositionEmbedding::from_config(
            PositionEmbeddingConfig::new(10, 4).with_mask_index(0),
        )
        .unwrap();
        save(&path, &embedding).unwrap();
        let restored: PositionEmbedding = load(&path).unwrap();

        let positions = arr2(&[[-10, -1, 0, 1, 10, 99]]);
        assert_eq!(
            embedding.encode(&positions).unwrap(),
            restored.encode(&positions).unwrap()
        );
        assert_eq!(embedding.config(), restored.config());
    }

    #[test]
    fn test_dyn_round_trip_recovers_variant() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("encoders/trig.json");

        let encoder: Box<dyn PositionEncoder> =
            Box::new(TrigPosEmbedding::new(CombineMode::Expand, Some(8)).unwrap());
        save_encoder(&path, encoder.as_ref()).unwrap();
        let restored = load_encoder(&path).unwrap();

        let positions = arr2(&[[0, 1, 2]]);
        assert_eq!(
            encoder.encode(&positions).unwrap(),
            restored.encode(&positions).unwrap()
        );
        assert_eq!(restored.mode(), CombineMode::Expand);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = load_encoder(dir.path().join("missing.json"));
        assert!(matches!(result, Err(EmbeddingError::Io(_))));
    }
}
