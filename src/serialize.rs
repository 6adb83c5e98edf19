//! Saving and loading a single network's weights as human-readable JSON.
//!
//! The file is an object of four named arrays; matrices are nested row arrays. There is no
//! version field, shapes are checked against the configured [Architecture] on load instead.

use crate::{config::Architecture, network::PolicyNetwork};
use rulinalg::matrix::{BaseMatrix, Matrix};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::info;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CodecError {
    #[display("weight file {} does not exist", path.display())]
    Missing { path: PathBuf },
    #[display("failed to access weight file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("malformed weight file {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct WeightFile {
    weights_input_hidden: Vec<Vec<f64>>,
    bias_hidden: Vec<f64>,
    weights_hidden_output: Vec<Vec<f64>>,
    bias_output: Vec<f64>,
}

fn matrix_rows(matrix: &Matrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .data()
        .chunks(matrix.cols())
        .map(<[f64]>::to_vec)
        .collect()
}

/// Append `rows` to `flat` if they form exactly a `shape.0 × shape.1` matrix.
fn flatten_rows(
    name: &str,
    rows: &[Vec<f64>],
    shape: (usize, usize),
    flat: &mut Vec<f64>,
) -> Result<(), String> {
    if rows.len() != shape.0 {
        return Err(format!(
            "{name}: expected {} rows, found {}",
            shape.0,
            rows.len()
        ));
    }
    for (idx, row) in rows.iter().enumerate() {
        if row.len() != shape.1 {
            return Err(format!(
                "{name}: expected {} columns in row {idx}, found {}",
                shape.1,
                row.len()
            ));
        }
        flat.extend_from_slice(row);
    }
    Ok(())
}

fn flatten_vector(name: &str, v: &[f64], len: usize, flat: &mut Vec<f64>) -> Result<(), String> {
    if v.len() != len {
        return Err(format!("{name}: expected {len} values, found {}", v.len()));
    }
    flat.extend_from_slice(v);
    Ok(())
}

impl WeightFile {
    fn from_network(network: &PolicyNetwork) -> Self {
        Self {
            weights_input_hidden: matrix_rows(network.weights_input_hidden()),
            bias_hidden: network.bias_hidden().data().to_vec(),
            weights_hidden_output: matrix_rows(network.weights_hidden_output()),
            bias_output: network.bias_output().data().to_vec(),
        }
    }

    fn into_network(self, architecture: Architecture) -> Result<PolicyNetwork, String> {
        let Architecture {
            input_size,
            hidden_size,
            output_size,
        } = architecture;

        // same order as PolicyNetwork::parameters
        let mut flat = Vec::with_capacity(architecture.parameter_count());
        flatten_rows(
            "weights_input_hidden",
            &self.weights_input_hidden,
            (input_size, hidden_size),
            &mut flat,
        )?;
        flatten_rows(
            "weights_hidden_output",
            &self.weights_hidden_output,
            (hidden_size, output_size),
            &mut flat,
        )?;
        flatten_vector("bias_hidden", &self.bias_hidden, hidden_size, &mut flat)?;
        flatten_vector("bias_output", &self.bias_output, output_size, &mut flat)?;

        Ok(PolicyNetwork::from_parameters(architecture, &flat))
    }
}

/// Reads and writes networks of one fixed [Architecture].
#[derive(Debug, Clone, Copy)]
pub struct WeightCodec {
    architecture: Architecture,
}

impl WeightCodec {
    pub fn new(architecture: Architecture) -> Self {
        Self { architecture }
    }

    pub fn to_string(&self, network: &PolicyNetwork) -> String {
        serde_json::to_string_pretty(&WeightFile::from_network(network))
            .expect("plain float arrays always serialize")
    }

    /// Parse a weight file's contents. Errors are bare reasons; [WeightCodec::load] attaches
    /// the path.
    pub(crate) fn from_str(&self, raw: &str) -> Result<PolicyNetwork, String> {
        let file = serde_json::from_str::<WeightFile>(raw).map_err(|e| e.to_string())?;
        file.into_network(self.architecture)
    }

    pub fn save<P: AsRef<Path>>(
        &self,
        network: &PolicyNetwork,
        path: P,
    ) -> Result<(), CodecError> {
        let path = path.as_ref();
        fs::write(path, self.to_string(network)).map_err(|source| CodecError::Io {
            path: path.to_owned(),
            source,
        })?;
        info!(path = %path.display(), "saved network weights");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<PolicyNetwork, CodecError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                CodecError::Missing {
                    path: path.to_owned(),
                }
            } else {
                CodecError::Io {
                    path: path.to_owned(),
                    source,
                }
            }
        })?;
        let network = self
            .from_str(&raw)
            .map_err(|reason| CodecError::Malformed {
                path: path.to_owned(),
                reason,
            })?;
        info!(path = %path.display(), "loaded network weights");
        Ok(network)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::random::WyRng;
    use rand::{Rng, SeedableRng};
    use serde_json::json;

    const ARCH: Architecture = Architecture::new(4, 8, 1);

    #[test]
    fn test_file_layout() {
        let arch = Architecture::new(2, 3, 1);
        let flat = (0..arch.parameter_count())
            .map(|i| i as f64)
            .collect::<Vec<_>>();
        let net = PolicyNetwork::from_parameters(arch, &flat);
        let value: serde_json::Value =
            serde_json::from_str(&WeightCodec::new(arch).to_string(&net)).unwrap();

        assert_eq!(
            value,
            json!({
                "weights_input_hidden": [[0., 1., 2.], [3., 4., 5.]],
                "bias_hidden": [9., 10., 11.],
                "weights_hidden_output": [[6.], [7.], [8.]],
                "bias_output": [12.],
            })
        );
    }

    #[test]
    fn test_save_load_behavioral_equivalence() {
        let dir = tempfile::tempdir().unwrap();
        let codec = WeightCodec::new(ARCH);
        let mut rng = WyRng::seed_from_u64(30);

        for idx in 0..20 {
            let original = PolicyNetwork::random(ARCH, &mut rng);
            let path = dir.path().join(format!("brain-{idx}.json"));
            codec.save(&original, &path).unwrap();
            let loaded = codec.load(&path).unwrap();

            assert_eq!(
                original
                    .parameters()
                    .iter()
                    .map(|v| v.to_bits())
                    .collect::<Vec<_>>(),
                loaded
                    .parameters()
                    .iter()
                    .map(|v| v.to_bits())
                    .collect::<Vec<_>>()
            );
            for _ in 0..10 {
                let x = (0..ARCH.input_size)
                    .map(|_| rng.random_range(-1.0..1.0))
                    .collect::<Vec<f64>>();
                assert_eq!(
                    original.forward(&x)[0].to_bits(),
                    loaded.forward(&x)[0].to_bits()
                );
            }
        }
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = WeightCodec::new(ARCH)
            .load(dir.path().join("nope.json"))
            .unwrap_err();
        assert!(matches!(err, CodecError::Missing { .. }), "{err}");
    }

    #[test]
    fn test_load_wrong_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.json");
        let mut rng = WyRng::seed_from_u64(31);

        // saved under a different hidden size than the loader expects
        let small = Architecture::new(4, 6, 1);
        WeightCodec::new(small)
            .save(&PolicyNetwork::random(small, &mut rng), &path)
            .unwrap();
        let err = WeightCodec::new(ARCH).load(&path).unwrap_err();
        assert!(matches!(err, CodecError::Malformed { .. }), "{err}");
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        std::fs::write(&path, "{\"weights_input_hidden\": 3").unwrap();
        let err = WeightCodec::new(ARCH).load(&path).unwrap_err();
        match err {
            CodecError::Malformed { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected Malformed, got {other}"),
        }
    }

    #[test]
    fn test_from_str_rejects() {
        let codec = WeightCodec::new(Architecture::new(2, 2, 1));
        let cases = [
            // ragged matrix
            r#"{"weights_input_hidden": [[1, 2], [3]], "bias_hidden": [0, 0],
                "weights_hidden_output": [[1], [1]], "bias_output": [0]}"#,
            // bias too long
            r#"{"weights_input_hidden": [[1, 2], [3, 4]], "bias_hidden": [0, 0, 0],
                "weights_hidden_output": [[1], [1]], "bias_output": [0]}"#,
            // missing array
            r#"{"weights_input_hidden": [[1, 2], [3, 4]], "bias_hidden": [0, 0],
                "bias_output": [0]}"#,
            "not json at all",
        ];
        for raw in cases {
            assert!(codec.from_str(raw).is_err(), "accepted {raw}");
        }

        let ok = r#"{"weights_input_hidden": [[1, 2], [3, 4]], "bias_hidden": [0, 0],
                     "weights_hidden_output": [[1], [1]], "bias_output": [0]}"#;
        assert_eq!(
            codec.from_str(ok).unwrap().parameters(),
            vec![1., 2., 3., 4., 1., 1., 0., 0., 0.]
        );
    }
}
