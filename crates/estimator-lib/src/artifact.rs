//! Model artifact loading
//!
//! The artifact is a JSON pipeline manifest written by the offline training
//! exporter. It carries the training-time column schema and the fitted
//! regressor, either inline (tree ensembles, linear models) or as a
//! reference to an ONNX graph stored next to the manifest.
//!
//! Loading happens once at startup. The resulting [`Artifact`] is immutable
//! and is shared by `Arc` with the prediction service.

use crate::error::ArtifactError;
use crate::models::PropertyRecord;
use crate::predictor::{
    ColumnSpec, DecisionTree, LinearModel, OnnxRegressor, Pipeline, Preprocessor, RandomForest,
    Regressor,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk pipeline manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineManifest {
    pub name: String,
    pub version: String,
    pub columns: Vec<ColumnSpec>,
    pub regressor: RegressorSpec,
}

/// Serialized form of the fitted regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RegressorSpec {
    Forest {
        trees: Vec<DecisionTree>,
    },
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    Onnx {
        /// Relative paths resolve against the manifest's directory
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sha256: Option<String>,
    },
}

/// A loaded, validated prediction pipeline
#[derive(Debug)]
pub struct Artifact {
    name: String,
    version: String,
    fingerprint: String,
    preprocessor: Preprocessor,
    regressor: Regressor,
}

impl Artifact {
    /// Load and validate the manifest at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading model artifact");

        let bytes = read_file(path)?;
        let manifest: PipelineManifest = serde_json::from_slice(&bytes)
            .map_err(|e| ArtifactError::corrupt(path, format!("invalid manifest: {}", e)))?;

        let mut artifact = Self::from_manifest(manifest, path)?;
        artifact.fingerprint = sha256_hex(&bytes);

        debug!(
            path = %path.display(),
            name = %artifact.name,
            version = %artifact.version,
            regressor = artifact.regressor.kind(),
            features = artifact.preprocessor.width(),
            fingerprint = %artifact.fingerprint,
            "Model artifact loaded"
        );
        Ok(artifact)
    }

    /// Build an artifact from a manifest already parsed from `manifest_path`
    pub fn from_manifest(
        manifest: PipelineManifest,
        manifest_path: &Path,
    ) -> Result<Self, ArtifactError> {
        let corrupt = |e: anyhow::Error| ArtifactError::corrupt(manifest_path, format!("{:#}", e));
        let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

        let preprocessor = Preprocessor::new(manifest.columns).map_err(corrupt)?;
        let width = preprocessor.width();

        let regressor = match manifest.regressor {
            RegressorSpec::Forest { trees } => RandomForest::new(trees, width)
                .map(Regressor::Forest)
                .map_err(corrupt)?,
            RegressorSpec::Linear {
                coefficients,
                intercept,
            } => LinearModel::new(coefficients, intercept, width)
                .map(Regressor::Linear)
                .map_err(corrupt)?,
            RegressorSpec::Onnx { path, sha256 } => {
                let onnx_path = base_dir.join(path);
                let bytes = read_file(&onnx_path)?;
                if let Some(expected) = sha256 {
                    let actual = sha256_hex(&bytes);
                    if !actual.eq_ignore_ascii_case(expected.trim()) {
                        return Err(ArtifactError::corrupt(
                            &onnx_path,
                            format!("checksum mismatch: expected {}, got {}", expected, actual),
                        ));
                    }
                }
                OnnxRegressor::new(&bytes, width)
                    .map(Regressor::Onnx)
                    .map_err(|e| ArtifactError::corrupt(&onnx_path, format!("{:#}", e)))?
            }
        };

        Ok(Self {
            name: manifest.name,
            version: manifest.version,
            fingerprint: String::new(),
            preprocessor,
            regressor,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// SHA-256 of the manifest bytes, empty when built by [`Artifact::from_manifest`]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn regressor(&self) -> &Regressor {
        &self.regressor
    }
}

impl Pipeline for Artifact {
    fn predict(&self, rows: &[PropertyRecord]) -> Result<Vec<f64>> {
        rows.iter()
            .map(|row| {
                let features = self.preprocessor.transform(row)?;
                self.regressor.predict(&features)
            })
            .collect()
    }

    fn model_version(&self) -> &str {
        &self.version
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ArtifactError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ArtifactError::corrupt(path, format!("unreadable: {}", e)),
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const SAMPLE: &str = include_str!("../../../artifacts/house_price_forest.json");

    fn scenario_a() -> PropertyRecord {
        PropertyRecord {
            area: 5000.0,
            bedrooms: 3,
            bathrooms: 2,
            stories: 1,
            parking: 1,
            mainroad: "yes".to_string(),
            guestroom: "no".to_string(),
            basement: "no".to_string(),
            hotwaterheating: "no".to_string(),
            airconditioning: "yes".to_string(),
            prefarea: "no".to_string(),
            furnishingstatus: "semi-furnished".to_string(),
        }
    }

    fn write_temp(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_load_sample_artifact() {
        let file = write_temp(SAMPLE.as_bytes());
        let artifact = Artifact::load(file.path()).unwrap();

        assert_eq!(artifact.name(), "house_price_forest");
        assert_eq!(artifact.model_version(), "1.0.0");
        assert_eq!(artifact.regressor().kind(), "forest");
        assert_eq!(artifact.preprocessor().width(), 20);
        assert_eq!(artifact.fingerprint(), sha256_hex(SAMPLE.as_bytes()));
    }

    #[test]
    fn test_scenario_a_prediction() {
        let file = write_temp(SAMPLE.as_bytes());
        let artifact = Artifact::load(file.path()).unwrap();

        let values = artifact.predict(&[scenario_a()]).unwrap();
        assert_eq!(values.len(), 1);
        assert!((values[0] - 16_000_000.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = Artifact::load(dir.path().join("best_random_forest.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound { .. }));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let file = write_temp(b"\x80\x04\x95pickle bytes");
        let err = Artifact::load(file.path()).unwrap_err();
        match err {
            ArtifactError::Corrupt { path, reason } => {
                assert_eq!(path, file.path());
                assert!(reason.contains("invalid manifest"), "{}", reason);
            }
            other => panic!("expected corrupt, got {:?}", other),
        }
    }

    #[test]
    fn test_structural_error_reports_manifest_path() {
        let mut manifest: PipelineManifest = serde_json::from_str(SAMPLE).unwrap();
        manifest.regressor = RegressorSpec::Linear {
            coefficients: vec![1.0; 3],
            intercept: 0.0,
        };
        let file = write_temp(&serde_json::to_vec(&manifest).unwrap());

        match Artifact::load(file.path()).unwrap_err() {
            ArtifactError::Corrupt { path, reason } => {
                assert_eq!(path, file.path());
                assert!(reason.contains("expected 20"), "{}", reason);
            }
            other => panic!("expected corrupt, got {:?}", other),
        }
    }

    #[test]
    fn test_linear_artifact() {
        let mut manifest: PipelineManifest = serde_json::from_str(SAMPLE).unwrap();
        let mut coefficients = vec![0.0; 20];
        coefficients[0] = 1000.0;
        manifest.regressor = RegressorSpec::Linear {
            coefficients,
            intercept: 250_000.0,
        };

        let artifact = Artifact::from_manifest(manifest, Path::new("pipeline.json")).unwrap();
        assert_eq!(artifact.fingerprint(), "");
        let values = artifact.predict(&[scenario_a()]).unwrap();
        assert_eq!(values, vec![5_250_000.0]);
    }

    #[test]
    fn test_onnx_artifact_prediction() {
        let manifest_path = Path::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../artifacts/house_price_onnx.json"
        ));
        let manifest: PipelineManifest =
            serde_json::from_slice(&fs::read(manifest_path).unwrap()).unwrap();

        let artifact = Artifact::from_manifest(manifest, manifest_path).unwrap();
        assert_eq!(artifact.regressor().kind(), "onnx");
        assert_eq!(artifact.model_version(), "1.1.0");

        let values = artifact.predict(&[scenario_a()]).unwrap();
        assert_eq!(values, vec![7_850_000.0]);

        let loaded = Artifact::load(manifest_path).unwrap();
        assert_eq!(loaded.predict(&[scenario_a()]).unwrap(), values);
    }

    #[test]
    fn test_onnx_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut manifest: PipelineManifest = serde_json::from_str(SAMPLE).unwrap();
        manifest.regressor = RegressorSpec::Onnx {
            path: PathBuf::from("regressor.onnx"),
            sha256: None,
        };

        match Artifact::from_manifest(manifest, &dir.path().join("pipeline.json")).unwrap_err() {
            ArtifactError::NotFound { path } => assert_eq!(path, dir.path().join("regressor.onnx")),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[test]
    fn test_onnx_checksum_mismatch() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("regressor.onnx"), b"onnx bytes").unwrap();

        let mut manifest: PipelineManifest = serde_json::from_str(SAMPLE).unwrap();
        manifest.regressor = RegressorSpec::Onnx {
            path: PathBuf::from("regressor.onnx"),
            sha256: Some("00".repeat(32)),
        };

        match Artifact::from_manifest(manifest, &dir.path().join("pipeline.json")).unwrap_err() {
            ArtifactError::Corrupt { reason, .. } => assert!(reason.contains("checksum mismatch")),
            other => panic!("expected corrupt, got {:?}", other),
        }
    }

    #[test]
    fn test_onnx_unparseable_graph_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let bytes = b"not an onnx graph";
        fs::write(dir.path().join("regressor.onnx"), bytes).unwrap();

        let mut manifest: PipelineManifest = serde_json::from_str(SAMPLE).unwrap();
        manifest.regressor = RegressorSpec::Onnx {
            path: PathBuf::from("regressor.onnx"),
            sha256: Some(sha256_hex(bytes)),
        };

        match Artifact::from_manifest(manifest, &dir.path().join("pipeline.json")).unwrap_err() {
            ArtifactError::Corrupt { path, .. } => assert_eq!(path, dir.path().join("regressor.onnx")),
            other => panic!("expected corrupt, got {:?}", other),
        }
    }
}
