//! Regressor dispatch and ONNX inference using tract
//!
//! Tree ensembles and linear models are evaluated natively. Regressors the
//! exporter could only emit as ONNX graphs are loaded via tract-onnx and run
//! on a `[1, width]` f32 tensor.

use super::forest::{LinearModel, RandomForest};
use anyhow::{Context, Result};
use tract_onnx::prelude::*;
use tracing::debug;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based regressor using tract for lightweight inference
pub struct OnnxRegressor {
    model: TractModel,
    width: usize,
}

impl std::fmt::Debug for OnnxRegressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxRegressor")
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

impl OnnxRegressor {
    /// Create a regressor from ONNX model bytes taking `width` input features
    pub fn new(model_bytes: &[u8], width: usize) -> Result<Self> {
        let model = Self::load_model(model_bytes, width)?;
        Ok(Self { model, width })
    }

    /// Load and optimize an ONNX model from bytes
    fn load_model(model_bytes: &[u8], width: usize) -> Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, width]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    /// Convert encoded features to tensor input
    fn features_to_tensor(&self, features: &[f64]) -> Result<Tensor> {
        let data: Vec<f32> = features.iter().map(|&x| x as f32).collect();
        let array = tract_ndarray::Array2::from_shape_vec((1, self.width), data)
            .with_context(|| {
                format!(
                    "X has {} features, but the regressor is expecting {} features as input",
                    features.len(),
                    self.width
                )
            })?;
        Ok(array.into())
    }

    pub fn predict(&self, features: &[f64]) -> Result<f64> {
        let input = self.features_to_tensor(features)?;
        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;

        let values = output.to_array_view::<f32>()?;
        let value = values.iter().next().copied().context("Model output is empty")?;
        Ok(f64::from(value))
    }
}

/// The trained regressor behind a pipeline
#[derive(Debug)]
pub enum Regressor {
    Forest(RandomForest),
    Linear(LinearModel),
    Onnx(OnnxRegressor),
}

impl Regressor {
    pub fn kind(&self) -> &'static str {
        match self {
            Regressor::Forest(_) => "forest",
            Regressor::Linear(_) => "linear",
            Regressor::Onnx(_) => "onnx",
        }
    }

    pub fn predict(&self, features: &[f64]) -> Result<f64> {
        let value = match self {
            Regressor::Forest(forest) => forest.predict(features),
            Regressor::Linear(linear) => linear.predict(features),
            Regressor::Onnx(onnx) => onnx.predict(features)?,
        };
        debug!(regressor = self.kind(), value, "Regressor evaluated");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::forest::{DecisionTree, Node};

    #[test]
    fn test_invalid_onnx_bytes_rejected() {
        let err = OnnxRegressor::new(b"definitely not a protobuf", 20).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse ONNX model"));
    }

    const LINEAR_ONNX: &[u8] = include_bytes!("../../../../artifacts/house_price_linear.onnx");

    /// Scenario A after one-hot encoding
    fn scenario_a_features() -> Vec<f64> {
        let mut features = vec![0.0; 20];
        features[..5].copy_from_slice(&[5000.0, 3.0, 2.0, 1.0, 1.0]);
        for idx in [6, 7, 9, 11, 14, 15, 18] {
            features[idx] = 1.0;
        }
        features
    }

    #[test]
    fn test_onnx_regressor_runs_graph() {
        let onnx = OnnxRegressor::new(LINEAR_ONNX, 20).unwrap();
        assert_eq!(onnx.predict(&scenario_a_features()).unwrap(), 7_850_000.0);

        // Intercept only
        assert_eq!(onnx.predict(&[0.0; 20]).unwrap(), 250_000.0);
    }

    #[test]
    fn test_onnx_matches_native_linear_model() {
        let coefficients = vec![
            1000.0, 100_000.0, 500_000.0, 250_000.0, 200_000.0, 0.0, 300_000.0, 0.0, 150_000.0,
            0.0, 200_000.0, 0.0, 250_000.0, 0.0, 400_000.0, 0.0, 350_000.0, 300_000.0, 150_000.0,
            0.0,
        ];
        let native = Regressor::Linear(LinearModel::new(coefficients, 250_000.0, 20).unwrap());
        let onnx = Regressor::Onnx(OnnxRegressor::new(LINEAR_ONNX, 20).unwrap());

        let mut features = scenario_a_features();
        features[0] = 7420.0;
        features[17] = 1.0;
        features[18] = 0.0;
        assert_eq!(onnx.kind(), "onnx");
        assert_eq!(onnx.predict(&features).unwrap(), native.predict(&features).unwrap());
    }

    #[test]
    fn test_onnx_rejects_wrong_feature_count() {
        let onnx = OnnxRegressor::new(LINEAR_ONNX, 20).unwrap();
        let err = onnx.predict(&[1.0; 19]).unwrap_err();
        assert!(format!("{:#}", err).contains("X has 19 features"));
    }

    #[test]
    fn test_native_dispatch() {
        let forest = RandomForest::new(
            vec![DecisionTree {
                nodes: vec![Node::Leaf { value: 42.0 }],
            }],
            1,
        )
        .unwrap();
        let regressor = Regressor::Forest(forest);
        assert_eq!(regressor.kind(), "forest");
        assert_eq!(regressor.predict(&[0.0]).unwrap(), 42.0);

        let linear = Regressor::Linear(LinearModel::new(vec![0.5], 1.0, 1).unwrap());
        assert_eq!(linear.kind(), "linear");
        assert_eq!(linear.predict(&[4.0]).unwrap(), 3.0);
    }
}
