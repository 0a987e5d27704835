//! Regression pipeline: feature preprocessing plus trained regressor

mod features;
mod forest;
mod inference;
mod output;

pub use features::{ColumnEncoding, ColumnSpec, Preprocessor, Scale};
pub use forest::{DecisionTree, LinearModel, Node, RandomForest};
pub use inference::{OnnxRegressor, Regressor};
pub use output::{group_thousands, CurrencyFormatter, DEFAULT_CURRENCY_SYMBOL};

use crate::models::PropertyRecord;
use anyhow::Result;

/// A fitted prediction pipeline
pub trait Pipeline: Send + Sync {
    /// Predict one value per input row
    fn predict(&self, rows: &[PropertyRecord]) -> Result<Vec<f64>>;

    /// Version string of the fitted pipeline
    fn model_version(&self) -> &str;
}
