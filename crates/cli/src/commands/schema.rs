//! Schema command

use anyhow::Result;
use colored::Colorize;
use estimator_lib::predictor::{ColumnEncoding, ColumnSpec, Regressor};
use estimator_lib::Artifact;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::output::{print_json, print_table, OutputFormat};

/// Row for the columns table
#[derive(Tabled)]
struct ColumnRow {
    #[tabled(rename = "Column")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Features")]
    features: usize,
    #[tabled(rename = "Encoding")]
    encoding: String,
}

impl From<&ColumnSpec> for ColumnRow {
    fn from(column: &ColumnSpec) -> Self {
        let (kind, encoding) = match &column.encoding {
            ColumnEncoding::Numeric { scale: None } => ("numeric", "passthrough".to_string()),
            ColumnEncoding::Numeric { scale: Some(s) } => (
                "numeric",
                format!("standard (mean {}, std {})", s.mean, s.std),
            ),
            ColumnEncoding::Categorical { categories } => {
                ("categorical", format!("one-hot [{}]", categories.join(", ")))
            }
        };
        Self {
            name: column.name.clone(),
            kind,
            features: column.encoding.width(),
            encoding,
        }
    }
}

#[derive(Serialize)]
struct SchemaView<'a> {
    name: &'a str,
    version: &'a str,
    fingerprint: &'a str,
    regressor: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    trees: Option<usize>,
    width: usize,
    columns: &'a [ColumnSpec],
}

/// Print the training-time schema of an artifact
pub fn show_schema(path: &Path, format: OutputFormat) -> Result<()> {
    let artifact = Artifact::load(path)?;
    let preprocessor = artifact.preprocessor();

    let view = SchemaView {
        name: artifact.name(),
        version: artifact.version(),
        fingerprint: artifact.fingerprint(),
        regressor: artifact.regressor().kind(),
        trees: match artifact.regressor() {
            Regressor::Forest(forest) => Some(forest.n_estimators()),
            _ => None,
        },
        width: preprocessor.width(),
        columns: preprocessor.columns(),
    };

    match format {
        OutputFormat::Json => print_json(&view)?,
        OutputFormat::Table => {
            println!("{}", "Pipeline Artifact".bold());
            println!("{}", "=".repeat(50));
            println!("Name:                   {}", view.name.cyan());
            println!("Version:                {}", view.version);
            println!("Regressor:              {}", view.regressor);
            if let Some(trees) = view.trees {
                println!("Trees:                  {}", trees);
            }
            println!("Feature width:          {}", view.width);
            println!("Fingerprint:            {}", view.fingerprint.dimmed());
            println!();

            let rows: Vec<ColumnRow> = view.columns.iter().map(ColumnRow::from).collect();
            print_table(&rows);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use estimator_lib::predictor::Scale;

    #[test]
    fn test_column_rows_describe_encoding() {
        let scaled = ColumnSpec {
            name: "area".into(),
            encoding: ColumnEncoding::Numeric {
                scale: Some(Scale {
                    mean: 5150.5,
                    std: 2170.1,
                }),
            },
        };
        let row = ColumnRow::from(&scaled);
        assert_eq!(row.kind, "numeric");
        assert_eq!(row.features, 1);
        assert!(row.encoding.starts_with("standard"));

        let furnishing = ColumnSpec {
            name: "furnishingstatus".into(),
            encoding: ColumnEncoding::Categorical {
                categories: vec![
                    "furnished".into(),
                    "semi-furnished".into(),
                    "unfurnished".into(),
                ],
            },
        };
        let row = ColumnRow::from(&furnishing);
        assert_eq!(row.features, 3);
        assert_eq!(
            row.encoding,
            "one-hot [furnished, semi-furnished, unfurnished]"
        );
    }
}
