//! Estimate command

use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use estimator_lib::{Artifact, Estimate, Estimator, PredictionService, RawFields};
use std::path::Path;
use std::sync::Arc;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{print_info, print_json, print_success, print_table, OutputFormat};

/// Property attributes, passed through as raw text like the web widgets
#[derive(Args, Debug, Clone)]
pub struct PropertyArgs {
    /// Area in square feet
    #[arg(long, default_value = "5000")]
    pub area: String,

    /// Number of bedrooms
    #[arg(long, default_value = "3")]
    pub bedrooms: String,

    /// Number of bathrooms
    #[arg(long, default_value = "2")]
    pub bathrooms: String,

    /// Number of stories
    #[arg(long, default_value = "1")]
    pub stories: String,

    /// Parking spaces
    #[arg(long, default_value = "1")]
    pub parking: String,

    /// Main road access (yes/no)
    #[arg(long, default_value = "yes")]
    pub mainroad: String,

    /// Guest room (yes/no)
    #[arg(long, default_value = "yes")]
    pub guestroom: String,

    /// Basement (yes/no)
    #[arg(long, default_value = "yes")]
    pub basement: String,

    /// Hot water heating (yes/no)
    #[arg(long, default_value = "yes")]
    pub hotwaterheating: String,

    /// Air conditioning (yes/no)
    #[arg(long, default_value = "yes")]
    pub airconditioning: String,

    /// Preferred area (yes/no)
    #[arg(long, default_value = "yes")]
    pub prefarea: String,

    /// Furnishing status (furnished, semi-furnished, unfurnished)
    #[arg(long, default_value = "furnished")]
    pub furnishingstatus: String,
}

impl PropertyArgs {
    fn pairs(&self) -> [(&'static str, &str); 12] {
        [
            ("area", &self.area),
            ("bedrooms", &self.bedrooms),
            ("bathrooms", &self.bathrooms),
            ("stories", &self.stories),
            ("parking", &self.parking),
            ("mainroad", &self.mainroad),
            ("guestroom", &self.guestroom),
            ("basement", &self.basement),
            ("hotwaterheating", &self.hotwaterheating),
            ("airconditioning", &self.airconditioning),
            ("prefarea", &self.prefarea),
            ("furnishingstatus", &self.furnishingstatus),
        ]
    }

    pub fn to_raw_fields(&self) -> RawFields {
        self.pairs()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }
}

/// Row for the submitted attributes table
#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Attribute")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn render(property: &PropertyArgs, estimate: &Estimate, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(estimate)?,
        OutputFormat::Table => {
            let rows: Vec<FieldRow> = property
                .pairs()
                .into_iter()
                .map(|(name, value)| FieldRow {
                    name,
                    value: value.to_string(),
                })
                .collect();
            print_table(&rows);
            println!();
            print_success(&format!(
                "Estimated Price: {}",
                estimate.formatted.green().bold()
            ));
            print_info(&format!("Model version {}", estimate.model_version));
        }
    }
    Ok(())
}

/// Run the pipeline in-process
pub fn estimate_local(artifact: &Path, property: &PropertyArgs, format: OutputFormat) -> Result<()> {
    let artifact = Artifact::load(artifact)?;
    let service = PredictionService::new(Arc::new(artifact));

    let estimate = service
        .estimate_fields(&property.to_raw_fields())
        .map_err(|e| anyhow!(e.user_message()))?;

    render(property, &estimate, format)
}

/// Ask a running server for the estimate
pub async fn estimate_remote(
    client: &ApiClient,
    property: &PropertyArgs,
    format: OutputFormat,
) -> Result<()> {
    let estimate = client.estimate(&property.to_raw_fields()).await?;
    render(property, &estimate, format)
}
