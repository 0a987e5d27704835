//! Core data models for the house price estimator

use serde::{Deserialize, Serialize};

/// How a property attribute is represented in the tabular record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Property attributes in training order
pub const PROPERTY_COLUMNS: [(&str, ColumnKind); 12] = [
    ("area", ColumnKind::Numeric),
    ("bedrooms", ColumnKind::Numeric),
    ("bathrooms", ColumnKind::Numeric),
    ("stories", ColumnKind::Numeric),
    ("parking", ColumnKind::Numeric),
    ("mainroad", ColumnKind::Categorical),
    ("guestroom", ColumnKind::Categorical),
    ("basement", ColumnKind::Categorical),
    ("hotwaterheating", ColumnKind::Categorical),
    ("airconditioning", ColumnKind::Categorical),
    ("prefarea", ColumnKind::Categorical),
    ("furnishingstatus", ColumnKind::Categorical),
];

/// Look up the kind of a property column by name
pub fn column_kind(name: &str) -> Option<ColumnKind> {
    PROPERTY_COLUMNS
        .iter()
        .find(|(column, _)| *column == name)
        .map(|(_, kind)| *kind)
}

/// One row of typed property attributes submitted for pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub area: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub stories: u32,
    pub parking: u32,
    pub mainroad: String,
    pub guestroom: String,
    pub basement: String,
    pub hotwaterheating: String,
    pub airconditioning: String,
    pub prefarea: String,
    pub furnishingstatus: String,
}

/// A single cell of the tabular record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Number(f64),
    Text(&'a str),
}

impl PropertyRecord {
    /// Columns as `(name, cell)` pairs, in the same order as [`PROPERTY_COLUMNS`]
    pub fn columns(&self) -> [(&'static str, Cell<'_>); 12] {
        [
            ("area", Cell::Number(self.area)),
            ("bedrooms", Cell::Number(f64::from(self.bedrooms))),
            ("bathrooms", Cell::Number(f64::from(self.bathrooms))),
            ("stories", Cell::Number(f64::from(self.stories))),
            ("parking", Cell::Number(f64::from(self.parking))),
            ("mainroad", Cell::Text(&self.mainroad)),
            ("guestroom", Cell::Text(&self.guestroom)),
            ("basement", Cell::Text(&self.basement)),
            ("hotwaterheating", Cell::Text(&self.hotwaterheating)),
            ("airconditioning", Cell::Text(&self.airconditioning)),
            ("prefarea", Cell::Text(&self.prefarea)),
            ("furnishingstatus", Cell::Text(&self.furnishingstatus)),
        ]
    }

    /// Look up a single column by name
    pub fn cell(&self, name: &str) -> Option<Cell<'_>> {
        self.columns()
            .into_iter()
            .find(|(column, _)| *column == name)
            .map(|(_, cell)| cell)
    }
}

/// Predicted price returned for a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Raw model output in currency units
    pub estimate: f64,
    /// Currency rendering, e.g. `₹ 5,333,333`
    pub formatted: String,
    pub model_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> PropertyRecord {
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

    #[test]
    fn test_columns_follow_training_order() {
        let record = sample_record();
        let names: Vec<&str> = record.columns().iter().map(|(name, _)| *name).collect();
        let expected: Vec<&str> = PROPERTY_COLUMNS.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_column_kinds_match_cells() {
        let record = sample_record();
        for (name, cell) in record.columns() {
            match (column_kind(name), cell) {
                (Some(ColumnKind::Numeric), Cell::Number(_)) => {}
                (Some(ColumnKind::Categorical), Cell::Text(_)) => {}
                other => panic!("column {} has mismatched kind {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_cell_lookup() {
        let record = sample_record();
        assert_eq!(record.cell("stories"), Some(Cell::Number(1.0)));
        assert_eq!(record.cell("furnishingstatus"), Some(Cell::Text("semi-furnished")));
        assert_eq!(record.cell("garden"), None);
        assert_eq!(column_kind("garden"), None);
    }
}
