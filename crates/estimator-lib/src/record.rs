//! Input record building
//!
//! Converts the string-valued fields collected by a presentation adapter
//! into a typed [`PropertyRecord`]. Numeric fields are parsed and range
//! checked here; categorical fields pass through untouched and are checked
//! against the artifact's vocabulary during preprocessing.

use crate::error::{ValidationError, ValidationReason};
use crate::models::PropertyRecord;
use std::collections::HashMap;

/// Field name to raw textual value, as submitted by an adapter
pub type RawFields = HashMap<String, String>;

/// Build a record from raw fields, failing on the first invalid field
pub fn build(raw: &RawFields) -> Result<PropertyRecord, ValidationError> {
    Ok(PropertyRecord {
        area: parse_area(raw)?,
        bedrooms: parse_count(raw, "bedrooms", 1)?,
        bathrooms: parse_count(raw, "bathrooms", 1)?,
        stories: parse_count(raw, "stories", 1)?,
        parking: parse_count(raw, "parking", 0)?,
        mainroad: text(raw, "mainroad")?,
        guestroom: text(raw, "guestroom")?,
        basement: text(raw, "basement")?,
        hotwaterheating: text(raw, "hotwaterheating")?,
        airconditioning: text(raw, "airconditioning")?,
        prefarea: text(raw, "prefarea")?,
        furnishingstatus: text(raw, "furnishingstatus")?,
    })
}

fn field<'a>(raw: &'a RawFields, name: &'static str) -> Result<&'a str, ValidationError> {
    raw.get(name)
        .map(|value| value.trim())
        .ok_or_else(|| ValidationError::new(name, ValidationReason::Missing))
}

fn text(raw: &RawFields, name: &'static str) -> Result<String, ValidationError> {
    field(raw, name).map(str::to_string)
}

fn parse_area(raw: &RawFields) -> Result<f64, ValidationError> {
    let value = field(raw, "area")?;
    let area: f64 = value
        .parse()
        .map_err(|_| ValidationError::new("area", ValidationReason::NotANumber(value.to_string())))?;

    if !area.is_finite() || area <= 0.0 {
        return Err(ValidationError::new(
            "area",
            ValidationReason::OutOfRange("a positive number of square feet"),
        ));
    }
    Ok(area)
}

fn parse_count(raw: &RawFields, name: &'static str, min: u32) -> Result<u32, ValidationError> {
    let range = if min == 0 { "zero or more" } else { "at least 1" };
    let value = field(raw, name)?;
    let invalid = |reason| ValidationError::new(name, reason);

    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    // Anything that is not a plain run of digits is rejected by its shape
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        let reason = if value.parse::<f64>().is_ok() {
            ValidationReason::NotAnInteger(value.to_string())
        } else {
            ValidationReason::NotANumber(value.to_string())
        };
        return Err(invalid(reason));
    }

    let is_zero = digits.bytes().all(|b| b == b'0');
    if negative && !is_zero {
        return Err(invalid(ValidationReason::OutOfRange(range)));
    }

    let count: u32 = digits
        .parse()
        .map_err(|_| invalid(ValidationReason::OutOfRange("at most 4294967295")))?;

    if count < min {
        return Err(invalid(ValidationReason::OutOfRange(range)));
    }
    Ok(count)
}
