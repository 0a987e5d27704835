//! House price estimator server
//!
//! Serves the form-submission page, the reactive dashboard and a JSON
//! estimate endpoint over one shared prediction service, plus health and
//! Prometheus endpoints.

pub mod api;
pub mod config;
pub mod pages;
