//! Adverse drug reaction reporting with model-backed causality assessment.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod domain;
pub mod inference;
pub mod logging;
pub mod reports;
pub mod store;
