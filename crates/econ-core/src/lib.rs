//! Shared types for the unit economics dashboard.
//!
//! Row models for the two input tables, the filter/sort inputs of the
//! dashboard pipeline, error types, CLI settings and number formatting.

pub mod error;
pub mod formatting;
pub mod models;
pub mod selection;
pub mod settings;
