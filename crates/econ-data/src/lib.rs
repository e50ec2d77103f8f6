//! Data layer for the unit-economics dashboard.
//!
//! Loads the customer and segment CSV files into an immutable
//! [`reader::DataContext`], runs the filter/aggregate pipeline over it and
//! writes CSV exports of the results.

pub mod aggregator;
pub mod export;
pub mod histogram;
pub mod pipeline;
pub mod reader;

pub use econ_core as core;
pub use pipeline::{run_pipeline, DashboardOutput};
pub use reader::DataContext;
