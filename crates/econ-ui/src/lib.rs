//! Terminal UI layer for the unit-economics dashboard.
//!
//! Provides themes, the header, KPI, chart and filter components, the
//! customer table, the full dashboard view with its event loop built on
//! [`ratatui`], and the plain-text / JSON report renderer.

pub mod app;
pub mod components;
pub mod dashboard_view;
pub mod report;
pub mod table_view;
pub mod themes;

pub use econ_core as core;
