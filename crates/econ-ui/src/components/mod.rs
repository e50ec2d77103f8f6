//! Reusable dashboard widgets.

pub mod bar_chart;
pub mod charts;
pub mod filter_panel;
pub mod header;
pub mod indicators;
