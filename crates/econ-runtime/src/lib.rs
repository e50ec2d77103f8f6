//! Runtime layer for the unit-economics dashboard.
//!
//! Locates and loads the input files and drives the pipeline from user
//! events.

pub mod controller;
pub mod source;

pub use econ_core as core;
pub use econ_data as data;
