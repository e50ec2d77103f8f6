//! Event-driven dashboard state.
//!
//! The controller owns the current [`PipelineInputs`] and recomputes a fresh
//! [`DashboardOutput`] after every [`DashboardEvent`]. Nothing is cached
//! between events; the [`DataContext`] is only ever borrowed.

use std::path::Path;

use econ_core::error::Result;
use econ_core::models::Dimension;
use econ_core::selection::{DimensionFilter, PipelineInputs, SortColumn, SortOrder};
use econ_data::export;
use econ_data::pipeline::{filter_customers, run_pipeline, CustomerView, DashboardOutput};
use econ_data::reader::DataContext;

// ── Events ────────────────────────────────────────────────────────────────────

/// A single user action against the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    /// Flip one value of a dimension in or out of the selection.
    ToggleValue { dimension: Dimension, value: String },
    /// Drop the restriction on a dimension.
    SelectAll(Dimension),
    /// Select nothing on a dimension; no rows pass.
    SelectNone(Dimension),
    SetFilter(Dimension, DimensionFilter),
    ToggleChurnedOnly,
    SetChurnedOnly(bool),
    /// Advance to the next sort column, wrapping around.
    CycleSortColumn,
    SetSortColumn(Option<SortColumn>),
    ToggleSortOrder,
    SetSortOrder(SortOrder),
    /// Back to no filters and default display options.
    Reset,
}

// ── DashboardController ───────────────────────────────────────────────────────

pub struct DashboardController<'a> {
    context: &'a DataContext,
    inputs: PipelineInputs,
}

impl<'a> DashboardController<'a> {
    pub fn new(context: &'a DataContext, inputs: PipelineInputs) -> Self {
        Self { context, inputs }
    }

    pub fn context(&self) -> &'a DataContext {
        self.context
    }

    pub fn inputs(&self) -> &PipelineInputs {
        &self.inputs
    }

    /// Apply `event` and return the recomputed output.
    pub fn dispatch(&mut self, event: DashboardEvent) -> DashboardOutput {
        self.apply(event);
        self.output()
    }

    /// Update the inputs without recomputing.
    pub fn apply(&mut self, event: DashboardEvent) {
        tracing::debug!(?event, "dashboard event");
        match event {
            DashboardEvent::ToggleValue { dimension, value } => {
                let universe = self.context.distinct_values(dimension);
                let filter = self.inputs.filters.get_mut(dimension);
                filter.toggle(&value, universe);
                // A selection covering every known value is the same as no filter.
                let covers_all = matches!(
                    &*filter,
                    DimensionFilter::Only(set)
                        if set.len() == universe.len() && universe.iter().all(|v| set.contains(v))
                );
                if covers_all {
                    *filter = DimensionFilter::All;
                }
            }
            DashboardEvent::SelectAll(dimension) => {
                *self.inputs.filters.get_mut(dimension) = DimensionFilter::All;
            }
            DashboardEvent::SelectNone(dimension) => {
                *self.inputs.filters.get_mut(dimension) = DimensionFilter::none();
            }
            DashboardEvent::SetFilter(dimension, filter) => {
                *self.inputs.filters.get_mut(dimension) = filter;
            }
            DashboardEvent::ToggleChurnedOnly => {
                self.inputs.display.show_churned_only = !self.inputs.display.show_churned_only;
            }
            DashboardEvent::SetChurnedOnly(on) => {
                self.inputs.display.show_churned_only = on;
            }
            DashboardEvent::CycleSortColumn => {
                self.inputs.display.sort_column = Some(match self.inputs.display.sort_column {
                    Some(column) => column.next(),
                    None => SortColumn::ALL[0],
                });
            }
            DashboardEvent::SetSortColumn(column) => {
                self.inputs.display.sort_column = column;
            }
            DashboardEvent::ToggleSortOrder => {
                self.inputs.display.sort_order = self.inputs.display.sort_order.toggled();
            }
            DashboardEvent::SetSortOrder(order) => {
                self.inputs.display.sort_order = order;
            }
            DashboardEvent::Reset => {
                self.inputs = PipelineInputs::default();
            }
        }
    }

    /// Run the pipeline for the current inputs.
    pub fn output(&self) -> DashboardOutput {
        run_pipeline(self.context, &self.inputs)
    }

    /// Customers passing the current filters, in table order.
    pub fn filtered_view(&self) -> CustomerView<'a> {
        filter_customers(self.context.customers(), &self.inputs.filters)
    }

    /// Write the filtered customers to `path` as CSV.
    pub fn export_filtered(&self, path: &Path) -> Result<usize> {
        export::export_customers(&self.filtered_view(), path)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
