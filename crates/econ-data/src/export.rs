//! CSV export of the filtered customer view and the segment table.
//!
//! Exports reuse the header and field text captured at load time, so the
//! output has the same columns and values as the input files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use econ_core::error::{EconError, Result};

use crate::pipeline::CustomerView;
use crate::reader::SegmentTable;

/// Default file name for the dashboard's filtered-customer export.
pub const FILTERED_CUSTOMERS_FILE: &str = "filtered_unit_economics.csv";

/// Write the rows of `view` in table order. Returns the number of data rows.
pub fn write_customers<W: Write>(view: &CustomerView<'_>, writer: W) -> Result<usize> {
    let table = view.table();
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(table.headers())?;
    let mut written = 0;
    for &idx in view.indices() {
        if let Some(record) = table.record(idx) {
            out.write_record(record)?;
            written += 1;
        }
    }
    out.flush()?;
    Ok(written)
}

/// Write the whole segment table. Returns the number of data rows.
pub fn write_segments<W: Write>(table: &SegmentTable, writer: W) -> Result<usize> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(table.headers())?;
    for record in table.records() {
        out.write_record(record)?;
    }
    out.flush()?;
    Ok(table.records().len())
}

pub fn export_customers(view: &CustomerView<'_>, path: &Path) -> Result<usize> {
    let written = write_customers(view, create(path)?)?;
    info!("Exported {} customers to {}", written, path.display());
    Ok(written)
}

pub fn export_segments(table: &SegmentTable, path: &Path) -> Result<usize> {
    let written = write_segments(table, create(path)?)?;
    info!("Exported {} segments to {}", written, path.display());
    Ok(written)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| EconError::Export {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use econ_core::models::Dimension;
    use econ_core::selection::{DimensionFilter, FilterSelection};

    use crate::pipeline::filter_customers;
    use crate::reader::tests::{sample_context, CUSTOMERS_CSV, SEGMENTS_CSV};

    #[test]
    fn test_unfiltered_export_reproduces_input() {
        let ctx = sample_context();
        let view = filter_customers(ctx.customers(), &FilterSelection::default());
        let mut buf = Vec::new();
        let n = write_customers(&view, &mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(String::from_utf8(buf).unwrap(), CUSTOMERS_CSV);
    }

    #[test]
    fn test_filtered_export_keeps_header_and_raw_values() {
        let ctx = sample_context();
        let filters = FilterSelection::default()
            .with(Dimension::Industry, DimensionFilter::only(["Retail"]));
        let view = filter_customers(ctx.customers(), &filters);
        let mut buf = Vec::new();
        write_customers(&view, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CUSTOMERS_CSV.lines().next().unwrap());
        // The missing health score stays empty rather than the filled mean.
        assert_eq!(
            lines[1],
            "2,Retail,Enterprise,Basic,annual,1000,1000,1.0,24,50,,0.1,,,,1,2024-01-31"
        );
        assert!(lines[2].starts_with("5,Retail,SMB"));
    }

    #[test]
    fn test_empty_view_writes_header_only() {
        let ctx = sample_context();
        let filters =
            FilterSelection::default().with(Dimension::PlanName, DimensionFilter::none());
        let view = filter_customers(ctx.customers(), &filters);
        let mut buf = Vec::new();
        assert_eq!(write_customers(&view, &mut buf).unwrap(), 0);
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_export_segments_to_file() {
        let ctx = sample_context();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("segments_out.csv");
        assert_eq!(export_segments(ctx.segments(), &path).unwrap(), 5);
        assert_eq!(fs::read_to_string(&path).unwrap(), SEGMENTS_CSV);
    }

    #[test]
    fn test_export_to_missing_directory_is_export_error() {
        let ctx = sample_context();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no_such_dir").join(FILTERED_CUSTOMERS_FILE);
        let view = filter_customers(ctx.customers(), &FilterSelection::default());
        let err = export_customers(&view, &path).unwrap_err();
        assert!(matches!(err, EconError::Export { .. }));
    }
}
