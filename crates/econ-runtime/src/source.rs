//! Input file discovery and loading.
//!
//! [`DataSource`] resolves the two CSV files against the configured data
//! directory, falling back to its `data/` subdirectory, and loads them into a
//! [`DataContext`].

use std::path::{Path, PathBuf};

use econ_core::error::Result;
use econ_core::settings::Settings;
use econ_data::reader::DataContext;

/// Subdirectory probed when a file is not found directly in the data dir.
pub const FALLBACK_SUBDIR: &str = "data";

/// Where the customer and segment files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub data_dir: PathBuf,
    pub customers_file: String,
    pub segments_file: String,
}

impl DataSource {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        customers_file: impl Into<String>,
        segments_file: impl Into<String>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            customers_file: customers_file.into(),
            segments_file: segments_file.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.data_dir.clone(),
            settings.customers_file.clone(),
            settings.segments_file.clone(),
        )
    }

    pub fn customers_path(&self) -> PathBuf {
        locate(&self.data_dir, &self.customers_file)
    }

    pub fn segments_path(&self) -> PathBuf {
        locate(&self.data_dir, &self.segments_file)
    }

    /// Load both tables. A missing file is reported under its primary path.
    pub fn load(&self) -> Result<DataContext> {
        let customers = self.customers_path();
        let segments = self.segments_path();
        tracing::debug!(
            customers = %customers.display(),
            segments = %segments.display(),
            "loading data files"
        );
        DataContext::load(&customers, &segments)
    }
}

/// `dir/name` if it exists, else `dir/data/name` if that exists, else
/// `dir/name`.
pub fn locate(dir: &Path, name: &str) -> PathBuf {
    let primary = dir.join(name);
    if primary.is_file() {
        return primary;
    }
    let fallback = dir.join(FALLBACK_SUBDIR).join(name);
    if fallback.is_file() {
        tracing::debug!(path = %fallback.display(), "using fallback data path");
        return fallback;
    }
    primary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use econ_core::error::EconError;

    const CUSTOMERS: &str = "\
customer_id,industry,company_size,plan_name,billing_frequency,LTV,CAC,LTV_CAC_Ratio,CAC_Payback_Months,Monthly_Revenue,Churned
1,Fintech,SMB,Pro,monthly,3000,1000,3.0,10,100,0
";
    const SEGMENTS: &str = "\
industry,company_size,plan_name,billing_frequency,Avg_LTV_CAC,Avg_Payback_Months,Customer_Count
Fintech,SMB,Pro,monthly,3.0,10,1
";

    fn source(dir: &Path) -> DataSource {
        DataSource::new(dir, "unit_economics.csv", "unit_economics_by_segment.csv")
    }

    #[test]
    fn test_locate_prefers_primary() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("a.csv"), "x").unwrap();
        fs::write(dir.path().join("data").join("a.csv"), "y").unwrap();
        assert_eq!(locate(dir.path(), "a.csv"), dir.path().join("a.csv"));
    }

    #[test]
    fn test_locate_falls_back_to_data_subdir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data").join("a.csv"), "y").unwrap();
        assert_eq!(
            locate(dir.path(), "a.csv"),
            dir.path().join("data").join("a.csv")
        );
    }

    #[test]
    fn test_locate_missing_reports_primary() {
        let dir = TempDir::new().unwrap();
        assert_eq!(locate(dir.path(), "a.csv"), dir.path().join("a.csv"));
    }

    #[test]
    fn test_load_from_data_subdir() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        fs::create_dir(&data).unwrap();
        fs::write(data.join("unit_economics.csv"), CUSTOMERS).unwrap();
        fs::write(data.join("unit_economics_by_segment.csv"), SEGMENTS).unwrap();

        let ctx = source(dir.path()).load().expect("load");
        assert_eq!(ctx.customers().len(), 1);
        assert_eq!(ctx.segments().len(), 1);
    }

    #[test]
    fn test_load_missing_segments_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("unit_economics.csv"), CUSTOMERS).unwrap();
        let err = source(dir.path()).load().unwrap_err();
        assert!(matches!(err, EconError::FileRead { .. }));
        assert!(err.to_string().contains("unit_economics_by_segment.csv"));
    }

    #[test]
    fn test_from_settings() {
        let dir = TempDir::new().unwrap();
        let args = ["unit-economics", "--data-dir", "/srv/econ", "--customers-file", "c.csv"]
            .iter()
            .map(std::ffi::OsString::from)
            .collect();
        let settings = Settings::load_with_last_used_impl(args, &dir.path().join("last_used.json"));
        let src = DataSource::from_settings(&settings);
        assert_eq!(src.data_dir, PathBuf::from("/srv/econ"));
        assert_eq!(src.customers_file, "c.csv");
        assert_eq!(src.segments_file, "unit_economics_by_segment.csv");
    }
}
