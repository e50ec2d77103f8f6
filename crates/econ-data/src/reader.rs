//! CSV loading for the customer and segment tables.
//!
//! Both files are read once into an immutable [`DataContext`]. Every accepted
//! row keeps its original [`StringRecord`] next to the parsed model so exports
//! can reproduce the input layout exactly.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{debug, info, warn};

use econ_core::error::{EconError, Result};
use econ_core::models::{columns, CustomerRow, Dimension, SegmentKey, SegmentRow};

// ── Header lookup ─────────────────────────────────────────────────────────────

/// Column name → field index, built from a header record.
struct HeaderMap {
    index: HashMap<String, usize>,
    source: PathBuf,
}

impl HeaderMap {
    fn new(headers: &StringRecord, source: &Path) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();
        Self {
            index,
            source: source.to_path_buf(),
        }
    }

    fn require(&self, column: &str) -> Result<usize> {
        self.index
            .get(column)
            .copied()
            .ok_or_else(|| EconError::MissingColumn {
                column: column.to_string(),
                path: self.source.clone(),
            })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }
}

/// Field indices of the four dimension columns.
struct KeyColumns {
    industry: usize,
    company_size: usize,
    plan_name: usize,
    billing_frequency: usize,
}

impl KeyColumns {
    fn resolve(map: &HeaderMap) -> Result<Self> {
        Ok(Self {
            industry: map.require(columns::INDUSTRY)?,
            company_size: map.require(columns::COMPANY_SIZE)?,
            plan_name: map.require(columns::PLAN_NAME)?,
            billing_frequency: map.require(columns::BILLING_FREQUENCY)?,
        })
    }

    fn read(&self, record: &StringRecord) -> SegmentKey {
        SegmentKey {
            industry: field(record, self.industry).to_string(),
            company_size: field(record, self.company_size).to_string(),
            plan_name: field(record, self.plan_name).to_string(),
            billing_frequency: field(record, self.billing_frequency).to_string(),
        }
    }
}

// ── Field parsing ─────────────────────────────────────────────────────────────

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("").trim()
}

/// Tokens treated as a missing value, in addition to the empty string.
const MISSING_TOKENS: [&str; 6] = ["na", "n/a", "nan", "null", "none", "-"];

fn is_missing(raw: &str) -> bool {
    raw.is_empty() || MISSING_TOKENS.contains(&raw.to_ascii_lowercase().as_str())
}

fn invalid(column: &str, raw: &str) -> EconError {
    EconError::InvalidValue {
        field: column.to_string(),
        value: raw.to_string(),
    }
}

/// A required, finite real.
fn parse_metric(raw: &str, column: &str) -> Result<f64> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(invalid(column, raw)),
    }
}

/// An optional real; missing tokens and non-finite values become `None`.
fn parse_optional_metric(raw: &str, column: &str) -> Result<Option<f64>> {
    if is_missing(raw) {
        return Ok(None);
    }
    let v = raw.parse::<f64>().map_err(|_| invalid(column, raw))?;
    Ok(v.is_finite().then_some(v))
}

/// `0`/`1` indicator, also accepting `0.0`/`1.0` and `true`/`false`.
fn parse_flag(raw: &str, column: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" => return Ok(true),
        "false" | "no" => return Ok(false),
        _ => {}
    }
    match raw.parse::<f64>() {
        Ok(v) if v == 1.0 => Ok(true),
        Ok(v) if v == 0.0 => Ok(false),
        _ => Err(invalid(column, raw)),
    }
}

/// Non-negative integer count; integral floats such as `12.0` are accepted.
fn parse_count(raw: &str, column: &str) -> Result<u64> {
    if let Ok(n) = raw.parse::<u64>() {
        return Ok(n);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(v as u64),
        _ => Err(invalid(column, raw)),
    }
}

/// Calendar date; any time-of-day component is discarded.
fn parse_date(raw: &str, column: &str) -> Result<Option<NaiveDate>> {
    if is_missing(raw) {
        return Ok(None);
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(d));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(Some(dt.date()));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.date_naive()));
    }
    Err(invalid(column, raw))
}

/// Iterate data records, skipping malformed ones.
///
/// Record-level CSV errors (wrong field count, bad UTF-8) and rows rejected by
/// `parse` are logged and counted; I/O errors abort the load.
fn read_records<R, T, F>(
    reader: &mut csv::Reader<R>,
    source: &Path,
    mut parse: F,
) -> Result<(Vec<(T, StringRecord)>, usize)>
where
    R: Read,
    F: FnMut(&StringRecord) -> Result<T>,
{
    let mut accepted = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                warn!("Skipping malformed record in {}: {}", source.display(), e);
                skipped += 1;
                continue;
            }
        };
        match parse(&record) {
            Ok(row) => accepted.push((row, record)),
            Err(e) => {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                warn!("Skipping {} line {}: {}", source.display(), line, e);
                skipped += 1;
            }
        }
    }

    Ok((accepted, skipped))
}

fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().has_headers(true).from_reader(input)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| EconError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

// ── CustomerTable ─────────────────────────────────────────────────────────────

/// A parsed customer before missing engagement values are filled.
struct CustomerDraft {
    row: CustomerRow,
    customer_health_score: Option<f64>,
    avg_sentiment_score: Option<f64>,
    active_days: Option<f64>,
    usage_events: Option<f64>,
    usage_score: Option<f64>,
}

/// Immutable customer-level table.
#[derive(Debug, Clone)]
pub struct CustomerTable {
    headers: StringRecord,
    rows: Vec<CustomerRow>,
    records: Vec<StringRecord>,
    numeric_ids: bool,
    skipped_rows: usize,
}

impl CustomerTable {
    /// Read and fill a customer table from any CSV source.
    ///
    /// `source` is only used in error and log messages.
    pub fn from_reader<R: Read>(input: R, source: &Path) -> Result<Self> {
        let mut reader = csv_reader(input);
        let headers = reader.headers()?.clone();
        let map = HeaderMap::new(&headers, source);

        let id_col = map.require(columns::CUSTOMER_ID)?;
        let keys = KeyColumns::resolve(&map)?;
        let ltv = map.require(columns::LTV)?;
        let cac = map.require(columns::CAC)?;
        let ratio = map.require(columns::LTV_CAC_RATIO)?;
        let payback = map.require(columns::CAC_PAYBACK_MONTHS)?;
        let revenue = map.require(columns::MONTHLY_REVENUE)?;
        let churned = map.require(columns::CHURNED)?;
        // Engagement columns and the date may be absent; absent reads as missing.
        let health = map.optional(columns::CUSTOMER_HEALTH_SCORE);
        let sentiment = map.optional(columns::AVG_SENTIMENT_SCORE);
        let active_days = map.optional(columns::ACTIVE_DAYS);
        let usage_events = map.optional(columns::USAGE_EVENTS);
        let usage_score = map.optional(columns::USAGE_SCORE);
        let latest_end = map.optional(columns::LATEST_END);

        let optional = |record: &StringRecord, idx: Option<usize>, column: &str| match idx {
            Some(i) => parse_optional_metric(field(record, i), column),
            None => Ok(None),
        };

        let (drafts, skipped_rows) = read_records(&mut reader, source, |record| {
            let customer_id = field(record, id_col);
            if customer_id.is_empty() {
                return Err(invalid(columns::CUSTOMER_ID, customer_id));
            }
            Ok(CustomerDraft {
                row: CustomerRow {
                    customer_id: customer_id.to_string(),
                    segment: keys.read(record),
                    ltv: parse_metric(field(record, ltv), columns::LTV)?,
                    cac: parse_metric(field(record, cac), columns::CAC)?,
                    ltv_cac_ratio: parse_metric(field(record, ratio), columns::LTV_CAC_RATIO)?,
                    cac_payback_months: parse_metric(
                        field(record, payback),
                        columns::CAC_PAYBACK_MONTHS,
                    )?,
                    monthly_revenue: parse_metric(
                        field(record, revenue),
                        columns::MONTHLY_REVENUE,
                    )?,
                    customer_health_score: 0.0,
                    avg_sentiment_score: 0.0,
                    active_days: 0.0,
                    usage_events: 0.0,
                    usage_score: 0.0,
                    churned: parse_flag(field(record, churned), columns::CHURNED)?,
                    latest_end: match latest_end {
                        Some(i) => parse_date(field(record, i), columns::LATEST_END)?,
                        None => None,
                    },
                },
                customer_health_score: optional(record, health, columns::CUSTOMER_HEALTH_SCORE)?,
                avg_sentiment_score: optional(record, sentiment, columns::AVG_SENTIMENT_SCORE)?,
                active_days: optional(record, active_days, columns::ACTIVE_DAYS)?,
                usage_events: optional(record, usage_events, columns::USAGE_EVENTS)?,
                usage_score: optional(record, usage_score, columns::USAGE_SCORE)?,
            })
        })?;

        let (drafts, records): (Vec<CustomerDraft>, Vec<StringRecord>) = drafts.into_iter().unzip();
        let rows = fill_missing_engagement(drafts);
        let numeric_ids = !rows.is_empty()
            && rows.iter().all(|r| r.customer_id.parse::<i64>().is_ok());

        Ok(Self {
            headers,
            rows,
            records,
            numeric_ids,
            skipped_rows,
        })
    }

    /// Read a customer table from a file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let table = Self::from_reader(open(path)?, path)?;
        info!(
            "Loaded {} customers from {} ({} rows skipped)",
            table.len(),
            path.display(),
            table.skipped_rows
        );
        Ok(table)
    }

    pub fn rows(&self) -> &[CustomerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header record exactly as read.
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Original field text of row `idx`.
    pub fn record(&self, idx: usize) -> Option<&StringRecord> {
        self.records.get(idx)
    }

    /// `true` when every `customer_id` is an integer, so ids sort numerically.
    pub fn numeric_ids(&self) -> bool {
        self.numeric_ids
    }

    /// Rows rejected while loading.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

/// Replace missing engagement values.
///
/// Health and sentiment scores take the mean of the observed values over the
/// whole table (zero when nothing was observed); activity counts take zero.
fn fill_missing_engagement(drafts: Vec<CustomerDraft>) -> Vec<CustomerRow> {
    let health_mean = column_mean(drafts.iter().filter_map(|d| d.customer_health_score));
    let sentiment_mean = column_mean(drafts.iter().filter_map(|d| d.avg_sentiment_score));

    let filled = drafts
        .iter()
        .filter(|d| {
            d.customer_health_score.is_none()
                || d.avg_sentiment_score.is_none()
                || d.active_days.is_none()
                || d.usage_events.is_none()
                || d.usage_score.is_none()
        })
        .count();
    if filled > 0 {
        debug!("Filled missing engagement values on {} customers", filled);
    }

    drafts
        .into_iter()
        .map(|d| CustomerRow {
            customer_health_score: d.customer_health_score.unwrap_or(health_mean),
            avg_sentiment_score: d.avg_sentiment_score.unwrap_or(sentiment_mean),
            active_days: d.active_days.unwrap_or(0.0),
            usage_events: d.usage_events.unwrap_or(0.0),
            usage_score: d.usage_score.unwrap_or(0.0),
            ..d.row
        })
        .collect()
}

fn column_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

// ── SegmentTable ──────────────────────────────────────────────────────────────

/// Immutable segment-level table.
#[derive(Debug, Clone)]
pub struct SegmentTable {
    headers: StringRecord,
    rows: Vec<SegmentRow>,
    records: Vec<StringRecord>,
    skipped_rows: usize,
}

impl SegmentTable {
    /// Read a segment table from any CSV source.
    pub fn from_reader<R: Read>(input: R, source: &Path) -> Result<Self> {
        let mut reader = csv_reader(input);
        let headers = reader.headers()?.clone();
        let map = HeaderMap::new(&headers, source);

        let keys = KeyColumns::resolve(&map)?;
        let ltv_cac = map.require(columns::AVG_LTV_CAC)?;
        let payback = map.require(columns::AVG_PAYBACK_MONTHS)?;
        let count = map.require(columns::CUSTOMER_COUNT)?;

        let (parsed, skipped_rows) = read_records(&mut reader, source, |record| {
            Ok(SegmentRow {
                segment: keys.read(record),
                avg_ltv_cac: parse_metric(field(record, ltv_cac), columns::AVG_LTV_CAC)?,
                avg_payback_months: parse_metric(
                    field(record, payback),
                    columns::AVG_PAYBACK_MONTHS,
                )?,
                customer_count: parse_count(field(record, count), columns::CUSTOMER_COUNT)?,
            })
        })?;
        let (rows, records) = parsed.into_iter().unzip();

        Ok(Self {
            headers,
            rows,
            records,
            skipped_rows,
        })
    }

    /// Read a segment table from a file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let table = Self::from_reader(open(path)?, path)?;
        info!(
            "Loaded {} segments from {} ({} rows skipped)",
            table.len(),
            path.display(),
            table.skipped_rows
        );
        Ok(table)
    }

    pub fn rows(&self) -> &[SegmentRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn records(&self) -> &[StringRecord] {
        &self.records
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

// ── DataContext ───────────────────────────────────────────────────────────────

/// Both base tables plus the distinct dimension values derived from them.
///
/// Constructed once at startup and shared by reference; never mutated.
#[derive(Debug, Clone)]
pub struct DataContext {
    customers: CustomerTable,
    segments: SegmentTable,
    distinct: HashMap<Dimension, Vec<String>>,
    segment_order: HashMap<Dimension, Vec<String>>,
}

impl DataContext {
    pub fn new(customers: CustomerTable, segments: SegmentTable) -> Self {
        let mut distinct = HashMap::new();
        let mut segment_order = HashMap::new();
        for dimension in Dimension::ALL {
            let from_segments = first_seen(segments.rows().iter().map(|r| r.segment.get(dimension)));
            let all = first_seen(
                customers
                    .rows()
                    .iter()
                    .map(|r| r.segment.get(dimension))
                    .chain(from_segments.iter().map(String::as_str)),
            );
            distinct.insert(dimension, all);
            segment_order.insert(dimension, from_segments);
        }
        Self {
            customers,
            segments,
            distinct,
            segment_order,
        }
    }

    /// Load both tables. Either file missing is an error.
    pub fn load(customers_path: &Path, segments_path: &Path) -> Result<Self> {
        let customers = CustomerTable::load(customers_path)?;
        let segments = SegmentTable::load(segments_path)?;
        Ok(Self::new(customers, segments))
    }

    pub fn customers(&self) -> &CustomerTable {
        &self.customers
    }

    pub fn segments(&self) -> &SegmentTable {
        &self.segments
    }

    /// Every value of `dimension` present in either table, customers first,
    /// in first-encountered order. Selecting all of them equals no filter.
    pub fn distinct_values(&self, dimension: Dimension) -> &[String] {
        self.distinct.get(&dimension).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Values of `dimension` in first-encountered order of the segment table.
    pub fn segment_key_order(&self, dimension: Dimension) -> &[String] {
        self.segment_order
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn first_seen<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
