use serde::Serialize;

/// Equal-width binned counts of a numeric column.
///
/// Bins span `[lower, upper]`; each bin is half-open except the last, which
/// also includes `upper` so the maximum value is always counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub lower: f64,
    pub upper: f64,
    pub bin_width: f64,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width buckets over their range.
    ///
    /// Returns `None` for an empty input or zero bins. When every value is
    /// the same the range is widened by half a unit on each side.
    pub fn from_values(values: &[f64], bins: usize) -> Option<Self> {
        if values.is_empty() || bins == 0 {
            return None;
        }

        let (mut lower, mut upper) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if upper <= lower {
            lower -= 0.5;
            upper += 0.5;
        }
        let bin_width = (upper - lower) / bins as f64;

        let mut counts = vec![0u64; bins];
        for &v in values {
            let idx = ((v - lower) / bin_width).floor() as usize;
            counts[idx.min(bins - 1)] += 1;
        }

        Some(Self {
            lower,
            upper,
            bin_width,
            counts,
        })
    }

    /// Sum of all bin counts; equals the number of input values.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `[start, end)` of bin `idx`.
    pub fn bin_range(&self, idx: usize) -> (f64, f64) {
        let start = self.lower + self.bin_width * idx as f64;
        (start, start + self.bin_width)
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_sum_to_input_len() {
        let values = [1.0, 2.0, 2.5, 3.0, 10.0, 7.25];
        let h = Histogram::from_values(&values, 50).unwrap();
        assert_eq!(h.total(), values.len() as u64);
        assert_eq!(h.bins(), 50);
    }

    #[test]
    fn test_max_lands_in_last_bin() {
        let h = Histogram::from_values(&[0.0, 5.0, 10.0], 10).unwrap();
        assert_eq!(h.counts[0], 1);
        assert_eq!(h.counts[5], 1);
        assert_eq!(h.counts[9], 1);
        assert_eq!(h.lower, 0.0);
        assert_eq!(h.upper, 10.0);
    }

    #[test]
    fn test_constant_values_widen_range() {
        let h = Histogram::from_values(&[40.0, 40.0, 40.0], 20).unwrap();
        assert_eq!(h.lower, 39.5);
        assert_eq!(h.upper, 40.5);
        assert_eq!(h.total(), 3);
        assert_eq!(h.counts.iter().filter(|&&c| c == 3).count(), 1);
    }

    #[test]
    fn test_empty_input_has_no_histogram() {
        assert!(Histogram::from_values(&[], 20).is_none());
        assert!(Histogram::from_values(&[1.0], 0).is_none());
    }

    #[test]
    fn test_bin_range() {
        let h = Histogram::from_values(&[0.0, 4.0], 4).unwrap();
        assert_eq!(h.bin_range(0), (0.0, 1.0));
        assert_eq!(h.bin_range(3), (3.0, 4.0));
    }
}
