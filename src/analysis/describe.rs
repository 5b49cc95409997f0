// ============================================================
// Layer 5 — Descriptive Statistics
// ============================================================
// Column summaries in the style of a data-frame `describe()`:
//
//   count, mean, std, min, 1%, 5%, 50%, 95%, 99%, max
//
// Conventions:
//   - missing values are skipped (count is the non-missing count)
//   - std is the sample standard deviation (n - 1); NaN for n < 2
//   - percentiles interpolate linearly between closest ranks,
//     so the 50% of [1, 2, 3, 4] is 2.5
//   - an empty column reports count 0 and NaN everywhere else

/// Percentiles shown by inspections
pub const DESCRIBE_PERCENTILES: [f64; 5] = [0.01, 0.05, 0.5, 0.95, 0.99];

#[derive(Debug, Clone, PartialEq)]
pub struct Describe {
    pub count:       usize,
    pub mean:        f64,
    pub std:         f64,
    pub min:         f64,
    pub percentiles: Vec<(f64, f64)>,
    pub max:         f64,
}

impl Describe {
    /// Summarise the non-missing values
    pub fn of(values: impl IntoIterator<Item = Option<f64>>, percentiles: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().flatten().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean  = mean(&sorted);
        let std   = sample_std(&sorted, mean);

        Self {
            count,
            mean,
            std,
            min: sorted.first().copied().unwrap_or(f64::NAN),
            percentiles: percentiles
                .iter()
                .map(|&q| (q, quantile_sorted(&sorted, q)))
                .collect(),
            max: sorted.last().copied().unwrap_or(f64::NAN),
        }
    }

    /// Row labels in display order
    pub fn labels(&self) -> Vec<String> {
        let mut labels = vec!["count".to_string(), "mean".to_string(), "std".to_string(), "min".to_string()];
        labels.extend(self.percentiles.iter().map(|(q, _)| percentile_label(*q)));
        labels.push("max".to_string());
        labels
    }

    /// Values matching `labels()`
    pub fn values(&self) -> Vec<f64> {
        let mut values = vec![self.count as f64, self.mean, self.std, self.min];
        values.extend(self.percentiles.iter().map(|(_, v)| *v));
        values.push(self.max);
        values
    }
}

/// `0.05` → `5%`, `0.005` → `0.5%`
pub fn percentile_label(q: f64) -> String {
    let pct = q * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{}%", pct.round() as i64)
    } else {
        format!("{pct}%")
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Linear-interpolated quantile of already sorted values
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos  = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo   = pos.floor() as usize;
            let hi   = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Quantile of unsorted values (sorts a copy)
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        assert_eq!(quantile(&[4.0, 1.0, 3.0, 2.0], 0.5), 2.5);
        assert!((quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.9) - 4.6).abs() < 1e-12);
        assert_eq!(quantile(&[7.0], 0.99), 7.0);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_describe_skips_missing() {
        let d = Describe::of(vec![Some(1.0), None, Some(3.0)], &DESCRIBE_PERCENTILES);
        assert_eq!(d.count, 2);
        assert_eq!(d.mean, 2.0);
        assert!((d.std - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(d.min, 1.0);
        assert_eq!(d.max, 3.0);
        assert_eq!(d.percentiles[2], (0.5, 2.0));
    }

    #[test]
    fn test_describe_empty_column() {
        let d = Describe::of(vec![None, None], &DESCRIBE_PERCENTILES);
        assert_eq!(d.count, 0);
        assert!(d.mean.is_nan() && d.std.is_nan() && d.min.is_nan() && d.max.is_nan());
        assert_eq!(d.values().len(), d.labels().len());
    }

    #[test]
    fn test_percentile_labels() {
        assert_eq!(percentile_label(0.01), "1%");
        assert_eq!(percentile_label(0.5), "50%");
        assert_eq!(percentile_label(0.005), "0.5%");
    }
}
