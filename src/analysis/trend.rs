use crate::error::{AnalyzerError, Result};
use crate::models::DataPoint;

/// Parameters of a least-squares line fitted in log-price space.
/// `intercept` is the log price at t = 0; `exp(slope) - 1` is the implied
/// per-period growth rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogLinearFit {
    pub slope: f64,
    pub intercept: f64,
}

/// Fit an ordinary least-squares line to ln(price) against the integer
/// index 0..n-1. Requires at least 2 points, all strictly positive.
pub fn fit_log_linear(prices: &[DataPoint]) -> Result<LogLinearFit> {
    if prices.len() < 2 {
        return Err(AnalyzerError::InvalidInput(format!(
            "log-linear trend needs at least 2 points, got {}",
            prices.len()
        )));
    }
    ensure_positive(prices)?;

    let n = prices.len() as f64;
    let logs: Vec<f64> = prices.iter().map(|dp| dp.value.ln()).collect();

    // 1. Means of t and ln(p)
    let mean_t = (n - 1.0) / 2.0;
    let mean_y: f64 = logs.iter().sum::<f64>() / n;

    // 2. Slope = cov(t, y) / var(t)
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in logs.iter().enumerate() {
        let dt = i as f64 - mean_t;
        num += dt * (y - mean_y);
        den += dt * dt;
    }

    // den > 0 for n >= 2, but a constant series still deserves slope 0
    // exactly rather than noise from the division.
    let slope = if num == 0.0 { 0.0 } else { num / den };
    let intercept = mean_y - slope * mean_t;

    Ok(LogLinearFit { slope, intercept })
}

/// Log-linear (CAGR) reference trajectory: exp(intercept + slope * t) at
/// every input timestamp. Aligned 1:1 with the input; deterministic.
pub fn log_linear_trend(prices: &[DataPoint]) -> Result<Vec<DataPoint>> {
    let fit = fit_log_linear(prices)?;

    Ok(prices
        .iter()
        .enumerate()
        .map(|(i, dp)| DataPoint {
            timestamp: dp.timestamp,
            value: (fit.intercept + fit.slope * i as f64).exp(),
        })
        .collect())
}

/// Smoothed log trend: a local polynomial (Savitzky-Golay style) filter
/// over ln(price), exponentiated back to price space.
///
/// `window_days` is clamped to the largest odd length <= the series
/// length. Edge points fit the truncated window that actually exists, so
/// the output domain always equals the input domain. Windows holding
/// fewer than `polyorder + 1` points drop the fitted degree to
/// `window_len - 1`.
pub fn smoothed_log_trend(
    prices: &[DataPoint],
    window_days: usize,
    polyorder: usize,
) -> Result<Vec<DataPoint>> {
    if prices.is_empty() {
        return Err(AnalyzerError::InvalidInput(
            "smoothed trend needs a non-empty series".to_string(),
        ));
    }
    if polyorder >= window_days {
        return Err(AnalyzerError::InvalidInput(format!(
            "polyorder {} must be smaller than window {}",
            polyorder, window_days
        )));
    }
    if prices.len() < polyorder + 1 {
        return Err(AnalyzerError::InvalidInput(format!(
            "smoothed trend of order {} needs at least {} points, got {}",
            polyorder,
            polyorder + 1,
            prices.len()
        )));
    }
    ensure_positive(prices)?;

    let n = prices.len();
    let window = clamp_window(window_days, n);
    let half = window / 2;
    let logs: Vec<f64> = prices.iter().map(|dp| dp.value.ln()).collect();

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        // Truncated window at the edges: [i - half, i + half] clipped to
        // the series bounds.
        let lo = i.saturating_sub(half);
        let hi = usize::min(n - 1, i + half);
        let len = hi - lo + 1;
        let degree = usize::min(polyorder, len - 1);

        // Offsets are centered on i so the fitted value at the window
        // center is just the constant coefficient.
        let xs: Vec<f64> = (lo..=hi).map(|j| j as f64 - i as f64).collect();
        let coeffs = polyfit(&xs, &logs[lo..=hi], degree)?;

        out.push(DataPoint {
            timestamp: prices[i].timestamp,
            value: coeffs[0].exp(),
        });
    }

    Ok(out)
}

/// Largest odd window not exceeding the series length.
fn clamp_window(requested: usize, len: usize) -> usize {
    let mut window = usize::min(requested, len);
    if window % 2 == 0 {
        window -= 1;
    }
    usize::max(window, 1)
}

fn ensure_positive(prices: &[DataPoint]) -> Result<()> {
    for (i, dp) in prices.iter().enumerate() {
        if dp.value <= 0.0 {
            return Err(AnalyzerError::InvalidInput(format!(
                "price at index {} is {}; log trend requires positive prices",
                i, dp.value
            )));
        }
    }
    Ok(())
}

/// Least-squares polynomial fit of the given degree via the normal
/// equations, solved by Gaussian elimination with partial pivoting.
/// Coefficients are returned lowest order first.
fn polyfit(xs: &[f64], ys: &[f64], degree: usize) -> Result<Vec<f64>> {
    let m = degree + 1;

    // Power sums sum(x^k) for k = 0..2*degree fill the normal matrix.
    let mut power_sums = vec![0.0; 2 * degree + 1];
    for &x in xs {
        let mut p = 1.0;
        for sum in power_sums.iter_mut() {
            *sum += p;
            p *= x;
        }
    }

    let mut matrix = vec![vec![0.0; m]; m];
    for (r, row) in matrix.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = power_sums[r + c];
        }
    }

    let mut rhs = vec![0.0; m];
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        let mut p = 1.0;
        for cell in rhs.iter_mut() {
            *cell += y * p;
            p *= x;
        }
    }

    // Forward elimination with partial pivoting.
    for col in 0..m {
        let mut pivot = col;
        for row in (col + 1)..m {
            if matrix[row][col].abs() > matrix[pivot][col].abs() {
                pivot = row;
            }
        }
        if matrix[pivot][col].abs() < 1e-12 {
            return Err(AnalyzerError::InvalidInput(
                "degenerate smoothing window: normal equations are singular".to_string(),
            ));
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in (col + 1)..m {
            let factor = matrix[row][col] / matrix[col][col];
            for k in col..m {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    // Back substitution.
    let mut coeffs = vec![0.0; m];
    for row in (0..m).rev() {
        let mut acc = rhs[row];
        for k in (row + 1)..m {
            acc -= matrix[row][k] * coeffs[k];
        }
        coeffs[row] = acc / matrix[row][row];
    }

    Ok(coeffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(values: &[f64]) -> Vec<DataPoint> {
        let day0 = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| DataPoint {
                timestamp: (day0 + Duration::days(i as i64))
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    .and_utc(),
                value,
            })
            .collect()
    }

    #[test]
    fn test_constant_series_both_methods() {
        let prices = series(&[100.0; 30]);

        let linear = log_linear_trend(&prices).unwrap();
        let smoothed = smoothed_log_trend(&prices, 7, 2).unwrap();

        for dp in linear.iter().chain(smoothed.iter()) {
            assert!((dp.value - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_trend_at_origin_equals_intercept() {
        let prices = series(&[100.0, 105.0, 110.0, 115.0, 121.0]);

        let fit = fit_log_linear(&prices).unwrap();
        let trend = log_linear_trend(&prices).unwrap();

        assert_eq!(trend[0].value, fit.intercept.exp());
    }

    #[test]
    fn test_geometric_series_recovers_growth_rate() {
        // 2% per period: slope must be ln(1.02) exactly up to fp error.
        let values: Vec<f64> = (0..40).map(|i| 100.0 * 1.02_f64.powi(i)).collect();
        let fit = fit_log_linear(&series(&values)).unwrap();

        let implied_growth = fit.slope.exp() - 1.0;
        assert!((implied_growth - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_near_linear_growth_example() {
        let prices = series(&[100.0, 105.0, 110.0, 115.0, 121.0]);
        let trend = log_linear_trend(&prices).unwrap();

        for pair in trend.windows(2) {
            assert!(pair[1].value > pair[0].value);
        }
        let last = trend.last().unwrap().value;
        assert!((last - 121.0).abs() / 121.0 < 0.01);
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let prices = series(&[100.0, 0.0, 110.0]);
        assert!(log_linear_trend(&prices).is_err());
        assert!(smoothed_log_trend(&prices, 3, 1).is_err());

        let negative = series(&[100.0, -5.0, 110.0]);
        assert!(log_linear_trend(&negative).is_err());
    }

    #[test]
    fn test_too_few_points_rejected() {
        let prices = series(&[100.0]);
        assert!(log_linear_trend(&prices).is_err());
        // order 2 needs 3 points
        assert!(smoothed_log_trend(&series(&[100.0, 101.0]), 5, 2).is_err());
    }

    #[test]
    fn test_polyorder_must_be_below_window() {
        let prices = series(&[100.0; 10]);
        assert!(smoothed_log_trend(&prices, 5, 5).is_err());
    }

    #[test]
    fn test_smoothed_domain_matches_input_with_oversized_window() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let prices = series(&values);

        // window larger than the series gets clamped, nothing dropped
        let trend = smoothed_log_trend(&prices, 63, 2).unwrap();
        assert_eq!(trend.len(), prices.len());
        for (t, p) in trend.iter().zip(prices.iter()) {
            assert_eq!(t.timestamp, p.timestamp);
        }
    }

    #[test]
    fn test_smoothed_reproduces_quadratic_log_data() {
        // ln(p) quadratic in t is inside the order-2 model, so the filter
        // must reproduce it at every point including the edges.
        let values: Vec<f64> = (0..41)
            .map(|i| {
                let t = i as f64;
                (4.0 + 0.01 * t + 0.0002 * t * t).exp()
            })
            .collect();
        let prices = series(&values);

        let trend = smoothed_log_trend(&prices, 11, 2).unwrap();
        for (t, p) in trend.iter().zip(prices.iter()) {
            assert!((t.value - p.value).abs() / p.value < 1e-6);
        }
    }

    #[test]
    fn test_deterministic_output() {
        let prices = series(&[100.0, 103.0, 99.5, 107.2, 111.0, 108.4, 115.9]);

        let a = smoothed_log_trend(&prices, 5, 2).unwrap();
        let b = smoothed_log_trend(&prices, 5, 2).unwrap();
        assert_eq!(a, b);

        let c = log_linear_trend(&prices).unwrap();
        let d = log_linear_trend(&prices).unwrap();
        assert_eq!(c, d);
    }
}
