//! Batch statistics behind the deal score.

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let scale = max_abs(values);
    if scale == 0.0 || !scale.is_finite() {
        return Some(values.iter().sum::<f64>() / values.len() as f64);
    }
    // Sum in units of the largest magnitude so prices near f64::MAX cannot overflow.
    Some(values.iter().map(|v| v / scale).sum::<f64>() / values.len() as f64 * scale)
}

/// Sample standard deviation (n - 1 denominator). `None` below two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let scale = max_abs(values);
    if scale == 0.0 {
        return Some(0.0);
    }
    let scaled: Vec<f64> = values.iter().map(|v| v / scale).collect();
    let m = mean(&scaled)?;
    let variance = scaled.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    Some(variance.sqrt() * scale)
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
}

/// Mean and standard deviation of one batch, as used for scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchStats {
    pub mean: f64,
    /// `None` when the spread is undefined or zero: every z-score is then 0.
    pub std_dev: Option<f64>,
}

impl BatchStats {
    pub fn from_prices(prices: &[f64]) -> Option<Self> {
        let mean = mean(prices)?;
        // Identical prices can still leave a rounding residue in the mean.
        let uniform = prices.iter().all(|p| *p == prices[0]);
        let std_dev = sample_std_dev(prices).filter(|sd| !uniform && sd.is_finite() && *sd > 0.0);
        Some(Self { mean, std_dev })
    }

    pub fn z_score(&self, price: f64) -> f64 {
        match self.std_dev {
            // Divide first: the raw difference can overflow near f64::MAX.
            Some(sd) => price / sd - self.mean / sd,
            None => 0.0,
        }
    }
}
