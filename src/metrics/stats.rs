/// Arithmetic mean; 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); 0 below two samples.
#[must_use]
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let squares: f64 = values
        .iter()
        .map(|value| {
            let delta = value - avg;
            delta * delta
        })
        .sum();
    let degrees = values.len().saturating_sub(1) as f64;
    (squares / degrees).sqrt()
}
