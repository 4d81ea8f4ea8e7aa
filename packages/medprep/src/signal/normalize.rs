use crate::error::{PrepError, Result};

/// Linearly rescale `data` so its minimum maps to -1 and its maximum to +1.
///
/// Constant (zero-range), empty and non-finite inputs are rejected instead of
/// producing NaN.
pub fn normalize(data: &[f64]) -> Result<Vec<f64>> {
    if let Some(pos) = data.iter().position(|x| !x.is_finite()) {
        return Err(PrepError::DegenerateInput(format!(
            "Sample {} is {}; normalization needs finite samples",
            pos, data[pos]
        )));
    }

    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if data.is_empty() {
        return Err(PrepError::DegenerateInput(
            "Cannot normalize an empty signal".to_string(),
        ));
    }
    let range = max - min;
    if !(range > 0.0) || !range.is_finite() {
        return Err(PrepError::DegenerateInput(format!(
            "Signal range is {} (min {}, max {}); normalization needs a positive finite range",
            range, min, max
        )));
    }

    Ok(data.iter().map(|&x| 2.0 * (x - min) / range - 1.0).collect())
}
