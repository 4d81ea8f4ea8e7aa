//! ECG feature extraction: R-peak detection, RR intervals, heart rate,
//! interval statistics and spectral band powers.

use crate::error::{PrepError, Result};
use crate::signal::spectrum::{fft_frequencies, magnitude_spectrum};
use crate::types::FeatureRecord;

/// Minimum spacing between R-peaks in seconds (a 100 bpm ceiling)
pub const MIN_PEAK_SPACING_SECONDS: f64 = 0.6;

/// Spectral bands summed by [`frequency_features`], as (name, low, high] in Hz
pub const FREQUENCY_BANDS: [(&str, f64, f64); 3] = [
    ("power_vlf", 0.003, 0.04),
    ("power_lf", 0.04, 0.15),
    ("power_hf", 0.15, 0.5),
];

/// Indices of local maxima at least `min_distance` samples apart.
///
/// Flat tops resolve to their middle sample. When two maxima are closer than
/// the minimum distance the higher one is kept.
pub fn find_peaks(signal: &[f64], min_distance: f64) -> Vec<usize> {
    let peaks = local_maxima(signal);
    let distance = min_distance.ceil().max(1.0) as usize;
    if distance <= 1 || peaks.len() < 2 {
        return peaks;
    }

    // Visit peaks from highest to lowest, suppressing close neighbours
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| signal[peaks[a]].total_cmp(&signal[peaks[b]]));

    let mut keep = vec![true; peaks.len()];
    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .into_iter()
        .zip(keep)
        .filter_map(|(p, kept)| kept.then_some(p))
        .collect()
}

fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let n = signal.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }

    let mut i = 1;
    while i < n - 1 {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead < n - 1 && signal[ahead] == signal[i] {
                ahead += 1;
            }
            if signal[ahead] < signal[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Detect R-peaks in an ECG trace sampled at `fs` Hz.
///
/// Returns an empty list when fewer than two peaks are found, since a
/// single peak carries no interval information.
pub fn detect_r_peaks(signal: &[f64], fs: f64) -> Result<Vec<usize>> {
    validate_fs(fs)?;
    let peaks = find_peaks(signal, fs * MIN_PEAK_SPACING_SECONDS);
    log::debug!("Detected {} R-peaks in {} samples", peaks.len(), signal.len());
    if peaks.len() < 2 {
        return Ok(Vec::new());
    }
    Ok(peaks)
}

/// RR intervals in seconds between consecutive peaks.
pub fn intervals_from_peaks(peaks: &[usize], fs: f64) -> Result<Vec<f64>> {
    validate_fs(fs)?;
    if peaks.len() < 2 {
        return Err(PrepError::InsufficientData(format!(
            "Need at least 2 peaks to compute intervals, found {}",
            peaks.len()
        )));
    }
    Ok(peaks
        .windows(2)
        .map(|w| (w[1] as f64 - w[0] as f64) / fs)
        .collect())
}

/// Detect R-peaks and return the RR intervals in seconds.
pub fn extract_rr_intervals(signal: &[f64], fs: f64) -> Result<Vec<f64>> {
    let peaks = detect_r_peaks(signal, fs)?;
    intervals_from_peaks(&peaks, fs)
}

/// Heart rate in beats per minute from RR intervals.
pub fn heart_rate(rr_intervals: &[f64]) -> Result<f64> {
    let mean_rr = mean(rr_intervals)?;
    if !(mean_rr > 0.0) {
        return Err(PrepError::InsufficientData(format!(
            "Mean RR interval is {}; heart rate is undefined",
            mean_rr
        )));
    }
    Ok(60.0 / mean_rr)
}

/// Descriptive statistics of the RR intervals.
pub fn statistical_features(rr_intervals: &[f64]) -> Result<FeatureRecord> {
    let mean_rr = mean(rr_intervals)?;
    let variance = rr_intervals
        .iter()
        .map(|x| (x - mean_rr).powi(2))
        .sum::<f64>()
        / rr_intervals.len() as f64;
    let min_rr = rr_intervals.iter().copied().fold(f64::INFINITY, f64::min);
    let max_rr = rr_intervals
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    let mut features = FeatureRecord::new();
    features.insert("mean_rr", mean_rr);
    features.insert("std_rr", variance.sqrt());
    features.insert("min_rr", min_rr);
    features.insert("max_rr", max_rr);
    features.insert("range_rr", max_rr - min_rr);
    Ok(features)
}

/// Sum of DFT magnitudes of `signal` within each band of [`FREQUENCY_BANDS`].
pub fn frequency_features(signal: &[f64], fs: f64) -> Result<FeatureRecord> {
    validate_fs(fs)?;
    if signal.is_empty() {
        return Err(PrepError::InsufficientData(
            "Cannot compute a spectrum of an empty signal".to_string(),
        ));
    }

    let freqs = fft_frequencies(signal.len(), 1.0 / fs);
    let magnitudes = magnitude_spectrum(signal);

    let mut features = FeatureRecord::new();
    for (name, low, high) in FREQUENCY_BANDS {
        let power: f64 = freqs
            .iter()
            .zip(&magnitudes)
            .filter(|(&f, _)| f > low && f <= high)
            .map(|(_, &m)| m)
            .sum();
        features.insert(name, power);
    }
    Ok(features)
}

/// All features for one ECG segment: heart rate, beat count, RR statistics
/// and spectral band powers.
pub fn extract_features(signal: &[f64], fs: f64) -> Result<FeatureRecord> {
    let peaks = detect_r_peaks(signal, fs)?;
    let rr = intervals_from_peaks(&peaks, fs)?;

    let mut features = FeatureRecord::new();
    features.insert("beat_count", peaks.len() as f64);
    features.insert("heart_rate_bpm", heart_rate(&rr)?);
    features.extend(statistical_features(&rr)?);
    features.extend(frequency_features(signal, fs)?);

    log::info!(
        "Extracted {} features from {} beats",
        features.len(),
        peaks.len()
    );
    Ok(features)
}

fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(PrepError::InsufficientData(
            "RR interval sequence is empty".to_string(),
        ));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

fn validate_fs(fs: f64) -> Result<()> {
    if fs > 0.0 && fs.is_finite() {
        Ok(())
    } else {
        Err(PrepError::InvalidParameter(format!(
            "Sampling frequency must be positive, got {} Hz",
            fs
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(period_samples: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * i as f64 / period_samples).sin())
            .collect()
    }

    #[test]
    fn test_sine_peaks_match_period() {
        let fs = 250.0;
        let period_seconds = 0.8;
        let signal = sine(fs * period_seconds, 2500);
        let peaks = detect_r_peaks(&signal, fs).unwrap();
        assert!(peaks.len() >= 10);
        for w in peaks.windows(2) {
            let spacing = (w[1] - w[0]) as f64;
            assert!((spacing - fs * period_seconds).abs() <= 1.0);
        }

        let rr = intervals_from_peaks(&peaks, fs).unwrap();
        let bpm = heart_rate(&rr).unwrap();
        assert!((bpm - 60.0 / period_seconds).abs() < 0.5, "bpm {}", bpm);
    }

    #[test]
    fn test_distance_keeps_higher_peak() {
        // Peaks at 2 (height 1) and 5 (height 3), distance 4
        let signal = [0.0, 0.5, 1.0, 0.5, 0.0, 3.0, 0.0, 0.0, 0.0, 2.0, 0.0];
        assert_eq!(find_peaks(&signal, 1.0), vec![2, 5, 9]);
        assert_eq!(find_peaks(&signal, 4.0), vec![5, 9]);
    }

    #[test]
    fn test_plateau_resolves_to_middle() {
        let signal = [0.0, 1.0, 2.0, 2.0, 2.0, 1.0, 0.0];
        assert_eq!(find_peaks(&signal, 1.0), vec![3]);
        // A plateau running into the edge is not a peak
        assert!(find_peaks(&[0.0, 1.0, 1.0], 1.0).is_empty());
    }

    #[test]
    fn test_single_peak_is_insufficient() {
        let signal = [0.0, 1.0, 0.0, 0.0, 0.0];
        assert!(detect_r_peaks(&signal, 100.0).unwrap().is_empty());
        assert!(matches!(
            extract_rr_intervals(&signal, 100.0),
            Err(PrepError::InsufficientData(_))
        ));
        assert!(matches!(heart_rate(&[]), Err(PrepError::InsufficientData(_))));
        assert!(matches!(
            statistical_features(&[]),
            Err(PrepError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_statistical_features() {
        let rr = [0.8, 1.0, 0.9, 1.1];
        let features = statistical_features(&rr).unwrap();
        assert!((features.get("mean_rr").unwrap() - 0.95).abs() < 1e-12);
        let expected_std = (0.0125f64).sqrt();
        assert!((features.get("std_rr").unwrap() - expected_std).abs() < 1e-12);
        assert_eq!(features.get("min_rr"), Some(0.8));
        assert_eq!(features.get("max_rr"), Some(1.1));
        assert!((features.get("range_rr").unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_frequency_features_bands() {
        // 0.1 Hz tone at 4 Hz sampling over 100 s lands in the LF band
        let fs = 4.0;
        let n = 400;
        let signal: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 0.1 * i as f64 / fs).sin())
            .collect();
        let features = frequency_features(&signal, fs).unwrap();
        let lf = features.get("power_lf").unwrap();
        assert!((lf - n as f64 / 2.0).abs() < 1e-6);
        assert!(features.get("power_vlf").unwrap() < 1e-6);
        assert!(features.get("power_hf").unwrap() < 1e-6);
    }

    #[test]
    fn test_frequency_features_rejects_empty() {
        assert!(matches!(
            frequency_features(&[], 100.0),
            Err(PrepError::InsufficientData(_))
        ));
        assert!(matches!(
            frequency_features(&[1.0], 0.0),
            Err(PrepError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_extract_features_contains_all_names() {
        let fs = 200.0;
        let signal = sine(fs, 4000);
        let features = extract_features(&signal, fs).unwrap();
        for name in [
            "beat_count",
            "heart_rate_bpm",
            "mean_rr",
            "std_rr",
            "min_rr",
            "max_rr",
            "range_rr",
            "power_vlf",
            "power_lf",
            "power_hf",
        ] {
            assert!(features.get(name).is_some(), "missing {}", name);
        }
        assert!((features.get("heart_rate_bpm").unwrap() - 60.0).abs() < 0.5);
    }
}
