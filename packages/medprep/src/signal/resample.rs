use rustfft::num_complex::Complex;

use super::spectrum::{fft_real, ifft_unnormalized};
use crate::error::{PrepError, Result};

/// Number of samples a signal of `len` samples has after resampling.
pub fn resampled_length(len: usize, original_fs: f64, target_fs: f64) -> usize {
    (len as f64 * target_fs / original_fs).round() as usize
}

/// Resample `data` from `original_fs` to `target_fs` with FFT (bandlimited)
/// interpolation.
///
/// The input is returned unchanged when the rates match or the original rate
/// is unknown.
pub fn resample(data: &[f64], original_fs: Option<f64>, target_fs: f64) -> Result<Vec<f64>> {
    let original_fs = match original_fs {
        Some(fs) if fs != target_fs => fs,
        _ => return Ok(data.to_vec()),
    };
    if !(original_fs > 0.0) || !(target_fs > 0.0) {
        return Err(PrepError::InvalidParameter(format!(
            "Sampling frequencies must be positive (original {} Hz, target {} Hz)",
            original_fs, target_fs
        )));
    }

    let num = resampled_length(data.len(), original_fs, target_fs);
    log::debug!(
        "Resampling {} samples at {} Hz to {} samples at {} Hz",
        data.len(),
        original_fs,
        num,
        target_fs
    );
    Ok(fourier_resample(data, num))
}

/// Resample to exactly `num` samples by truncating or zero-padding the
/// spectrum. An even-length Nyquist bin is split or merged so the result of
/// a real input stays real.
pub fn fourier_resample(data: &[f64], num: usize) -> Vec<f64> {
    let nx = data.len();
    if nx == 0 || num == 0 {
        return Vec::new();
    }

    let x = fft_real(data);
    let mut y = vec![Complex::new(0.0, 0.0); num];

    let n = num.min(nx);
    let nyq = n / 2 + 1;
    y[..nyq.min(num)].copy_from_slice(&x[..nyq.min(num)]);
    if n > 2 {
        let tail = n - nyq;
        y[num - tail..].copy_from_slice(&x[nx - tail..]);
    }

    if n % 2 == 0 {
        if num < nx {
            y[num - n / 2] += x[nx - n / 2];
        } else if nx < num {
            y[n / 2] *= 0.5;
            y[num - n / 2] = y[n / 2];
        }
    }

    ifft_unnormalized(&mut y);
    let scale = 1.0 / nx as f64;
    y.iter().map(|c| c.re * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_output_length_matches_ratio() {
        let data: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.01).sin()).collect();
        for (orig, target) in [(360.0, 250.0), (250.0, 360.0), (500.0, 128.0), (128.0, 1000.0)] {
            let out = resample(&data, Some(orig), target).unwrap();
            assert_eq!(out.len(), resampled_length(data.len(), orig, target));
            assert_eq!(
                out.len(),
                (data.len() as f64 * target / orig).round() as usize
            );
        }
    }

    #[test]
    fn test_identity_when_rates_match_or_unknown() {
        let data = vec![1.0, -2.0, 3.5, 0.25];
        assert_eq!(resample(&data, Some(360.0), 360.0).unwrap(), data);
        assert_eq!(resample(&data, None, 125.0).unwrap(), data);
    }

    #[test]
    fn test_upsample_preserves_bandlimited_tone() {
        let n = 200;
        let fs = 100.0;
        let data: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 5.0 * i as f64 / fs).sin())
            .collect();
        let out = resample(&data, Some(fs), 200.0).unwrap();
        assert_eq!(out.len(), 400);
        for (i, v) in out.iter().enumerate() {
            let expected = (2.0 * PI * 5.0 * i as f64 / 200.0).sin();
            assert!((v - expected).abs() < 1e-9, "sample {} off: {} vs {}", i, v, expected);
        }
    }

    #[test]
    fn test_downsample_preserves_bandlimited_tone() {
        let n = 400;
        let data: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 5.0 * i as f64 / 200.0).cos())
            .collect();
        let out = resample(&data, Some(200.0), 100.0).unwrap();
        assert_eq!(out.len(), 200);
        for (i, v) in out.iter().enumerate() {
            let expected = (2.0 * PI * 5.0 * i as f64 / 100.0).cos();
            assert!((v - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_invalid_rates_rejected() {
        assert!(matches!(
            resample(&[1.0, 2.0], Some(-5.0), 100.0),
            Err(PrepError::InvalidParameter(_))
        ));
        assert!(matches!(
            resample(&[1.0, 2.0], Some(100.0), 0.0),
            Err(PrepError::InvalidParameter(_))
        ));
    }
}
