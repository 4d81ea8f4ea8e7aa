//! FFT helpers shared by resampling and spectral features.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Forward DFT of a real signal.
pub fn fft_real(signal: &[f64]) -> Vec<Complex<f64>> {
    let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    if buffer.is_empty() {
        return buffer;
    }
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(buffer.len());
    fft.process(&mut buffer);
    buffer
}

/// Inverse DFT, unnormalized (no 1/n factor).
pub fn ifft_unnormalized(spectrum: &mut [Complex<f64>]) {
    if spectrum.is_empty() {
        return;
    }
    let mut planner = FftPlanner::<f64>::new();
    let ifft = planner.plan_fft_inverse(spectrum.len());
    ifft.process(spectrum);
}

/// Magnitude of each DFT bin of a real signal.
pub fn magnitude_spectrum(signal: &[f64]) -> Vec<f64> {
    fft_real(signal).iter().map(|c| c.norm()).collect()
}

/// Frequency of each DFT bin for `n` samples spaced `d` seconds apart:
/// `[0, 1, ..., ceil(n/2) - 1, -floor(n/2), ..., -1] / (n * d)`.
pub fn fft_frequencies(n: usize, d: f64) -> Vec<f64> {
    let scale = 1.0 / (n as f64 * d);
    let positive = n.div_ceil(2);
    (0..n)
        .map(|k| {
            if k < positive {
                k as f64 * scale
            } else {
                -((n - k) as f64) * scale
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_frequencies_even_and_odd() {
        assert_eq!(fft_frequencies(4, 0.25), vec![0.0, 1.0, -2.0, -1.0]);
        assert_eq!(fft_frequencies(5, 1.0), vec![0.0, 0.2, 0.4, -0.4, -0.2]);
        assert!(fft_frequencies(0, 1.0).is_empty());
    }

    #[test]
    fn test_magnitude_of_pure_tone() {
        let n = 64;
        let signal: Vec<f64> = (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * 4.0 * i as f64 / n as f64).cos())
            .collect();
        let mags = magnitude_spectrum(&signal);
        assert!((mags[4] - n as f64 / 2.0).abs() < 1e-9);
        assert!((mags[n - 4] - n as f64 / 2.0).abs() < 1e-9);
        assert!(mags[5] < 1e-9);
    }
}
