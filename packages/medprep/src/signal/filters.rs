//! Digital Filter Implementations
//!
//! Butterworth lowpass/highpass/bandpass filters realized as cascaded
//! second-order sections (biquads) and applied forward-backward so the
//! output has zero phase shift.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{PrepError, Result};

/// Filter order used when callers do not pick one
pub const DEFAULT_FILTER_ORDER: usize = 5;

/// Filter type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Lowpass,
    Highpass,
}

/// Second-order section (biquad) coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    fn is_first_order(&self) -> bool {
        self.b2 == 0.0 && self.a2 == 0.0
    }

    /// Gain at z = 1
    fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
}

/// State for a single biquad section (Direct Form II Transposed)
#[derive(Debug, Clone, Default)]
struct BiquadState {
    z1: f64,
    z2: f64,
}

/// Single biquad filter section
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coeffs: BiquadCoeffs,
    state: BiquadState,
}

impl BiquadFilter {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            state: BiquadState::default(),
        }
    }

    pub fn coeffs(&self) -> BiquadCoeffs {
        self.coeffs
    }

    /// Process a single sample using Direct Form II Transposed
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.coeffs.b0 * input + self.state.z1;
        self.state.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output + self.state.z2;
        self.state.z2 = self.coeffs.b2 * input - self.coeffs.a2 * output;
        output
    }

    /// Load the state this section settles into under a constant `input`,
    /// returning the constant output it then produces.
    fn settle(&mut self, input: f64) -> f64 {
        let c = self.coeffs;
        let output = input * c.dc_gain();
        self.state.z1 = output - c.b0 * input;
        self.state.z2 = c.b2 * input - c.a2 * output;
        output
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.state = BiquadState::default();
    }
}

/// Cascaded second-order sections filter
#[derive(Debug, Clone)]
pub struct SosFilter {
    sections: Vec<BiquadFilter>,
}

impl SosFilter {
    pub fn new(sections: Vec<BiquadCoeffs>) -> Self {
        Self {
            sections: sections.into_iter().map(BiquadFilter::new).collect(),
        }
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Process a single sample through all sections
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let mut output = input;
        for section in &mut self.sections {
            output = section.process(output);
        }
        output
    }

    /// Process a signal and return a new array (original unchanged)
    pub fn filter(&mut self, signal: &[f64]) -> Vec<f64> {
        signal.iter().map(|&s| self.process(s)).collect()
    }

    /// Reset all section states
    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }

    /// Put every section in the steady state for a step of height `x0`,
    /// so filtering a signal that starts at `x0` has no start-up transient.
    pub fn settle(&mut self, x0: f64) {
        let mut input = x0;
        for section in &mut self.sections {
            input = section.settle(input);
        }
    }

    /// Edge padding length used by [`SosFilter::filtfilt`]
    fn pad_length(&self) -> usize {
        let first_order = self
            .sections
            .iter()
            .filter(|s| s.coeffs().is_first_order())
            .count();
        3 * (2 * self.sections.len() + 1 - first_order)
    }

    /// Zero-phase filtering: forward pass, then a backward pass over the
    /// reversed output. The signal is extended at both ends by odd reflection
    /// to suppress edge transients.
    pub fn filtfilt(&mut self, signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        if n == 0 {
            return Vec::new();
        }

        let pad = self.pad_length().min(n - 1);
        let first = signal[0];
        let last = signal[n - 1];

        let mut extended = Vec::with_capacity(n + 2 * pad);
        extended.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
        extended.extend_from_slice(signal);
        extended.extend((1..=pad).map(|i| 2.0 * last - signal[n - 1 - i]));

        self.reset();
        self.settle(extended[0]);
        let mut forward = self.filter(&extended);

        forward.reverse();
        self.reset();
        self.settle(forward[0]);
        let mut backward = self.filter(&forward);
        backward.reverse();

        self.reset();
        backward[pad..pad + n].to_vec()
    }
}

/// Butterworth filter designer
pub struct ButterworthFilter;

impl ButterworthFilter {
    /// Design a Butterworth lowpass filter
    pub fn lowpass(cutoff: f64, sample_rate: f64, order: usize) -> SosFilter {
        let wn = Self::prewarp(cutoff, sample_rate);
        SosFilter::new(Self::design(wn, order, FilterType::Lowpass))
    }

    /// Design a Butterworth highpass filter
    pub fn highpass(cutoff: f64, sample_rate: f64, order: usize) -> SosFilter {
        let wn = Self::prewarp(cutoff, sample_rate);
        SosFilter::new(Self::design(wn, order, FilterType::Highpass))
    }

    /// Prewarp frequency for bilinear transform
    fn prewarp(freq: f64, sample_rate: f64) -> f64 {
        (PI * freq / sample_rate).tan()
    }

    /// Analog prototype poles come in conjugate pairs
    /// s^2 + 2 sin(theta_k) wn s + wn^2, plus one real pole s + wn for odd
    /// orders; each factor is mapped through the bilinear transform.
    fn design(wn: f64, order: usize, filter_type: FilterType) -> Vec<BiquadCoeffs> {
        let num_sections = (order + 1) / 2;
        let mut sections = Vec::with_capacity(num_sections);

        for k in 0..num_sections {
            if order % 2 == 1 && k == num_sections - 1 {
                let norm = 1.0 + wn;
                let a1 = (wn - 1.0) / norm;
                let (b0, b1) = match filter_type {
                    FilterType::Lowpass => (wn / norm, wn / norm),
                    FilterType::Highpass => (1.0 / norm, -1.0 / norm),
                };
                sections.push(BiquadCoeffs {
                    b0,
                    b1,
                    b2: 0.0,
                    a1,
                    a2: 0.0,
                });
                continue;
            }

            let theta = PI * (2.0 * k as f64 + 1.0) / (2.0 * order as f64);
            let damping = 2.0 * theta.sin();
            let wn2 = wn * wn;
            let denom = 1.0 + damping * wn + wn2;
            let a1 = 2.0 * (wn2 - 1.0) / denom;
            let a2 = (1.0 - damping * wn + wn2) / denom;

            let (b0, b1, b2) = match filter_type {
                FilterType::Lowpass => (wn2 / denom, 2.0 * wn2 / denom, wn2 / denom),
                FilterType::Highpass => (1.0 / denom, -2.0 / denom, 1.0 / denom),
            };

            sections.push(BiquadCoeffs { b0, b1, b2, a1, a2 });
        }

        sections
    }
}

fn validate(cutoff: f64, sample_rate: f64, order: usize) -> Result<()> {
    if !(sample_rate > 0.0) || !sample_rate.is_finite() {
        return Err(PrepError::InvalidParameter(format!(
            "Sampling frequency must be positive, got {} Hz",
            sample_rate
        )));
    }
    let nyquist = 0.5 * sample_rate;
    if !(cutoff > 0.0) || cutoff >= nyquist {
        return Err(PrepError::InvalidParameter(format!(
            "Cutoff frequency ({} Hz) must be in (0, {}) Hz (Nyquist)",
            cutoff, nyquist
        )));
    }
    if order == 0 {
        return Err(PrepError::InvalidParameter(
            "Filter order must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Zero-phase Butterworth filter of the given type.
pub fn butterworth_filtfilt(
    data: &[f64],
    filter_type: FilterType,
    cutoff: f64,
    sample_rate: f64,
    order: usize,
) -> Result<Vec<f64>> {
    validate(cutoff, sample_rate, order)?;
    let mut filter = match filter_type {
        FilterType::Lowpass => ButterworthFilter::lowpass(cutoff, sample_rate, order),
        FilterType::Highpass => ButterworthFilter::highpass(cutoff, sample_rate, order),
    };
    log::debug!(
        "{:?} filter: cutoff {} Hz, fs {} Hz, order {}, {} sections",
        filter_type,
        cutoff,
        sample_rate,
        order,
        filter.num_sections()
    );
    Ok(filter.filtfilt(data))
}

/// Remove high-frequency noise above `cutoff` Hz.
pub fn lowpass_filter(data: &[f64], cutoff: f64, sample_rate: f64, order: usize) -> Result<Vec<f64>> {
    butterworth_filtfilt(data, FilterType::Lowpass, cutoff, sample_rate, order)
}

/// Remove low-frequency drift below `cutoff` Hz.
pub fn highpass_filter(
    data: &[f64],
    cutoff: f64,
    sample_rate: f64,
    order: usize,
) -> Result<Vec<f64>> {
    butterworth_filtfilt(data, FilterType::Highpass, cutoff, sample_rate, order)
}

/// Highpass at `low` followed by lowpass at `high`.
pub fn bandpass_filter(
    data: &[f64],
    low: f64,
    high: f64,
    sample_rate: f64,
    order: usize,
) -> Result<Vec<f64>> {
    if low >= high {
        return Err(PrepError::InvalidParameter(format!(
            "Low cutoff ({} Hz) must be less than high cutoff ({} Hz)",
            low, high
        )));
    }
    let highpassed = highpass_filter(data, low, sample_rate, order)?;
    lowpass_filter(&highpassed, high, sample_rate, order)
}
