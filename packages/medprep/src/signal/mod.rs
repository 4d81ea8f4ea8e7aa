//! Signal Processing Module
//!
//! Preprocessing applied to ECG waveforms before feature extraction:
//! - Butterworth lowpass/highpass filters applied with zero phase
//! - FFT resampling to a target sampling frequency
//! - Min-max normalization to [-1, 1]

mod filters;
mod normalize;
mod resample;
pub mod spectrum;

pub use filters::{
    bandpass_filter, butterworth_filtfilt, highpass_filter, lowpass_filter, BiquadCoeffs,
    BiquadFilter, ButterworthFilter, FilterType, SosFilter, DEFAULT_FILTER_ORDER,
};
pub use normalize::normalize;
pub use resample::{fourier_resample, resample, resampled_length};
