use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Storage format of a WFDB signal file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageFormat {
    /// 8-bit offset binary (`80`)
    Offset8,
    /// 16-bit two's complement, little-endian (`16`)
    Int16,
    /// Two 12-bit samples packed into three bytes (`212`)
    Packed12,
}

impl StorageFormat {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            80 => Some(StorageFormat::Offset8),
            16 => Some(StorageFormat::Int16),
            212 => Some(StorageFormat::Packed12),
            _ => None,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            StorageFormat::Offset8 => 80,
            StorageFormat::Int16 => 16,
            StorageFormat::Packed12 => 212,
        }
    }

    /// Digital value reserved to mark a missing sample
    pub fn invalid_sample(&self) -> i32 {
        match self {
            StorageFormat::Offset8 => -128,
            StorageFormat::Int16 => -32768,
            StorageFormat::Packed12 => -2048,
        }
    }
}

/// Per-channel header fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalChannel {
    pub file_name: String,
    pub format: StorageFormat,
    /// Byte offset to the first sample in the signal file
    pub byte_offset: u64,
    /// ADC units per physical unit
    pub gain: f64,
    pub baseline: i32,
    pub units: String,
    pub adc_resolution: u32,
    pub adc_zero: i32,
    pub description: String,
}

/// A loaded waveform record: header metadata plus physical samples per channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    pub record_name: String,
    /// Sampling frequency in Hz
    pub fs: f64,
    /// Samples per channel as declared in the header, if declared
    pub declared_length: Option<usize>,
    pub channels: Vec<SignalChannel>,
    /// Physical values, `[channel][sample]`
    pub samples: Vec<Vec<f64>>,
    pub comments: Vec<String>,
}

impl SignalRecord {
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn len(&self) -> usize {
        self.samples.first().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration_seconds(&self) -> f64 {
        self.len() as f64 / self.fs
    }

    pub fn channel(&self, index: usize) -> Result<&[f64]> {
        self.samples.get(index).map(|s| s.as_slice()).ok_or_else(|| {
            PrepError::InvalidParameter(format!(
                "Channel index {} out of range (record has {} channels)",
                index,
                self.samples.len()
            ))
        })
    }

    pub fn channel_by_name(&self, name: &str) -> Result<&[f64]> {
        let index = self
            .channels
            .iter()
            .position(|c| c.description == name)
            .ok_or_else(|| PrepError::InvalidParameter(format!("No channel named '{}'", name)))?;
        self.channel(index)
    }
}

/// A single beat or event annotation aligned to a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub sample: u64,
    pub symbol: String,
    pub code: u8,
    pub subtype: i8,
    pub channel: u8,
    pub num: i8,
    pub aux: Option<String>,
}

/// Named scalar features computed from one waveform segment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRecord(BTreeMap<String, f64>);

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    /// Merge another record into this one; later values overwrite.
    pub fn extend(&mut self, other: FeatureRecord) {
        self.0.extend(other.0);
    }
}
