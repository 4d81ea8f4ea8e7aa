//! WFDB record reader
//!
//! Reads a record as the triple `<base>.hea` (text header), the signal files
//! the header references (binary, formats 16/212/80), and `<base>.<ext>`
//! annotations in MIT format.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{PrepError, Result};
use crate::types::{Annotation, SignalChannel, SignalRecord, StorageFormat};

/// Sampling frequency assumed when the header omits it
pub const DEFAULT_FS: f64 = 250.0;
/// ADC gain assumed when the header omits it or declares zero
pub const DEFAULT_GAIN: f64 = 200.0;

const SKIP: u16 = 59;
const NUM: u16 = 60;
const SUB: u16 = 61;
const CHN: u16 = 62;
const AUX: u16 = 63;

/// Beat/event mnemonics indexed by MIT annotation code
const ANNOTATION_SYMBOLS: [&str; 50] = [
    " ", "N", "L", "R", "a", "V", "F", "J", "A", "S", "E", "j", "/", "Q", "~", "[15]", "|",
    "[17]", "s", "T", "*", "D", "\"", "=", "p", "B", "^", "t", "+", "u", "?", "!", "[", "]",
    "e", "n", "@", "x", "f", "(", ")", "r", "[42]", "[43]", "[44]", "[45]", "[46]", "[47]",
    "[48]", "[49]",
];

/// Parsed `.hea` contents
#[derive(Debug, Clone)]
pub struct RecordHeader {
    pub record_name: String,
    pub fs: f64,
    pub declared_length: Option<usize>,
    pub channels: Vec<SignalChannel>,
    pub comments: Vec<String>,
}

/// Append `.ext` to a record base path without touching dots already in it.
pub fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}

/// Load the header and all signal files of the record at `base`.
pub fn read_record(base: &Path) -> Result<SignalRecord> {
    let header_path = with_suffix(base, "hea");
    let text =
        std::fs::read_to_string(&header_path).map_err(|e| PrepError::from_open(e, &header_path))?;
    let header = parse_header(&text)?;

    let dir = header_path.parent().unwrap_or_else(|| Path::new("."));
    let samples = read_signal_files(dir, &header)?;

    log::info!(
        "Loaded record {}: {} channels × {} samples at {} Hz",
        header.record_name,
        header.channels.len(),
        samples.first().map(|s| s.len()).unwrap_or(0),
        header.fs
    );

    Ok(SignalRecord {
        record_name: header.record_name,
        fs: header.fs,
        declared_length: header.declared_length,
        channels: header.channels,
        samples,
        comments: header.comments,
    })
}

/// Load the annotation file `<base>.<extension>`.
pub fn read_annotations(base: &Path, extension: &str) -> Result<Vec<Annotation>> {
    let path = with_suffix(base, extension);
    let bytes = std::fs::read(&path).map_err(|e| PrepError::from_open(e, &path))?;
    let annotations = parse_annotations(&bytes)?;
    log::info!(
        "Loaded {} annotations from {}",
        annotations.len(),
        path.display()
    );
    Ok(annotations)
}

/// Parse the text of a `.hea` file.
pub fn parse_header(text: &str) -> Result<RecordHeader> {
    let mut comments = Vec::new();
    let mut lines = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(comment) = trimmed.strip_prefix('#') {
            comments.push(comment.trim().to_string());
            continue;
        }
        lines.push(trimmed);
    }

    let record_line = lines
        .first()
        .ok_or_else(|| PrepError::ParseError("Header has no record line".to_string()))?;
    let fields: Vec<&str> = record_line.split_whitespace().collect();

    let record_name = fields[0];
    if record_name.contains('/') {
        return Err(PrepError::ParseError(format!(
            "Multi-segment record '{}' is not supported",
            record_name
        )));
    }

    let num_signals: usize = fields
        .get(1)
        .ok_or_else(|| PrepError::ParseError("Record line is missing the signal count".to_string()))?
        .parse()
        .map_err(|_| PrepError::ParseError(format!("Invalid signal count in '{}'", record_line)))?;

    let fs = match fields.get(2) {
        Some(spec) => {
            let value = spec.split(['/', '(']).next().unwrap_or("");
            let fs: f64 = value
                .parse()
                .map_err(|_| PrepError::ParseError(format!("Invalid sampling frequency '{}'", spec)))?;
            if fs > 0.0 {
                fs
            } else {
                DEFAULT_FS
            }
        }
        None => DEFAULT_FS,
    };

    let declared_length = match fields.get(3) {
        Some(n) => Some(
            n.parse::<usize>()
                .map_err(|_| PrepError::ParseError(format!("Invalid sample count '{}'", n)))?,
        ),
        None => None,
    };

    if lines.len() < num_signals + 1 {
        return Err(PrepError::ParseError(format!(
            "Header declares {} signals but has {} signal lines",
            num_signals,
            lines.len() - 1
        )));
    }

    let channels = lines[1..=num_signals]
        .iter()
        .map(|line| parse_signal_line(line))
        .collect::<Result<Vec<_>>>()?;

    Ok(RecordHeader {
        record_name: record_name.to_string(),
        fs,
        declared_length,
        channels,
        comments,
    })
}

fn parse_signal_line(line: &str) -> Result<SignalChannel> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 2 {
        return Err(PrepError::ParseError(format!(
            "Signal line '{}' needs at least a file name and a format",
            line
        )));
    }

    let file_name = fields[0].to_string();

    // format[xsamp][:skew][+offset]
    let format_spec = fields[1];
    let code_len = format_spec
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(format_spec.len());
    let code: u32 = format_spec[..code_len]
        .parse()
        .map_err(|_| PrepError::ParseError(format!("Invalid storage format '{}'", format_spec)))?;
    let format = StorageFormat::from_code(code)
        .ok_or_else(|| PrepError::ParseError(format!("Unsupported storage format {}", code)))?;
    if format_spec[code_len..].starts_with('x') {
        return Err(PrepError::ParseError(format!(
            "Multi-frequency signal '{}' is not supported",
            format_spec
        )));
    }
    let (modifiers, byte_offset) = match format_spec[code_len..].split_once('+') {
        Some((head, offset)) => (
            head,
            offset.parse().map_err(|_| {
                PrepError::ParseError(format!("Invalid byte offset in '{}'", format_spec))
            })?,
        ),
        None => (&format_spec[code_len..], 0),
    };
    let skew: i64 = match modifiers.strip_prefix(':') {
        Some(value) => value
            .parse()
            .map_err(|_| PrepError::ParseError(format!("Invalid skew in '{}'", format_spec)))?,
        None if modifiers.is_empty() => 0,
        None => {
            return Err(PrepError::ParseError(format!(
                "Invalid storage format '{}'",
                format_spec
            )))
        }
    };
    if skew != 0 {
        // samples are read unshifted
        log::warn!(
            "Signal in {} declares skew {}; skew is not applied",
            file_name,
            skew
        );
    }

    let adc_resolution = match fields.get(3) {
        Some(v) => parse_field(v, "ADC resolution")?,
        None => match format {
            StorageFormat::Offset8 => 8,
            StorageFormat::Int16 => 16,
            StorageFormat::Packed12 => 12,
        },
    };
    let adc_zero: i32 = match fields.get(4) {
        Some(v) => parse_field(v, "ADC zero")?,
        None => 0,
    };

    // gain[(baseline)][/units]
    let mut gain = DEFAULT_GAIN;
    let mut baseline = adc_zero;
    let mut units = "mV".to_string();
    if let Some(spec) = fields.get(2) {
        let (gain_part, unit_part) = match spec.split_once('/') {
            Some((g, u)) => (g, Some(u)),
            None => (*spec, None),
        };
        let (gain_value, baseline_value) = match gain_part.split_once('(') {
            Some((g, b)) => (g, Some(b.trim_end_matches(')'))),
            None => (gain_part, None),
        };
        let parsed: f64 = parse_field(gain_value, "ADC gain")?;
        if parsed != 0.0 {
            gain = parsed;
        }
        if let Some(b) = baseline_value {
            baseline = parse_field(b, "baseline")?;
        }
        if let Some(u) = unit_part {
            units = u.to_string();
        }
    }

    let description = fields.get(8..).map(|d| d.join(" ")).unwrap_or_default();

    Ok(SignalChannel {
        file_name,
        format,
        byte_offset,
        gain,
        baseline,
        units,
        adc_resolution,
        adc_zero,
        description,
    })
}

fn parse_field<T: std::str::FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| PrepError::ParseError(format!("Invalid {} '{}'", what, value)))
}

fn read_signal_files(dir: &Path, header: &RecordHeader) -> Result<Vec<Vec<f64>>> {
    // Channels sharing a file are interleaved frame by frame
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, channel) in header.channels.iter().enumerate() {
        groups.entry(channel.file_name.as_str()).or_default().push(idx);
    }

    let mut samples: Vec<Vec<f64>> = vec![Vec::new(); header.channels.len()];

    for (file_name, indices) in groups {
        let first = &header.channels[indices[0]];
        if indices
            .iter()
            .any(|&i| header.channels[i].format != first.format)
        {
            return Err(PrepError::ParseError(format!(
                "Signals in {} use different storage formats",
                file_name
            )));
        }

        let path = dir.join(file_name);
        let file = File::open(&path).map_err(|e| PrepError::from_open(e, &path))?;
        // mapping an empty file fails on some platforms
        let digital = if file.metadata()?.len() == 0 {
            Vec::new()
        } else {
            let mmap = unsafe { Mmap::map(&file)? };
            let start = (first.byte_offset as usize).min(mmap.len());
            decode_samples(&mmap[start..], first.format)
        };

        let frame_size = indices.len();
        let available = digital.len() / frame_size;
        let frames = match header.declared_length {
            Some(declared) if declared > 0 => {
                if available < declared {
                    return Err(PrepError::ParseError(format!(
                        "{} holds {} frames but the header declares {}",
                        file_name, available, declared
                    )));
                }
                declared
            }
            _ => available,
        };

        log::debug!(
            "Decoding {} ({} signals, format {}, {} frames)",
            file_name,
            frame_size,
            first.format.code(),
            frames
        );

        for (slot, &channel_idx) in indices.iter().enumerate() {
            let channel = &header.channels[channel_idx];
            let invalid = channel.format.invalid_sample();
            samples[channel_idx] = (0..frames)
                .map(|frame| {
                    let d = digital[frame * frame_size + slot];
                    if d == invalid {
                        f64::NAN
                    } else {
                        (d - channel.baseline) as f64 / channel.gain
                    }
                })
                .collect();
        }
    }

    Ok(samples)
}

/// Decode a raw byte stream into digital sample values.
pub fn decode_samples(bytes: &[u8], format: StorageFormat) -> Vec<i32> {
    match format {
        StorageFormat::Offset8 => bytes.iter().map(|&b| b as i32 - 128).collect(),
        StorageFormat::Int16 => bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]) as i32)
            .collect(),
        StorageFormat::Packed12 => {
            let mut out = Vec::with_capacity(bytes.len() * 2 / 3 + 1);
            let mut chunks = bytes.chunks_exact(3);
            for c in &mut chunks {
                out.push(sign_extend_12(c[0] as i32 | ((c[1] as i32 & 0x0F) << 8)));
                out.push(sign_extend_12(c[2] as i32 | ((c[1] as i32 & 0xF0) << 4)));
            }
            let rest = chunks.remainder();
            if rest.len() == 2 {
                out.push(sign_extend_12(rest[0] as i32 | ((rest[1] as i32 & 0x0F) << 8)));
            }
            out
        }
    }
}

fn sign_extend_12(v: i32) -> i32 {
    if v > 2047 {
        v - 4096
    } else {
        v
    }
}

/// Parse MIT-format annotation bytes.
pub fn parse_annotations(bytes: &[u8]) -> Result<Vec<Annotation>> {
    let mut annotations: Vec<Annotation> = Vec::new();
    let mut sample: i64 = 0;
    let mut num: i8 = 0;
    let mut channel: u8 = 0;
    let mut pos = 0usize;

    let read_word = |pos: usize| -> Option<u16> {
        bytes
            .get(pos..pos + 2)
            .map(|w| u16::from_le_bytes([w[0], w[1]]))
    };

    while let Some(word) = read_word(pos) {
        pos += 2;
        let code = word >> 10;
        let value = word & 0x03FF;

        match code {
            0 if value == 0 => break,
            SKIP => {
                let high = read_word(pos);
                let low = read_word(pos + 2);
                let (high, low) = high.zip(low).ok_or_else(|| {
                    PrepError::ParseError("Truncated SKIP annotation".to_string())
                })?;
                pos += 4;
                sample += (((high as u32) << 16) | low as u32) as i32 as i64;
            }
            NUM => {
                num = value as i16 as i8;
                if let Some(last) = annotations.last_mut() {
                    last.num = num;
                }
            }
            SUB => {
                if let Some(last) = annotations.last_mut() {
                    last.subtype = value as i16 as i8;
                }
            }
            CHN => {
                channel = value as u8;
                if let Some(last) = annotations.last_mut() {
                    last.channel = channel;
                }
            }
            AUX => {
                let len = value as usize;
                let text = bytes.get(pos..pos + len).ok_or_else(|| {
                    PrepError::ParseError("Truncated AUX annotation".to_string())
                })?;
                pos += len + (len & 1);
                if let Some(last) = annotations.last_mut() {
                    let aux = String::from_utf8_lossy(text)
                        .trim_end_matches('\0')
                        .to_string();
                    last.aux = Some(aux);
                }
            }
            0 => {
                sample += value as i64;
            }
            _ => {
                sample += value as i64;
                if sample < 0 {
                    return Err(PrepError::ParseError(format!(
                        "Annotation at byte {} has negative sample index",
                        pos - 2
                    )));
                }
                annotations.push(Annotation {
                    sample: sample as u64,
                    symbol: annotation_symbol(code as u8).to_string(),
                    code: code as u8,
                    subtype: 0,
                    channel,
                    num,
                    aux: None,
                });
            }
        }
    }

    Ok(annotations)
}

pub fn annotation_symbol(code: u8) -> &'static str {
    ANNOTATION_SYMBOLS.get(code as usize).copied().unwrap_or("?")
}
