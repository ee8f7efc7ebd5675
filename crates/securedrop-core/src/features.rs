//! Feature extraction - raw bytes + filename → fixed 6-field vector.
//!
//! Field order is part of the model contract:
//! - 0: Shannon entropy of the byte histogram (bits, 0..=8)
//! - 1: Printable ASCII ratio
//! - 2: Size in KiB
//! - 3: Double-extension flag (more than one `.` in the filename)
//! - 4: Executable flag (`MZ` prefix)
//! - 5: Symbol density over `!@#$%^&*()_+-=`
//!
//! Extraction never fails: an empty buffer yields all-zero content features.

use serde::Serialize;

pub const FEATURE_COUNT: usize = 6;
const NUM_BINS: usize = 256;

/// Display names, in field order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Entropy",
    "Printable Ratio",
    "File Size (KB)",
    "Double Extension Flag",
    "Executable Signature Flag",
    "Symbol Density",
];

const MZ_SIGNATURE: [u8; 2] = *b"MZ";
const SYMBOLS: &[u8] = b"!@#$%^&*()_+-=";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub entropy: f64,
    pub printable_ratio: f64,
    pub size_kb: f64,
    pub double_ext: f64,
    pub exe_flag: f64,
    pub symbol_density: f64,
}

impl FeatureVector {
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.entropy,
            self.printable_ratio,
            self.size_kb,
            self.double_ext,
            self.exe_flag,
            self.symbol_density,
        ]
    }

    /// Pairs each display name with its value.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(self.as_array())
    }

    pub fn has_double_ext(&self) -> bool {
        self.double_ext == 1.0
    }

    pub fn has_exe_signature(&self) -> bool {
        self.exe_flag == 1.0
    }
}

/// Compute the 256-bin byte-value histogram.
fn byte_histogram(data: &[u8]) -> [u64; NUM_BINS] {
    let mut hist = [0u64; NUM_BINS];
    for &b in data {
        hist[b as usize] += 1;
    }
    hist
}

/// Shannon entropy (base 2) of the byte distribution. 0 for an empty buffer.
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let total = data.len() as f64;
    let mut entropy = 0.0f64;
    for &c in &byte_histogram(data) {
        if c > 0 {
            let p = c as f64 / total;
            entropy -= p * p.log2();
        }
    }
    // Summation can overshoot the bound by an ulp
    entropy.clamp(0.0, 8.0)
}

/// Digits, letters, punctuation and the six ASCII whitespace characters.
fn is_printable(b: u8) -> bool {
    b.is_ascii_graphic() || matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn ratio(count: usize, len: usize) -> f64 {
    if len == 0 {
        0.0
    } else {
        count as f64 / len as f64
    }
}

fn flag(set: bool) -> f64 {
    if set {
        1.0
    } else {
        0.0
    }
}

/// Extract the feature vector for one file.
///
/// `data` is the whole file; callers are expected to have rejected anything
/// above [`crate::scan::MAX_UPLOAD_BYTES`] before getting here.
pub fn extract(data: &[u8], filename: &str) -> FeatureVector {
    let len = data.len();

    let printable = data.iter().filter(|&&b| is_printable(b)).count();
    let symbols = data.iter().filter(|&&b| SYMBOLS.contains(&b)).count();
    let dots = filename.chars().filter(|&c| c == '.').count();

    FeatureVector {
        entropy: shannon_entropy(data),
        printable_ratio: ratio(printable, len),
        size_kb: len as f64 / 1024.0,
        double_ext: flag(dots > 1),
        exe_flag: flag(data.starts_with(&MZ_SIGNATURE)),
        symbol_density: ratio(symbols, len),
    }
}
