//! Human-readable indicators and recommended actions.

use crate::features::FeatureVector;
use crate::risk::RiskLevel;

/// Entropy above which content looks packed, compressed or encrypted.
pub const HIGH_ENTROPY_THRESHOLD: f64 = 7.0;

pub const DOUBLE_EXTENSION: &str = "Double extension detected";
pub const EXECUTABLE_SIGNATURE: &str = "Executable file signature detected";
pub const HIGH_ENTROPY: &str = "High entropy detected";

/// Indicators that fired, in fixed order.
pub fn indicators(features: &FeatureVector) -> Vec<&'static str> {
    let mut found = Vec::new();
    if features.has_double_ext() {
        found.push(DOUBLE_EXTENSION);
    }
    if features.has_exe_signature() {
        found.push(EXECUTABLE_SIGNATURE);
    }
    if features.entropy > HIGH_ENTROPY_THRESHOLD {
        found.push(HIGH_ENTROPY);
    }
    found
}

pub fn recommendations(level: RiskLevel) -> &'static [&'static str] {
    match level {
        RiskLevel::Low => &["Open normally but ensure antivirus is active."],
        RiskLevel::Medium => &[
            "Scan with antivirus before opening.",
            "Avoid enabling macros or scripts.",
        ],
        RiskLevel::High => &[
            "DO NOT open the file.",
            "Verify the source.",
            "Upload to VirusTotal for further analysis.",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::extract;

    #[test]
    fn no_indicators_for_plain_text() {
        let f = extract(b"just some notes", "notes.txt");
        assert!(indicators(&f).is_empty());
    }

    #[test]
    fn indicators_keep_order() {
        let mut data = b"MZ".to_vec();
        data.extend(0..=255u8);
        let f = extract(&data, "invoice.pdf.exe");
        assert!(f.entropy > HIGH_ENTROPY_THRESHOLD);
        assert_eq!(
            indicators(&f),
            vec![DOUBLE_EXTENSION, EXECUTABLE_SIGNATURE, HIGH_ENTROPY]
        );
    }

    #[test]
    fn each_indicator_is_independent() {
        assert_eq!(indicators(&extract(b"", "a.b.c")), vec![DOUBLE_EXTENSION]);
        assert_eq!(indicators(&extract(b"MZ", "a.exe")), vec![EXECUTABLE_SIGNATURE]);

        let random: Vec<u8> = (0..=255u8).collect();
        assert_eq!(indicators(&extract(&random, "blob")), vec![HIGH_ENTROPY]);
    }

    #[test]
    fn entropy_of_exactly_seven_is_not_high() {
        // 128 equiprobable values → H = 7
        let data: Vec<u8> = (0..128u8).collect();
        let f = extract(&data, "x");
        assert_eq!(f.entropy, 7.0);
        assert!(indicators(&f).is_empty());
    }

    #[test]
    fn recommendation_counts_per_level() {
        assert_eq!(recommendations(RiskLevel::Low).len(), 1);
        assert_eq!(recommendations(RiskLevel::Medium).len(), 2);
        assert_eq!(recommendations(RiskLevel::High).len(), 3);
        assert_eq!(recommendations(RiskLevel::High)[0], "DO NOT open the file.");
    }
}
