//! Confidence model for classified suggestions.
//!
//! ```text
//! confidence = 0.40 * raw
//!            + 0.25 * min(frequency / 20, 1)
//!            + 0.15 * min(examples / 3, 1)
//!            + 0.10 * complexity(signature length)
//!            + type_weight
//! ```
//!
//! clamped to `[0, 1]` and rounded to three decimals. Unclassifiable
//! patterns are capped at `min(raw * 0.5, 0.3)` instead.

use crate::types::SuggestionType;

pub const RAW_WEIGHT: f64 = 0.40;
pub const FREQUENCY_WEIGHT: f64 = 0.25;
pub const EXAMPLE_WEIGHT: f64 = 0.15;
pub const COMPLEXITY_WEIGHT: f64 = 0.10;

/// Frequency at which the frequency sub-score saturates.
pub const FREQUENCY_SATURATION: f64 = 20.0;
/// Example count at which the diversity sub-score saturates.
pub const EXAMPLE_SATURATION: f64 = 3.0;
/// Ceiling for patterns that map to no suggestion.
pub const UNKNOWN_CEILING: f64 = 0.3;

/// Fixed bonus per suggestion type.
pub fn type_weight(suggestion_type: SuggestionType) -> f64 {
    match suggestion_type {
        SuggestionType::Skill => 0.30,
        SuggestionType::SlashCommand => 0.25,
        SuggestionType::Agent => 0.25,
        SuggestionType::ClaudeMdRule => 0.20,
        SuggestionType::Unknown => 0.10,
    }
}

/// 1.0 for signatures of 5..=50 characters, 0.6 below, 0.8 above.
pub fn complexity_score(signature_chars: usize) -> f64 {
    match signature_chars {
        0..=4 => 0.6,
        5..=50 => 1.0,
        _ => 0.8,
    }
}

/// Recompute a pattern's confidence for its suggestion type.
pub fn score_confidence(
    raw_confidence: f64,
    frequency: usize,
    example_count: usize,
    signature_chars: usize,
    suggestion_type: SuggestionType,
) -> f64 {
    let score = if suggestion_type == SuggestionType::Unknown {
        (raw_confidence * 0.5).min(UNKNOWN_CEILING)
    } else {
        let frequency_score = (frequency as f64 / FREQUENCY_SATURATION).min(1.0);
        let example_score = (example_count as f64 / EXAMPLE_SATURATION).min(1.0);

        RAW_WEIGHT * raw_confidence
            + FREQUENCY_WEIGHT * frequency_score
            + EXAMPLE_WEIGHT * example_score
            + COMPLEXITY_WEIGHT * complexity_score(signature_chars)
            + type_weight(suggestion_type)
    };

    let clamped = if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    };
    (clamped * 1000.0).round() / 1000.0
}
