//! Priority tiers and final ordering of suggestions.

use crate::types::{ClassifiedSuggestion, Priority};
use std::cmp::Ordering;

/// Confidence needed for [`Priority::P1`].
pub const HIGH_CONFIDENCE: f64 = 0.8;
/// Confidence needed for [`Priority::P2`].
pub const MEDIUM_CONFIDENCE: f64 = 0.6;
/// Frequency needed for [`Priority::P1`].
pub const HIGH_FREQUENCY: usize = 5;
/// Frequency needed for [`Priority::P2`].
pub const MEDIUM_FREQUENCY: usize = 3;

pub fn assign_priority(confidence: f64, frequency: usize) -> Priority {
    if confidence >= HIGH_CONFIDENCE && frequency >= HIGH_FREQUENCY {
        Priority::P1
    } else if confidence >= MEDIUM_CONFIDENCE && frequency >= MEDIUM_FREQUENCY {
        Priority::P2
    } else {
        Priority::P3
    }
}

/// Stable sort by tier, then descending confidence, then descending frequency.
pub fn sort_suggestions(suggestions: &mut [ClassifiedSuggestion]) {
    suggestions.sort_by(compare);
}

fn compare(a: &ClassifiedSuggestion, b: &ClassifiedSuggestion) -> Ordering {
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| b.frequency.cmp(&a.frequency))
}

/// Assign every priority, then order the list.
pub fn prioritize(mut suggestions: Vec<ClassifiedSuggestion>) -> Vec<ClassifiedSuggestion> {
    for suggestion in &mut suggestions {
        suggestion.priority = assign_priority(suggestion.confidence, suggestion.frequency);
    }
    sort_suggestions(&mut suggestions);

    tracing::debug!(
        p1 = count(&suggestions, Priority::P1),
        p2 = count(&suggestions, Priority::P2),
        p3 = count(&suggestions, Priority::P3),
        "Prioritized suggestions"
    );
    suggestions
}

/// Number of suggestions in `priority`.
pub fn count(suggestions: &[ClassifiedSuggestion], priority: Priority) -> usize {
    suggestions.iter().filter(|s| s.priority == priority).count()
}
