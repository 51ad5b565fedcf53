//! Corpus-wide behavioral statistics
//!
//! Unlike the other extractors these are descriptive facts about the whole
//! session set, emitted as patterns so they flow through classification the
//! same way.

use super::{ratio, round3, PatternExtractor, Tally};
use crate::types::{NormalizedSession, Pattern, PatternFamily};
use once_cell::sync::Lazy;
use regex::Regex;

/// Share of Hangul requests needed for a language preference.
pub const KOREAN_RATIO_THRESHOLD: f64 = 0.8;
/// Share of all tool calls needed for a tool preference.
pub const TOOL_SHARE_THRESHOLD: f64 = 0.1;
/// How many of the most used tools are considered.
pub const TOP_TOOLS: usize = 3;
/// Average turn counts at or below this are short sessions.
pub const SHORT_SESSION_TURNS: f64 = 5.0;
/// Average turn counts at or above this are long sessions.
pub const LONG_SESSION_TURNS: f64 = 15.0;

static HANGUL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[가-힣]").expect("valid hangul regex"));

#[derive(Default)]
pub struct BehavioralExtractor;

impl BehavioralExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl PatternExtractor for BehavioralExtractor {
    fn name(&self) -> &str {
        "behavioral"
    }

    fn extract(&self, sessions: &[NormalizedSession]) -> Vec<Pattern> {
        if sessions.is_empty() {
            return Vec::new();
        }

        let mut patterns = Vec::new();
        patterns.extend(korean_usage(sessions));
        patterns.extend(tool_preferences(sessions));
        patterns.push(session_length(sessions));
        patterns
    }
}

fn behavioral(
    id: String,
    signature: String,
    frequency: usize,
    example: String,
    confidence: f64,
) -> Pattern {
    Pattern {
        id,
        family: PatternFamily::Behavioral,
        signature,
        frequency,
        examples: vec![example],
        confidence: round3(confidence),
    }
}

/// Language preference, if nearly every request is written in Hangul.
pub fn korean_usage(sessions: &[NormalizedSession]) -> Option<Pattern> {
    let (korean, total) = sessions
        .iter()
        .flat_map(|s| s.user_messages())
        .fold((0usize, 0usize), |(korean, total), msg| {
            (korean + usize::from(HANGUL.is_match(msg)), total + 1)
        });

    if total == 0 {
        return None;
    }

    let share = ratio(korean, total);
    (share >= KOREAN_RATIO_THRESHOLD).then(|| {
        behavioral(
            "behavioral_korean".to_string(),
            "Korean prompt preference".to_string(),
            korean,
            format!("Korean usage ratio: {:.1}%", share * 100.0),
            share,
        )
    })
}

/// One pattern per heavily used tool among the top three.
pub fn tool_preferences(sessions: &[NormalizedSession]) -> Vec<Pattern> {
    let mut tally: Tally<&str> = Tally::new();
    for session in sessions {
        for tool in session.tool_sequence() {
            tally.add(&tool, None);
        }
    }

    let total = tally.total();
    tally
        .ranked()
        .into_iter()
        .take(TOP_TOOLS)
        .filter_map(|entry| {
            let share = ratio(entry.count, total);
            (share >= TOOL_SHARE_THRESHOLD).then(|| {
                behavioral(
                    format!("behavioral_tool_{}", entry.key.to_lowercase()),
                    format!("{} tool frequently used", entry.key),
                    entry.count,
                    format!("{:.1}% of all tool calls", share * 100.0),
                    share,
                )
            })
        })
        .collect()
}

/// Session-length band from the average turn count. Always emitted.
pub fn session_length(sessions: &[NormalizedSession]) -> Pattern {
    let lengths: Vec<usize> = sessions
        .iter()
        .map(|s| {
            if s.turn_count > 0 {
                s.turn_count
            } else {
                s.turns.len() / 2
            }
        })
        .collect();
    let average = lengths.iter().sum::<usize>() as f64 / lengths.len().max(1) as f64;

    let signature = if average <= SHORT_SESSION_TURNS {
        "short session preference (5 turns or fewer)".to_string()
    } else if average >= LONG_SESSION_TURNS {
        "long session preference (15 turns or more)".to_string()
    } else {
        format!("medium session ({:.1} turns average)", average)
    };

    behavioral(
        "behavioral_session_length".to_string(),
        signature,
        sessions.len(),
        format!(
            "average {:.1} turns across {} sessions",
            average,
            sessions.len()
        ),
        1.0,
    )
}
