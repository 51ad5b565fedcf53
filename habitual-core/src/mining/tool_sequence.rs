//! Tool-call n-gram mining
//!
//! Each session's tool calls are concatenated across its assistant turns and
//! a window of `n` calls slides over the result. Windows seen at least
//! `min_frequency` times across the corpus become patterns, with confidence
//! equal to their share of all windows.

use super::{ratio, round3, PatternExtractor, Tally};
use crate::types::{NormalizedSession, Pattern, PatternFamily};

/// Separator used in sequence signatures.
pub const ARROW: &str = " → ";

pub struct ToolSequenceExtractor {
    n: usize,
    min_frequency: usize,
}

impl ToolSequenceExtractor {
    pub fn new(n: usize, min_frequency: usize) -> Self {
        Self {
            n: n.max(1),
            min_frequency: min_frequency.max(1),
        }
    }
}

impl Default for ToolSequenceExtractor {
    fn default() -> Self {
        Self::new(3, 3)
    }
}

impl PatternExtractor for ToolSequenceExtractor {
    fn name(&self) -> &str {
        "tool_sequence"
    }

    fn extract(&self, sessions: &[NormalizedSession]) -> Vec<Pattern> {
        let mut tally: Tally<Vec<&str>> = Tally::new();

        for session in sessions {
            let tools = session.tool_sequence();
            for window in tools.windows(self.n) {
                let example = format!("[{}] {}", session.project, window.join(ARROW));
                tally.add(&window.to_vec(), Some(example));
            }
        }

        let total = tally.total();
        tally
            .ranked()
            .into_iter()
            .filter(|entry| entry.count >= self.min_frequency)
            .enumerate()
            .map(|(i, entry)| Pattern {
                id: format!("tool_seq_{}", i + 1),
                family: PatternFamily::ToolSequence,
                signature: entry.key.join(ARROW),
                frequency: entry.count,
                examples: entry.examples,
                confidence: round3(ratio(entry.count, total)),
            })
            .collect()
    }
}
