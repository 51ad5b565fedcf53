//! Pattern mining
//!
//! Extractors consume the whole collected session set at once and return
//! frequency-scored [`Pattern`]s. Three extractors ship by default:
//!
//! | Extractor | Family | Emits |
//! |-----------|--------|-------|
//! | [`ToolSequenceExtractor`] | `tool_sequence` | repeated tool-call n-grams |
//! | [`PromptTemplateExtractor`] | `prompt_template` | request endings, leading references, keywords |
//! | [`BehavioralExtractor`] | `behavioral` | corpus-wide usage statistics |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use habitual_core::mining::create_default_miner;
//!
//! let miner = create_default_miner(&config.miner);
//! let mined = miner.mine(&collected.sessions);
//! println!("{} tool sequences", mined.tool_sequences.len());
//! ```
//!
//! Every tally is local to one `mine` call; nothing carries over between runs.

pub mod behavioral;
pub mod prompt_template;
pub mod rules;
pub mod tool_sequence;

pub use behavioral::BehavioralExtractor;
pub use prompt_template::PromptTemplateExtractor;
pub use tool_sequence::ToolSequenceExtractor;

use crate::config::MinerConfig;
use crate::types::{NormalizedSession, Pattern, PatternFamily};
use std::collections::HashMap;
use std::hash::Hash;

/// A pattern extractor.
pub trait PatternExtractor: Send + Sync {
    /// Unique name, used in logs.
    fn name(&self) -> &str;

    /// Mine patterns from the full session set.
    fn extract(&self, sessions: &[NormalizedSession]) -> Vec<Pattern>;
}

/// Mined patterns grouped by family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinedPatterns {
    pub tool_sequences: Vec<Pattern>,
    pub prompt_templates: Vec<Pattern>,
    pub behavioral: Vec<Pattern>,
}

impl MinedPatterns {
    /// Route a pattern to its family's list.
    ///
    /// Returns `false` for families without a list (`complex_task`).
    pub fn push(&mut self, pattern: Pattern) -> bool {
        match pattern.family {
            PatternFamily::ToolSequence => self.tool_sequences.push(pattern),
            PatternFamily::PromptTemplate => self.prompt_templates.push(pattern),
            PatternFamily::Behavioral => self.behavioral.push(pattern),
            PatternFamily::ComplexTask => return false,
        }
        true
    }

    /// All patterns: tool sequences, then prompt templates, then behavioral.
    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.tool_sequences
            .iter()
            .chain(&self.prompt_templates)
            .chain(&self.behavioral)
    }

    pub fn len(&self) -> usize {
        self.tool_sequences.len() + self.prompt_templates.len() + self.behavioral.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs registered extractors over a session set.
#[derive(Default)]
pub struct PatternMiner {
    extractors: Vec<Box<dyn PatternExtractor>>,
}

impl PatternMiner {
    /// Create a miner with no extractors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extractor. Extractors run in registration order.
    pub fn register(&mut self, extractor: Box<dyn PatternExtractor>) {
        tracing::debug!(extractor = extractor.name(), "Registered pattern extractor");
        self.extractors.push(extractor);
    }

    pub fn extractor_names(&self) -> Vec<&str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// Run every extractor and group the results.
    pub fn mine(&self, sessions: &[NormalizedSession]) -> MinedPatterns {
        let mut mined = MinedPatterns::default();
        for extractor in &self.extractors {
            let patterns = extractor.extract(sessions);
            tracing::info!(
                extractor = extractor.name(),
                count = patterns.len(),
                "Extractor finished"
            );
            for pattern in patterns {
                let id = pattern.id.clone();
                if !mined.push(pattern) {
                    tracing::warn!(pattern_id = %id, "Dropping pattern of unsupported family");
                }
            }
        }
        mined
    }
}

/// Miner with the three built-in extractors.
pub fn create_default_miner(config: &MinerConfig) -> PatternMiner {
    let mut miner = PatternMiner::new();
    miner.register(Box::new(ToolSequenceExtractor::new(
        config.ngram_size,
        config.min_frequency,
    )));
    miner.register(Box::new(PromptTemplateExtractor::new(
        config.min_frequency,
        config.keyword_top_n,
    )));
    miner.register(Box::new(BehavioralExtractor::new()));
    miner
}

/// Round to 3 decimal places.
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// `count / total`, 0 when `total` is 0.
pub(crate) fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

// ============================================
// Insertion-ordered frequency tally
// ============================================

pub(crate) struct TallyEntry<K> {
    pub key: K,
    pub count: usize,
    pub examples: Vec<String>,
}

/// Counts keys and keeps up to [`rules::MAX_EXAMPLES`] distinct examples each.
///
/// Ranking is by descending count; equal counts keep first-seen order.
pub(crate) struct Tally<K> {
    index: HashMap<K, usize>,
    entries: Vec<TallyEntry<K>>,
}

impl<K: Eq + Hash + Clone> Tally<K> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, key: &K, example: Option<String>) {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.entries.push(TallyEntry {
                    key: key.clone(),
                    count: 0,
                    examples: Vec::new(),
                });
                self.index.insert(key.clone(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[idx];
        entry.count += 1;
        if let Some(example) = example {
            if entry.examples.len() < rules::MAX_EXAMPLES && !entry.examples.contains(&example) {
                entry.examples.push(example);
            }
        }
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn ranked(mut self) -> Vec<TallyEntry<K>> {
        // sort_by is stable, so ties stay in first-seen order
        self.entries.sort_by(|a, b| b.count.cmp(&a.count));
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NormalizedTurn;

    fn session(tools: &[&str], user: &[&str]) -> NormalizedSession {
        let mut turns: Vec<NormalizedTurn> = user.iter().map(|u| NormalizedTurn::user(*u)).collect();
        turns.push(NormalizedTurn::assistant(
            tools.join(" | "),
            tools.iter().map(|t| t.to_string()).collect(),
        ));
        NormalizedSession {
            session_id: "s".to_string(),
            project: "p".to_string(),
            title: "t".to_string(),
            date: None,
            started_at: None,
            turn_count: user.len(),
            turns,
        }
    }

    #[test]
    fn test_tally_ranking_is_stable() {
        let mut tally = Tally::new();
        for key in ["b", "a", "a", "c", "b"] {
            tally.add(&key, Some(format!("ex-{key}")));
        }
        assert_eq!(tally.total(), 5);
        let ranked: Vec<(&str, usize)> = tally.ranked().iter().map(|e| (e.key, e.count)).collect();
        assert_eq!(ranked, vec![("b", 2), ("a", 2), ("c", 1)]);
    }

    #[test]
    fn test_tally_examples_are_distinct_and_capped() {
        let mut tally = Tally::new();
        for ex in ["x", "x", "y", "z", "w"] {
            tally.add(&"k", Some(ex.to_string()));
        }
        let ranked = tally.ranked();
        assert_eq!(ranked[0].count, 5);
        assert_eq!(ranked[0].examples, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_default_miner_groups_by_family() {
        let miner = create_default_miner(&MinerConfig::default());
        assert_eq!(
            miner.extractor_names(),
            vec!["tool_sequence", "prompt_template", "behavioral"]
        );

        let sessions: Vec<_> = (0..3)
            .map(|_| session(&["Read", "Edit", "Bash"], &["커밋해줘"]))
            .collect();
        let mined = miner.mine(&sessions);
        assert_eq!(mined.tool_sequences.len(), 1);
        assert!(mined
            .prompt_templates
            .iter()
            .any(|p| p.signature == "~해줘" && p.frequency == 3));
        assert!(!mined.behavioral.is_empty());
        assert_eq!(mined.len(), mined.iter().count());
    }

    #[test]
    fn test_threshold_invariant_holds() {
        let miner = create_default_miner(&MinerConfig::default());
        let sessions = vec![
            session(&["Read", "Edit", "Bash", "Read"], &["이거 고쳐줘", "테스트 돌려봐"]),
            session(&["Grep", "Read", "Edit"], &["여기 수정해줘"]),
        ];
        let mined = miner.mine(&sessions);
        for p in mined.tool_sequences.iter().chain(&mined.prompt_templates) {
            assert!(p.frequency >= 3, "{} below threshold", p.id);
        }
        for p in &mined.behavioral {
            assert!(p.frequency >= 1);
        }
    }

    #[test]
    fn test_complex_task_has_no_bucket() {
        let mut mined = MinedPatterns::default();
        let pattern = Pattern {
            id: "complex_1".to_string(),
            family: PatternFamily::ComplexTask,
            signature: "Task(Explore) chain".to_string(),
            frequency: 4,
            examples: vec![],
            confidence: 0.5,
        };
        assert!(!mined.push(pattern));
        assert!(mined.is_empty());
    }
}
