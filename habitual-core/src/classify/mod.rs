//! Pattern classification
//!
//! Maps each mined [`Pattern`] to the kind of automation that would replace
//! it, re-scores its confidence for that kind and gives it a name.
//!
//! | Family | Suggestion | Condition |
//! |--------|------------|-----------|
//! | `tool_sequence` | `skill` | frequency >= `min_skill_frequency` |
//! | `prompt_template` | `slash_command` | frequency >= `min_slash_frequency` |
//! | `behavioral` | `claude_md_rule` | always |
//! | `complex_task` | `agent` | delegates to `Task`, or spans 10+ turns |
//!
//! Anything that misses its condition is classified `unknown`. Priorities are
//! assigned later by [`crate::prioritize`].

pub mod naming;
pub mod scoring;

pub use naming::suggested_name;
pub use scoring::score_confidence;

use crate::config::ClassifierConfig;
use crate::mining::MinedPatterns;
use crate::types::{ClassifiedSuggestion, Pattern, PatternFamily, Priority, SuggestionType};
use once_cell::sync::Lazy;
use regex::Regex;

/// Turn count an example must encode for a complex task to become an agent.
pub const AGENT_MIN_TURNS: u64 = 10;

static TURN_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:턴|turns?)").expect("valid turn count regex"));

pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify one pattern. The result carries the default priority.
    pub fn classify(&self, pattern: &Pattern) -> ClassifiedSuggestion {
        let (suggestion_type, reason) = self.decide(pattern);

        let confidence = score_confidence(
            pattern.confidence,
            pattern.frequency,
            pattern.examples.len(),
            pattern.signature.chars().count(),
            suggestion_type,
        );

        ClassifiedSuggestion {
            pattern_id: pattern.id.clone(),
            pattern_type: pattern.family,
            pattern: pattern.signature.clone(),
            frequency: pattern.frequency,
            examples: pattern.examples.clone(),
            confidence,
            suggestion_type,
            suggested_name: suggested_name(pattern, suggestion_type),
            reason,
            priority: Priority::default(),
        }
    }

    /// Classify every mined pattern in family order.
    pub fn classify_all(&self, mined: &MinedPatterns) -> Vec<ClassifiedSuggestion> {
        let classified: Vec<_> = mined.iter().map(|p| self.classify(p)).collect();
        tracing::info!(
            count = classified.len(),
            unknown = classified
                .iter()
                .filter(|c| c.suggestion_type == SuggestionType::Unknown)
                .count(),
            "Classified patterns"
        );
        classified
    }

    fn decide(&self, pattern: &Pattern) -> (SuggestionType, String) {
        let frequency = pattern.frequency;
        match pattern.family {
            PatternFamily::ToolSequence => {
                let min = self.config.min_skill_frequency;
                if frequency >= min {
                    (
                        SuggestionType::Skill,
                        format!("tool sequence repeated {frequency} times; can be automated"),
                    )
                } else {
                    (
                        SuggestionType::Unknown,
                        format!("tool sequence below frequency threshold ({frequency} < {min})"),
                    )
                }
            }
            PatternFamily::PromptTemplate => {
                let min = self.config.min_slash_frequency;
                if frequency >= min {
                    (
                        SuggestionType::SlashCommand,
                        format!(
                            "prompt template repeated {frequency} times; can become a command"
                        ),
                    )
                } else {
                    (
                        SuggestionType::Unknown,
                        format!(
                            "prompt template below frequency threshold ({frequency} < {min})"
                        ),
                    )
                }
            }
            PatternFamily::Behavioral => (
                SuggestionType::ClaudeMdRule,
                "consistent behavior; add as a CLAUDE.md rule".to_string(),
            ),
            PatternFamily::ComplexTask => {
                if delegates_to_task(pattern) || spans_many_turns(pattern) {
                    (
                        SuggestionType::Agent,
                        "complex multi-step pattern; suited to a sub-agent".to_string(),
                    )
                } else {
                    (
                        SuggestionType::Unknown,
                        "complex task without delegation or long sessions".to_string(),
                    )
                }
            }
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

fn delegates_to_task(pattern: &Pattern) -> bool {
    pattern.signature.to_lowercase().contains("task")
        || pattern
            .examples
            .iter()
            .any(|e| e.to_lowercase().contains("task("))
}

fn spans_many_turns(pattern: &Pattern) -> bool {
    pattern.examples.iter().any(|example| {
        TURN_COUNT
            .captures_iter(example)
            .filter_map(|caps| caps[1].parse::<u64>().ok())
            .any(|turns| turns >= AGENT_MIN_TURNS)
    })
}
