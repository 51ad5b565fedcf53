//! Core domain types for habitual
//!
//! Data moves through four shapes:
//!
//! | Shape | Produced by | Consumed by |
//! |-------|-------------|-------------|
//! | [`RawSession`] / [`RawEvent`] | transcript reader | normalizer |
//! | [`NormalizedSession`] | normalizer | collector, miner |
//! | [`Pattern`] | miner | classifier |
//! | [`ClassifiedSuggestion`] | classifier, prioritizer | proposal generator |
//!
//! Raw events are read-only views of the transcript source. Everything
//! downstream is derived, immutable once built, and regenerable from disk.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================
// Raw transcript events
// ============================================

/// Who produced a transcript record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventRole {
    User,
    Assistant,
    System,
}

impl EventRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventRole::User => "user",
            EventRole::Assistant => "assistant",
            EventRole::System => "system",
        }
    }
}

impl std::str::FromStr for EventRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(EventRole::User),
            "assistant" => Ok(EventRole::Assistant),
            "system" => Ok(EventRole::System),
            _ => Err(format!("unknown event role: {}", s)),
        }
    }
}

/// One typed part of a structured payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    /// Literal text
    Text(String),
    /// A tool invocation with its argument map
    ToolUse {
        name: String,
        input: serde_json::Value,
    },
    /// Anything else (tool results, images, unknown blocks)
    Other,
}

/// Payload of a transcript record.
#[derive(Debug, Clone, PartialEq)]
pub enum EventContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl EventContent {
    /// First literal text in the payload, if any.
    pub fn first_text(&self) -> Option<&str> {
        match self {
            EventContent::Text(text) => Some(text.as_str()),
            EventContent::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::Text(text) => Some(text.as_str()),
                _ => None,
            }),
        }
    }
}

/// A single record from a transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub role: EventRole,
    pub timestamp: Option<DateTime<Utc>>,
    pub content: EventContent,
}

/// All records of one transcript file.
#[derive(Debug, Clone)]
pub struct RawSession {
    /// File stem of the transcript
    pub session_id: String,
    /// Project label decoded from the parent directory
    pub project: String,
    /// Events in file order
    pub events: Vec<RawEvent>,
    /// Earliest parseable timestamp
    pub started_at: Option<DateTime<Utc>>,
    /// Where the transcript was read from
    pub source_path: PathBuf,
}

// ============================================
// Normalized sessions
// ============================================

/// Role marker of a normalized line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnRole {
    /// `U:` a user request
    User,
    /// `C:` an assistant turn
    Assistant,
}

impl TurnRole {
    /// The line prefix used in normalized documents.
    pub fn prefix(&self) -> &'static str {
        match self {
            TurnRole::User => "U:",
            TurnRole::Assistant => "C:",
        }
    }
}

/// One compressed line of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTurn {
    pub role: TurnRole,
    /// Cleaned user text, or the ` | `-joined tool summaries (or a short text
    /// excerpt when the assistant made no tool calls)
    pub text: String,
    /// Tool names invoked in this turn, in call order. Empty for user turns.
    pub tools: Vec<String>,
}

impl NormalizedTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            tools: Vec::new(),
        }
    }

    pub fn assistant(text: impl Into<String>, tools: Vec<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            tools,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }
}

/// A compressed session document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSession {
    pub session_id: String,
    pub project: String,
    /// First user request, truncated
    pub title: String,
    /// Date of the earliest timestamp
    pub date: Option<NaiveDate>,
    /// Earliest timestamp, used for newest-first ordering
    pub started_at: Option<DateTime<Utc>>,
    /// Number of user turns
    pub turn_count: usize,
    pub turns: Vec<NormalizedTurn>,
}

impl NormalizedSession {
    /// Iterate over user request texts.
    pub fn user_messages(&self) -> impl Iterator<Item = &str> {
        self.turns
            .iter()
            .filter(|t| t.is_user())
            .map(|t| t.text.as_str())
    }

    /// Tool names across all assistant turns, turn boundaries removed.
    pub fn tool_sequence(&self) -> Vec<&str> {
        self.turns
            .iter()
            .filter(|t| !t.is_user())
            .flat_map(|t| t.tools.iter().map(String::as_str))
            .collect()
    }
}

// ============================================
// Patterns
// ============================================

/// Which extractor produced a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternFamily {
    ToolSequence,
    PromptTemplate,
    Behavioral,
    /// Reserved for multi-step delegation patterns. No extractor emits it yet.
    ComplexTask,
}

impl PatternFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternFamily::ToolSequence => "tool_sequence",
            PatternFamily::PromptTemplate => "prompt_template",
            PatternFamily::Behavioral => "behavioral",
            PatternFamily::ComplexTask => "complex_task",
        }
    }
}

impl std::fmt::Display for PatternFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PatternFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tool_sequence" => Ok(PatternFamily::ToolSequence),
            "prompt_template" => Ok(PatternFamily::PromptTemplate),
            "behavioral" => Ok(PatternFamily::Behavioral),
            "complex_task" => Ok(PatternFamily::ComplexTask),
            _ => Err(format!("unknown pattern family: {}", s)),
        }
    }
}

/// A mined candidate.
///
/// Field names on the wire follow the pattern files consumed by the
/// classifier (`type`, `pattern`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Stable within a run (e.g. `tool_seq_1`)
    pub id: String,
    #[serde(rename = "type")]
    pub family: PatternFamily,
    /// Canonical form, e.g. `Read → Edit → Bash` or `~해줘`
    #[serde(rename = "pattern")]
    pub signature: String,
    pub frequency: usize,
    /// Up to three literal occurrences
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub confidence: f64,
}

// ============================================
// Suggestions
// ============================================

/// What kind of automation a pattern should become.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    Skill,
    SlashCommand,
    Agent,
    ClaudeMdRule,
    Unknown,
}

impl SuggestionType {
    /// All types in reporting order.
    pub const ALL: [SuggestionType; 5] = [
        SuggestionType::Skill,
        SuggestionType::SlashCommand,
        SuggestionType::Agent,
        SuggestionType::ClaudeMdRule,
        SuggestionType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionType::Skill => "skill",
            SuggestionType::SlashCommand => "slash_command",
            SuggestionType::Agent => "agent",
            SuggestionType::ClaudeMdRule => "claude_md_rule",
            SuggestionType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SuggestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SuggestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SuggestionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown suggestion type: {}", s))
    }
}

/// Discrete priority tier. Declaration order is rank order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Priority {
    P1,
    P2,
    #[default]
    P3,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::P1, Priority::P2, Priority::P3];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
        }
    }

    /// 0 for P1, 1 for P2, 2 for P3.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::P1 => 0,
            Priority::P2 => 1,
            Priority::P3 => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::P1 => "Priority 1 (High Impact, Easy)",
            Priority::P2 => "Priority 2 (High Impact, Medium Effort)",
            Priority::P3 => "Priority 3 (Nice to Have)",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classified, named, prioritized pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedSuggestion {
    pub pattern_id: String,
    pub pattern_type: PatternFamily,
    /// The pattern's signature
    pub pattern: String,
    pub frequency: usize,
    #[serde(default)]
    pub examples: Vec<String>,
    /// Recomputed score, not the miner's raw confidence
    pub confidence: f64,
    pub suggestion_type: SuggestionType,
    pub suggested_name: String,
    pub reason: String,
    #[serde(default)]
    pub priority: Priority,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_wire_names() {
        let pattern = Pattern {
            id: "tool_seq_1".to_string(),
            family: PatternFamily::ToolSequence,
            signature: "Read → Edit → Bash".to_string(),
            frequency: 3,
            examples: vec![],
            confidence: 1.0,
        };
        let json = serde_json::to_value(&pattern).unwrap();
        assert_eq!(json["type"], "tool_sequence");
        assert_eq!(json["pattern"], "Read → Edit → Bash");
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::P1 < Priority::P2);
        assert!(Priority::P2 < Priority::P3);
        assert_eq!(Priority::default(), Priority::P3);
        assert_eq!(serde_json::to_value(Priority::P2).unwrap(), "P2");
    }

    #[test]
    fn test_suggestion_type_from_str() {
        assert_eq!(
            "slash_command".parse::<SuggestionType>(),
            Ok(SuggestionType::SlashCommand)
        );
        assert!("macro".parse::<SuggestionType>().is_err());
    }

    #[test]
    fn test_tool_sequence_spans_turns() {
        let session = NormalizedSession {
            session_id: "s".to_string(),
            project: "p".to_string(),
            title: "t".to_string(),
            date: None,
            started_at: None,
            turn_count: 1,
            turns: vec![
                NormalizedTurn::assistant("Read: a", vec!["Read".to_string()]),
                NormalizedTurn::user("수정해줘"),
                NormalizedTurn::assistant(
                    "Edit: a | Bash: ls",
                    vec!["Edit".to_string(), "Bash".to_string()],
                ),
            ],
        };
        assert_eq!(session.tool_sequence(), vec!["Read", "Edit", "Bash"]);
        assert_eq!(session.user_messages().collect::<Vec<_>>(), vec!["수정해줘"]);
    }
}
