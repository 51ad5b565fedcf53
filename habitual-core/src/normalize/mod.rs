//! Transcript normalization
//!
//! Reduces a [`RawSession`] to a [`NormalizedSession`]: one `U:` line per
//! user request and one `C:` line per assistant turn, where the assistant
//! line lists compact tool-call summaries.
//!
//! ## Turn rules
//!
//! - **User**: first text part, cleaned by [`clean::clean_user_text`].
//!   Requests that clean down to nothing are dropped.
//! - **Assistant**: every tool call is summarized in call order and the
//!   summaries are joined with ` | `. Text parts are ignored when at least one
//!   tool call exists; otherwise the first text part is kept, cut to
//!   [`ASSISTANT_TEXT_CHARS`] characters.
//! - **System** records never produce a turn.
//!
//! Normalization is a pure function of the raw session, so normalizing the
//! same session twice yields identical documents.

pub mod clean;
mod document;
pub mod summarizer;

pub use document::split_documents;
pub use summarizer::{create_default_registry, tool_label, SummarizerRegistry, ToolSummarizer};

use crate::types::{
    ContentPart, EventContent, EventRole, NormalizedSession, NormalizedTurn, RawEvent, RawSession,
};
use chrono::{DateTime, Utc};

/// Characters kept from a text-only assistant turn.
pub const ASSISTANT_TEXT_CHARS: usize = 50;
/// Maximum title length.
pub const TITLE_CHARS: usize = 50;
/// Title used when a session has no user request.
pub const DEFAULT_TITLE: &str = "Session";

/// Turns raw sessions into normalized documents.
pub struct Normalizer {
    registry: SummarizerRegistry,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(create_default_registry())
    }
}

impl Normalizer {
    pub fn new(registry: SummarizerRegistry) -> Self {
        Self { registry }
    }

    /// Normalize one session.
    ///
    /// Returns `None` when the session started before `cutoff` or when no
    /// turn survives normalization.
    pub fn normalize(
        &self,
        raw: &RawSession,
        cutoff: Option<DateTime<Utc>>,
    ) -> Option<NormalizedSession> {
        if let (Some(cutoff), Some(started_at)) = (cutoff, raw.started_at) {
            if started_at < cutoff {
                tracing::debug!(
                    session_id = %raw.session_id,
                    started_at = %started_at,
                    "Session predates cutoff"
                );
                return None;
            }
        }

        let turns: Vec<NormalizedTurn> = raw
            .events
            .iter()
            .filter_map(|event| self.normalize_event(event))
            .collect();

        if turns.is_empty() {
            tracing::debug!(session_id = %raw.session_id, "Session has no turns");
            return None;
        }

        let title = turns
            .iter()
            .find(|t| t.is_user())
            .map(|t| clean::truncate(&t.text, TITLE_CHARS))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let turn_count = turns.iter().filter(|t| t.is_user()).count();

        Some(NormalizedSession {
            session_id: raw.session_id.clone(),
            project: raw.project.clone(),
            title,
            date: raw.started_at.map(|ts| ts.date_naive()),
            started_at: raw.started_at,
            turn_count,
            turns,
        })
    }

    /// Normalize a single event, or `None` if it carries nothing worth keeping.
    pub fn normalize_event(&self, event: &RawEvent) -> Option<NormalizedTurn> {
        match event.role {
            EventRole::User => {
                let text = event.content.first_text()?;
                clean::clean_user_text(text).map(NormalizedTurn::user)
            }
            EventRole::Assistant => self.normalize_assistant(&event.content),
            EventRole::System => None,
        }
    }

    fn normalize_assistant(&self, content: &EventContent) -> Option<NormalizedTurn> {
        let mut summaries = Vec::new();
        let mut tools = Vec::new();

        if let EventContent::Parts(parts) = content {
            for part in parts {
                if let ContentPart::ToolUse { name, input } = part {
                    summaries.push(self.registry.summarize(name, input));
                    tools.push(self.registry.tool_name(name));
                }
            }
        }

        if !summaries.is_empty() {
            return Some(NormalizedTurn::assistant(summaries.join(" | "), tools));
        }

        let text = content.first_text()?.trim().replace('\n', " ");
        if text.is_empty() {
            return None;
        }
        let excerpt: String = text.chars().take(ASSISTANT_TEXT_CHARS).collect();
        Some(NormalizedTurn::assistant(excerpt, Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TurnRole;
    use chrono::TimeZone;
    use serde_json::json;
    use std::path::PathBuf;

    fn event(role: EventRole, content: EventContent) -> RawEvent {
        RawEvent {
            role,
            timestamp: None,
            content,
        }
    }

    fn tool(name: &str, input: serde_json::Value) -> ContentPart {
        ContentPart::ToolUse {
            name: name.to_string(),
            input,
        }
    }

    fn raw_session(events: Vec<RawEvent>) -> RawSession {
        RawSession {
            session_id: "abc".to_string(),
            project: "work/app".to_string(),
            events,
            started_at: Some(Utc.with_ymd_and_hms(2026, 1, 16, 9, 30, 0).unwrap()),
            source_path: PathBuf::from("abc.jsonl"),
        }
    }

    #[test]
    fn test_tool_calls_dominate_text() {
        let normalizer = Normalizer::default();
        let turn = normalizer
            .normalize_event(&event(
                EventRole::Assistant,
                EventContent::Parts(vec![
                    ContentPart::Text("Let me look.".to_string()),
                    tool("Read", json!({"file_path": "src/main.rs"})),
                    tool("Bash", json!({"command": "cargo build"})),
                ]),
            ))
            .unwrap();
        assert_eq!(turn.role, TurnRole::Assistant);
        assert_eq!(turn.text, "Read: src/main.rs | Bash: cargo build");
        assert_eq!(turn.tools, vec!["Read", "Bash"]);
    }

    #[test]
    fn test_text_only_assistant_turn_is_cut() {
        let normalizer = Normalizer::default();
        let long = "x".repeat(80);
        let turn = normalizer
            .normalize_event(&event(EventRole::Assistant, EventContent::Text(long)))
            .unwrap();
        assert_eq!(turn.text.chars().count(), ASSISTANT_TEXT_CHARS);
        assert!(turn.tools.is_empty());
    }

    #[test]
    fn test_empty_turns_are_dropped() {
        let normalizer = Normalizer::default();
        assert!(normalizer
            .normalize_event(&event(
                EventRole::Assistant,
                EventContent::Parts(vec![ContentPart::Other])
            ))
            .is_none());
        assert!(normalizer
            .normalize_event(&event(EventRole::User, EventContent::Text("  ".into())))
            .is_none());
        assert!(normalizer
            .normalize_event(&event(
                EventRole::System,
                EventContent::Text("system notice".into())
            ))
            .is_none());
    }

    #[test]
    fn test_user_takes_first_text_part() {
        let normalizer = Normalizer::default();
        let turn = normalizer
            .normalize_event(&event(
                EventRole::User,
                EventContent::Parts(vec![
                    ContentPart::Other,
                    ContentPart::Text("테스트 돌려봐".into()),
                    ContentPart::Text("ignored".into()),
                ]),
            ))
            .unwrap();
        assert_eq!(turn.text, "테스트 돌려봐");
    }

    #[test]
    fn test_session_assembly() {
        let normalizer = Normalizer::default();
        let raw = raw_session(vec![
            event(EventRole::User, EventContent::Text("이 파일 리팩토링해줘".into())),
            event(
                EventRole::Assistant,
                EventContent::Parts(vec![tool("Edit", json!({"file_path": "a.rs"}))]),
            ),
            event(EventRole::User, EventContent::Text("커밋해줘 지금".into())),
        ]);

        let session = normalizer.normalize(&raw, None).unwrap();
        assert_eq!(session.title, "이 파일 리팩토링해줘");
        assert_eq!(session.turn_count, 2);
        assert_eq!(session.turns.len(), 3);
        assert_eq!(session.date.unwrap().to_string(), "2026-01-16");
    }

    #[test]
    fn test_cutoff_and_empty_sessions() {
        let normalizer = Normalizer::default();
        let raw = raw_session(vec![event(
            EventRole::User,
            EventContent::Text("hello there".into()),
        )]);
        let cutoff = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        assert!(normalizer.normalize(&raw, Some(cutoff)).is_none());

        let empty = raw_session(vec![event(EventRole::User, EventContent::Text("hi".into()))]);
        assert!(normalizer.normalize(&empty, None).is_none());
    }

    #[test]
    fn test_title_defaults_without_user_turn() {
        let normalizer = Normalizer::default();
        let raw = raw_session(vec![event(
            EventRole::Assistant,
            EventContent::Parts(vec![tool("Glob", json!({"pattern": "*.rs"}))]),
        )]);
        let session = normalizer.normalize(&raw, None).unwrap();
        assert_eq!(session.title, DEFAULT_TITLE);
        assert_eq!(session.turn_count, 0);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let normalizer = Normalizer::default();
        let raw = raw_session(vec![
            event(EventRole::User, EventContent::Text("빌드 확인해줘".into())),
            event(
                EventRole::Assistant,
                EventContent::Parts(vec![tool("Bash", json!({"command": "make"}))]),
            ),
        ]);
        let first = normalizer.normalize(&raw, None).unwrap().render();
        let second = normalizer.normalize(&raw, None).unwrap().render();
        assert_eq!(first, second);
    }
}
