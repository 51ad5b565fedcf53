//! JSONL transcript reader
//!
//! Reads one session log (`<root>/<encoded-project>/<session>.jsonl`) into a
//! [`RawSession`].
//!
//! # Error Handling
//!
//! - **Malformed JSON lines**: recorded in [`TranscriptRead::warnings`] and
//!   skipped. The rest of the file is still read.
//! - **Unknown record types** (`summary`, `file-history-snapshot`, ...):
//!   skipped silently.
//! - **Missing timestamps**: the event keeps `None`; the session start is the
//!   earliest timestamp that did parse.
//! - **Unreadable file**: returned as `Err`, and the collector skips the session.

use crate::error::{Error, Result};
use crate::types::{ContentPart, EventContent, EventRole, RawEvent, RawSession};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Project label used when the parent directory cannot be decoded.
pub const UNKNOWN_PROJECT: &str = "Unknown";

// ============================================
// Raw JSONL record types (serde deserialization)
// ============================================

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawRecord {
    #[serde(rename = "type")]
    record_type: Option<String>,
    timestamp: Option<String>,
    is_sidechain: Option<bool>,
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawMessage {
    content: Option<RawContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    // Catch-all for tool results, images, thinking blocks, ...
    #[serde(other)]
    Unknown,
}

impl From<RawContent> for EventContent {
    fn from(raw: RawContent) -> Self {
        match raw {
            RawContent::Text(text) => EventContent::Text(text),
            RawContent::Blocks(blocks) => EventContent::Parts(
                blocks
                    .into_iter()
                    .map(|block| match block {
                        ContentBlock::Text { text } => ContentPart::Text(text),
                        ContentBlock::ToolUse { name, input } if !name.is_empty() => {
                            ContentPart::ToolUse { name, input }
                        }
                        _ => ContentPart::Other,
                    })
                    .collect(),
            ),
        }
    }
}

/// Result of reading one transcript.
#[derive(Debug)]
pub struct TranscriptRead {
    pub session: RawSession,
    /// Non-fatal problems, one per skipped line
    pub warnings: Vec<String>,
}

/// Read a transcript file.
pub fn read_transcript(path: &Path) -> Result<TranscriptRead> {
    let file = File::open(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open {}: {}", path.display(), e),
        ))
    })?;

    let mut events = Vec::new();
    let mut warnings = Vec::new();
    let mut started_at: Option<DateTime<Utc>> = None;

    for (idx, line_result) in BufReader::new(file).lines().enumerate() {
        let line_number = idx + 1;
        let line = match line_result {
            Ok(l) => l,
            Err(e) => {
                warnings.push(format!("Line {}: read error: {}", line_number, e));
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let record: RawRecord = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                warnings.push(format!("Line {}: JSON parse error: {}", line_number, e));
                continue;
            }
        };

        let timestamp = record
            .timestamp
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        if let Some(ts) = timestamp {
            started_at = Some(started_at.map_or(ts, |cur| cur.min(ts)));
        }

        // Sub-agent chatter has its own files
        if record.is_sidechain.unwrap_or(false) {
            continue;
        }

        let role = match record
            .record_type
            .as_deref()
            .and_then(|t| t.parse::<EventRole>().ok())
        {
            Some(role) => role,
            None => continue,
        };

        let content = record
            .message
            .and_then(|m| m.content)
            .map(EventContent::from)
            .unwrap_or_else(|| EventContent::Text(String::new()));

        events.push(RawEvent {
            role,
            timestamp,
            content,
        });
    }

    for warning in &warnings {
        tracing::warn!(path = %path.display(), "{}", warning);
    }

    Ok(TranscriptRead {
        session: RawSession {
            session_id: session_id_from_path(path),
            project: project_label(path),
            events,
            started_at,
            source_path: path.to_path_buf(),
        },
        warnings,
    })
}

/// Session identifier: the file stem.
pub fn session_id_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Project label decoded from the parent directory name.
///
/// The source encodes a working directory by replacing `/` with `-`, e.g.
/// `-Users-alice-work-app`. The home prefix is dropped and the remaining
/// dashes become slashes: `work/app`.
pub fn project_label(path: &Path) -> String {
    let Some(dir) = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
    else {
        return UNKNOWN_PROJECT.to_string();
    };

    let without_home = ["-Users-", "-home-"]
        .iter()
        .find_map(|prefix| dir.strip_prefix(prefix))
        .map(|rest| rest.split_once('-').map_or("", |(_, tail)| tail))
        .unwrap_or(dir);

    if without_home.is_empty() {
        return UNKNOWN_PROJECT.to_string();
    }
    without_home.replace('-', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_transcript(dir: &Path, project: &str, name: &str, lines: &[&str]) -> PathBuf {
        let project_dir = dir.join(project);
        std::fs::create_dir_all(&project_dir).unwrap();
        let path = project_dir.join(name);
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    #[test]
    fn test_read_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_transcript(
            dir.path(),
            "-Users-alice-work-app",
            "abc-123.jsonl",
            &[
                r#"{"type":"summary","summary":"old stuff"}"#,
                r#"{"type":"user","timestamp":"2026-01-16T10:00:00Z","message":{"role":"user","content":"이 파일 리팩토링해줘"}}"#,
                r#"{"type":"assistant","timestamp":"2026-01-16T10:00:05Z","message":{"content":[{"type":"thinking","thinking":"hmm"},{"type":"tool_use","id":"t1","name":"Read","input":{"file_path":"src/a.rs"}}]}}"#,
                r#"{"type":"user","timestamp":"2026-01-16T09:59:00Z","message":{"content":[{"type":"tool_result","tool_use_id":"t1","content":"ok"}]}}"#,
            ],
        );

        let read = read_transcript(&path).unwrap();
        let session = read.session;
        assert!(read.warnings.is_empty());
        assert_eq!(session.session_id, "abc-123");
        assert_eq!(session.project, "work/app");
        assert_eq!(session.events.len(), 3);
        assert_eq!(
            session.started_at.unwrap().to_rfc3339(),
            "2026-01-16T09:59:00+00:00"
        );
        match &session.events[1].content {
            EventContent::Parts(parts) => {
                assert_eq!(parts[0], ContentPart::Other);
                assert!(matches!(&parts[1], ContentPart::ToolUse { name, .. } if name == "Read"));
            }
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_transcript(
            dir.path(),
            "proj",
            "s.jsonl",
            &[
                "{not json",
                r#"{"type":"user","message":{"content":"still read this"}}"#,
                r#"{"type":"assistant","isSidechain":true,"message":{"content":"side"}}"#,
            ],
        );

        let read = read_transcript(&path).unwrap();
        assert_eq!(read.warnings.len(), 1);
        assert!(read.warnings[0].starts_with("Line 1"));
        assert_eq!(read.session.events.len(), 1);
        assert_eq!(read.session.started_at, None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_transcript(&dir.path().join("nope.jsonl")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_project_label() {
        let label = |dir: &str| project_label(&Path::new(dir).join("s.jsonl"));
        assert_eq!(label("/x/-Users-alice-work-app"), "work/app");
        assert_eq!(label("/x/-home-bob-src-tool"), "src/tool");
        assert_eq!(label("/x/-tmp-scratch"), "/tmp/scratch");
        assert_eq!(label("/x/-Users-alice"), UNKNOWN_PROJECT);
    }
}
