//! Text form of a normalized session.
//!
//! ```text
//! # Session: <title> (<YYYY-MM-DD | Unknown>)
//! Id: <session id>
//! Project: <project>
//! Turns: <user turn count>
//!
//! ---
//! U: <request>
//!   <request continuation>
//! C: <summary> | <summary>
//! ---
//! ```
//!
//! Continuation lines of a multi-line turn are indented by two spaces
//! so they never read back as a turn, a delimiter or a session header.

use crate::error::{Error, Result};
use crate::types::{NormalizedSession, NormalizedTurn};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

pub(crate) const SESSION_HEADER: &str = "# Session:";
const DELIMITER: &str = "---";
const UNKNOWN_DATE: &str = "Unknown";
const CONTINUATION: &str = "  ";

static HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^# Session: (.*) \(([^()]*)\)$").expect("valid header regex"));

static TOOL_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*(?:\.[A-Za-z0-9_-]+)?$").expect("valid tool regex")
});

impl NormalizedSession {
    /// Render the session document.
    pub fn render(&self) -> String {
        let date = self
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| UNKNOWN_DATE.to_string());

        let mut out = format!(
            "{} {} ({})\nId: {}\nProject: {}\nTurns: {}\n\n{}\n",
            SESSION_HEADER, self.title, date, self.session_id, self.project, self.turn_count, DELIMITER
        );
        for turn in &self.turns {
            out.push_str(turn.role.prefix());
            out.push(' ');
            for (i, line) in turn.text.split('\n').enumerate() {
                if i > 0 {
                    out.push('\n');
                    out.push_str(CONTINUATION);
                }
                out.push_str(line);
            }
            out.push('\n');
        }
        out.push_str(DELIMITER);
        out.push('\n');
        out
    }

    /// Size of the rendered document in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.render().len() as u64
    }

    /// Parse a rendered document back into a session.
    ///
    /// Tool names are recovered from the assistant summaries. A text-only
    /// assistant line that happens to look like `Word: ...` is read as a call
    /// to `Word`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().map(|l| l.trim_end_matches('\r'));

        let header = lines
            .by_ref()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| parse_error("empty document"))?;
        let caps = HEADER
            .captures(header)
            .ok_or_else(|| parse_error(format!("bad session header: {}", header)))?;
        let title = caps[1].to_string();
        let date = match &caps[2] {
            UNKNOWN_DATE => None,
            raw => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|e| parse_error(format!("bad session date {}: {}", raw, e)))?,
            ),
        };

        let mut session_id = String::new();
        let mut project = String::new();
        let mut turn_count = 0;
        let mut turns: Vec<NormalizedTurn> = Vec::new();
        let mut in_body = false;

        for line in lines {
            if line == DELIMITER {
                if in_body {
                    break;
                }
                in_body = true;
                continue;
            }

            if !in_body {
                if let Some(v) = line.strip_prefix("Id:") {
                    session_id = v.trim().to_string();
                } else if let Some(v) = line.strip_prefix("Project:") {
                    project = v.trim().to_string();
                } else if let Some(v) = line.strip_prefix("Turns:") {
                    turn_count = v
                        .trim()
                        .parse()
                        .map_err(|e| parse_error(format!("bad turn count {}: {}", v, e)))?;
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix("U:") {
                turns.push(NormalizedTurn::user(rest.strip_prefix(' ').unwrap_or(rest)));
            } else if let Some(rest) = line.strip_prefix("C:") {
                let text = rest.strip_prefix(' ').unwrap_or(rest);
                turns.push(NormalizedTurn::assistant(text, tools_from_summary(text)));
            } else if let Some(last) = turns.last_mut() {
                // Tools stay as recovered from the first line
                last.text.push('\n');
                last.text.push_str(line.strip_prefix(CONTINUATION).unwrap_or(line));
            }
        }

        if turns.is_empty() {
            return Err(parse_error(format!("session '{}' has no turns", title)));
        }

        Ok(Self {
            session_id,
            project,
            title,
            date,
            started_at: date
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
            turn_count,
            turns,
        })
    }
}

fn parse_error(message: impl Into<String>) -> Error {
    Error::Parse {
        source_name: "normalized document".to_string(),
        message: message.into(),
    }
}

/// Recover tool names from a ` | `-joined summary line.
fn tools_from_summary(text: &str) -> Vec<String> {
    text.split(" | ")
        .filter_map(|part| {
            let part = part.trim();
            if part.starts_with("Task(") {
                return Some("Task".to_string());
            }
            if part.starts_with("Todo:") {
                return Some("TodoWrite".to_string());
            }
            let candidate = part.split_once(':').map_or(part, |(name, _)| name);
            TOOL_NAME
                .is_match(candidate)
                .then(|| candidate.to_string())
        })
        .collect()
}

/// Split a file holding several documents at each session header.
pub fn split_documents(text: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = text
        .match_indices(SESSION_HEADER)
        .map(|(idx, _)| idx)
        .filter(|&idx| idx == 0 || text.as_bytes()[idx - 1] == b'\n')
        .collect();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }

    let mut docs = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        let doc = &text[start..end];
        if !doc.trim().is_empty() {
            docs.push(doc);
        }
    }
    docs
}
