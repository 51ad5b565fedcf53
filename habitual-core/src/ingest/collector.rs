//! Session collection
//!
//! Walks the transcript root, drops excluded and stale sessions, normalizes
//! the rest newest-first and keeps them until the byte budget is spent.
//!
//! The budget cut is greedy: the first session that would push the total past
//! the budget ends collection, even if an older, smaller session would still
//! fit.

use super::transcript::read_transcript;
use crate::config::CollectorConfig;
use crate::error::{Error, Result};
use crate::normalize::Normalizer;
use crate::types::{NormalizedSession, RawSession};
use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Glob for session logs, relative to the transcript root.
pub const SESSION_GLOB: &str = "*/*.jsonl";

/// Outcome of one collection pass.
#[derive(Debug, Default)]
pub struct CollectResult {
    /// Normalized sessions, newest first
    pub sessions: Vec<NormalizedSession>,
    /// Cumulative rendered size of `sessions`
    pub total_bytes: u64,
    /// Transcript files found before any filtering
    pub files_found: usize,
    /// Sessions dropped by exclusion, recency, emptiness or the budget
    pub sessions_skipped: usize,
    /// Non-fatal problems encountered along the way
    pub warnings: Vec<String>,
}

/// Collects normalized sessions from a transcript root.
pub struct SessionCollector {
    root: PathBuf,
    days: u32,
    limit_bytes: u64,
    exclude_patterns: Vec<String>,
    normalizer: Normalizer,
}

impl SessionCollector {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            root: config.source_dir(),
            days: config.days,
            limit_bytes: config.limit_bytes(),
            exclude_patterns: config.exclude_patterns.clone(),
            normalizer: Normalizer::default(),
        }
    }

    /// Use a custom normalizer (e.g. with extra tool summarizers).
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Transcript files under the root, excluded names removed.
    pub fn discover_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            tracing::info!(root = %self.root.display(), "Transcript root does not exist");
            return Ok(Vec::new());
        }

        let pattern = self.root.join(SESSION_GLOB);
        let entries = glob::glob(&pattern.to_string_lossy()).map_err(|e| Error::Parse {
            source_name: self.root.display().to_string(),
            message: format!("Invalid glob pattern: {}", e),
        })?;

        let mut files: Vec<PathBuf> = entries.flatten().collect();
        files.sort();
        Ok(files)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        self.exclude_patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && name.contains(pattern.as_str()))
    }

    /// Run one collection pass relative to `now`.
    pub fn collect(&self, now: DateTime<Utc>) -> Result<CollectResult> {
        let files = self.discover_files()?;
        let cutoff = now - Duration::days(i64::from(self.days));
        let mut result = CollectResult {
            files_found: files.len(),
            ..Default::default()
        };

        let mut raw_sessions: Vec<RawSession> = Vec::new();
        for path in files {
            if self.is_excluded(&path) {
                tracing::trace!(path = %path.display(), "Excluded session file");
                result.sessions_skipped += 1;
                continue;
            }

            let read = match read_transcript(&path) {
                Ok(read) => read,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable session");
                    result
                        .warnings
                        .push(format!("{}: {}", path.display(), e));
                    result.sessions_skipped += 1;
                    continue;
                }
            };
            result.warnings.extend(
                read.warnings
                    .into_iter()
                    .map(|w| format!("{}: {}", path.display(), w)),
            );

            let session = read.session;
            if session.started_at.is_some_and(|ts| ts < cutoff) || session.events.is_empty() {
                result.sessions_skipped += 1;
                continue;
            }
            raw_sessions.push(session);
        }

        raw_sessions.sort_by(|a, b| newest_first(a.started_at, b.started_at));

        let normalized = raw_sessions.iter().filter_map(|raw| {
            let session = self.normalizer.normalize(raw, Some(cutoff));
            if session.is_none() {
                result.sessions_skipped += 1;
            }
            session
        });
        let normalized: Vec<NormalizedSession> = normalized.collect();
        let candidates = normalized.len();

        let (sessions, total_bytes) =
            take_within_budget(normalized, self.limit_bytes, |s| s.size_bytes());
        result.sessions_skipped += candidates - sessions.len();
        result.sessions = sessions;
        result.total_bytes = total_bytes;

        tracing::info!(
            files_found = result.files_found,
            collected = result.sessions.len(),
            skipped = result.sessions_skipped,
            total_bytes = result.total_bytes,
            limit_bytes = self.limit_bytes,
            "Session collection complete"
        );

        Ok(result)
    }
}

/// Descending by timestamp; sessions without one go last.
fn newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Keep items in order until the next one would exceed `limit`.
///
/// Returns the kept items and their total size.
pub fn take_within_budget<T>(
    items: impl IntoIterator<Item = T>,
    limit: u64,
    size_of: impl Fn(&T) -> u64,
) -> (Vec<T>, u64) {
    let mut kept = Vec::new();
    let mut total = 0u64;
    for item in items {
        let size = size_of(&item);
        if total + size > limit {
            break;
        }
        total += size;
        kept.push(item);
    }
    (kept, total)
}

/// Combined analysis document for a set of collected sessions.
pub fn render_analysis_input(sessions: &[NormalizedSession]) -> String {
    if sessions.is_empty() {
        return "No sessions collected.".to_string();
    }

    let total_turns: usize = sessions.iter().map(|s| s.turn_count).sum();
    let total_bytes: u64 = sessions.iter().map(|s| s.size_bytes()).sum();
    let date_of = |s: &NormalizedSession| {
        s.date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    };
    // Sessions are newest-first
    let newest = sessions.first().map(date_of).unwrap_or_default();
    let oldest = sessions.last().map(date_of).unwrap_or_default();

    let header = format!(
        "# Session Analysis Data\nSessions: {}\nTotal Turns: {}\nTotal Size: {:.1}KB\nPeriod: {} ~ {}\n\n",
        sessions.len(),
        total_turns,
        total_bytes as f64 / 1024.0,
        oldest,
        newest
    );

    let body = sessions
        .iter()
        .map(NormalizedSession::render)
        .collect::<Vec<_>>()
        .join("\n\n");

    header + &body
}
