//! On-disk artifacts of a pipeline run
//!
//! Everything lives under one output directory:
//!
//! ```text
//! <output>/
//! ├── sessions/<session_id>.txt          normalized documents
//! ├── patterns/tool_sequences.json       mined patterns, one file per family
//! ├── patterns/prompt_templates.json
//! ├── patterns/behavioral.json
//! ├── classified/classified_patterns.json
//! └── proposals/                         see [`crate::proposal`]
//! ```
//!
//! Files are rewritten wholesale on every run. Readers are lenient: a missing
//! file is an empty result, and a corrupt pattern file is logged and skipped.

use crate::error::Result;
use crate::mining::MinedPatterns;
use crate::normalize::split_documents;
use crate::prioritize;
use crate::types::{ClassifiedSuggestion, NormalizedSession, Pattern, Priority, SuggestionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const SESSIONS_DIR: &str = "sessions";
pub const PATTERNS_DIR: &str = "patterns";
pub const CLASSIFIED_DIR: &str = "classified";
pub const PROPOSALS_DIR: &str = "proposals";

pub const TOOL_SEQUENCES_FILE: &str = "tool_sequences.json";
pub const PROMPT_TEMPLATES_FILE: &str = "prompt_templates.json";
pub const BEHAVIORAL_FILE: &str = "behavioral.json";
pub const CLASSIFIED_FILE: &str = "classified_patterns.json";

const DOCUMENT_EXTENSION: &str = "txt";

// ============================================
// Normalized documents
// ============================================

/// Write each session as `<session_id>.txt`. Returns the written paths.
pub fn write_documents(dir: &Path, sessions: &[NormalizedSession]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut paths = Vec::with_capacity(sessions.len());
    for session in sessions {
        let path = dir.join(format!(
            "{}.{}",
            file_stem(&session.session_id),
            DOCUMENT_EXTENSION
        ));
        fs::write(&path, session.render())?;
        paths.push(path);
    }

    tracing::debug!(dir = %dir.display(), count = paths.len(), "Wrote session documents");
    Ok(paths)
}

/// Parse every document in every `.txt` file under `dir`, in file-name order.
///
/// A file may hold several documents. Unreadable files and unparseable
/// documents are logged and skipped.
pub fn load_documents(dir: &Path) -> Result<Vec<NormalizedSession>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == DOCUMENT_EXTENSION))
        .collect();
    files.sort();

    let mut sessions = Vec::new();
    for path in files {
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable document");
                continue;
            }
        };

        for document in split_documents(&text) {
            match NormalizedSession::parse(document) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping malformed document")
                }
            }
        }
    }

    Ok(sessions)
}

fn file_stem(session_id: &str) -> String {
    session_id
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

// ============================================
// Pattern files
// ============================================

#[derive(Serialize)]
struct PatternFileOut<'a> {
    extracted_at: DateTime<Utc>,
    count: usize,
    patterns: &'a [Pattern],
}

#[derive(Deserialize)]
struct PatternFileIn {
    #[serde(default)]
    patterns: Vec<Pattern>,
}

/// Write one JSON file per family. Returns the written paths.
pub fn save_patterns(
    dir: &Path,
    mined: &MinedPatterns,
    extracted_at: DateTime<Utc>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let families: [(&str, &[Pattern]); 3] = [
        (TOOL_SEQUENCES_FILE, mined.tool_sequences.as_slice()),
        (PROMPT_TEMPLATES_FILE, mined.prompt_templates.as_slice()),
        (BEHAVIORAL_FILE, mined.behavioral.as_slice()),
    ];

    let mut paths = Vec::with_capacity(families.len());
    for (file_name, patterns) in families {
        let path = dir.join(file_name);
        let file = PatternFileOut {
            extracted_at,
            count: patterns.len(),
            patterns,
        };
        fs::write(&path, serde_json::to_string_pretty(&file)?)?;
        paths.push(path);
    }

    tracing::info!(dir = %dir.display(), count = mined.len(), "Saved mined patterns");
    Ok(paths)
}

/// Read the three family files. Missing or corrupt files contribute nothing.
pub fn load_patterns(dir: &Path) -> MinedPatterns {
    MinedPatterns {
        tool_sequences: load_pattern_file(&dir.join(TOOL_SEQUENCES_FILE)),
        prompt_templates: load_pattern_file(&dir.join(PROMPT_TEMPLATES_FILE)),
        behavioral: load_pattern_file(&dir.join(BEHAVIORAL_FILE)),
    }
}

fn load_pattern_file(path: &Path) -> Vec<Pattern> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read pattern file");
            return Vec::new();
        }
    };

    match serde_json::from_str::<PatternFileIn>(&content) {
        Ok(file) => file.patterns,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt pattern file");
            Vec::new()
        }
    }
}

// ============================================
// Classified suggestions
// ============================================

#[derive(Serialize)]
struct ClassifiedFileOut<'a> {
    classified_at: DateTime<Utc>,
    total_count: usize,
    by_priority: BTreeMap<&'static str, usize>,
    by_type: BTreeMap<&'static str, usize>,
    patterns: BTreeMap<&'static str, Vec<&'a ClassifiedSuggestion>>,
}

#[derive(Deserialize)]
struct ClassifiedFileIn {
    #[serde(default)]
    patterns: BTreeMap<String, Vec<ClassifiedSuggestion>>,
}

/// Write `classified_patterns.json` with per-priority and per-type totals.
pub fn save_classified(
    dir: &Path,
    suggestions: &[ClassifiedSuggestion],
    classified_at: DateTime<Utc>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let by_priority = Priority::ALL
        .iter()
        .map(|p| (p.as_str(), prioritize::count(suggestions, *p)))
        .collect();

    let mut patterns: BTreeMap<&'static str, Vec<&ClassifiedSuggestion>> = SuggestionType::ALL
        .iter()
        .map(|t| (t.as_str(), Vec::new()))
        .collect();
    for suggestion in suggestions {
        patterns
            .entry(suggestion.suggestion_type.as_str())
            .or_default()
            .push(suggestion);
    }
    let by_type = patterns.iter().map(|(t, list)| (*t, list.len())).collect();

    let file = ClassifiedFileOut {
        classified_at,
        total_count: suggestions.len(),
        by_priority,
        by_type,
        patterns,
    };

    let path = dir.join(CLASSIFIED_FILE);
    fs::write(&path, serde_json::to_string_pretty(&file)?)?;
    tracing::info!(path = %path.display(), count = suggestions.len(), "Saved classified suggestions");
    Ok(path)
}

/// Read `classified_patterns.json` back in priority order.
///
/// A missing file is an empty list. A corrupt file is an error.
pub fn load_classified(dir: &Path) -> Result<Vec<ClassifiedSuggestion>> {
    let path = dir.join(CLASSIFIED_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No classified suggestions file");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let file: ClassifiedFileIn = serde_json::from_str(&content)?;
    let mut suggestions: Vec<ClassifiedSuggestion> = file.patterns.into_values().flatten().collect();
    prioritize::sort_suggestions(&mut suggestions);
    Ok(suggestions)
}
