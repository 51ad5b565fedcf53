//! End-to-end pipeline
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌──────────┐   ┌────────────┐   ┌─────────────┐
//! │  Transcripts │ ► │ Collector  │ ► │  Miner   │ ► │ Classifier │ ► │  Proposals  │
//! │ (*.jsonl)    │   │ normalize  │   │ patterns │   │ prioritize │   │ json + md   │
//! └──────────────┘   └────────────┘   └──────────┘   └────────────┘   └─────────────┘
//!                        │                 │               │                 │
//!                        ▼                 ▼               ▼                 ▼
//!                   sessions/         patterns/       classified/       proposals/
//! ```
//!
//! Each stage writes its artifact under the output directory (see
//! [`crate::store`]) so later stages can be re-run on their own with
//! [`classify_stored`] and [`propose_stored`].
//!
//! Empty upstream results are reported as outcomes, not errors.

use crate::classify::Classifier;
use crate::config::{ClassifierConfig, Config};
use crate::error::Result;
use crate::ingest::{CollectResult, SessionCollector};
use crate::mining::{create_default_miner, MinedPatterns};
use crate::prioritize::{self, prioritize};
use crate::proposal::{generate_proposals, save_proposals, ProposalPaths};
use crate::store;
use crate::types::{ClassifiedSuggestion, Priority};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Options for one [`Pipeline::run`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Stop after classification; no proposals are written
    pub dry_run: bool,
}

/// Suggestion counts per priority tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    #[serde(rename = "P1")]
    pub p1: usize,
    #[serde(rename = "P2")]
    pub p2: usize,
    #[serde(rename = "P3")]
    pub p3: usize,
}

impl PriorityCounts {
    pub fn from_suggestions(suggestions: &[ClassifiedSuggestion]) -> Self {
        Self {
            p1: prioritize::count(suggestions, Priority::P1),
            p2: prioritize::count(suggestions, Priority::P2),
            p3: prioritize::count(suggestions, Priority::P3),
        }
    }
}

/// Mined pattern counts per family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PatternCounts {
    pub tool_sequences: usize,
    pub prompt_templates: usize,
    pub behavioral: usize,
}

impl From<&MinedPatterns> for PatternCounts {
    fn from(mined: &MinedPatterns) -> Self {
        Self {
            tool_sequences: mined.tool_sequences.len(),
            prompt_templates: mined.prompt_templates.len(),
            behavioral: mined.behavioral.len(),
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub files_found: usize,
    pub sessions_collected: usize,
    pub sessions_skipped: usize,
    pub total_bytes: u64,
    pub patterns: PatternCounts,
    pub suggestions: usize,
    pub by_priority: PriorityCounts,
    /// Top suggestions in priority order
    pub top: Vec<ClassifiedSuggestion>,
    pub output_dir: PathBuf,
    pub classified_path: PathBuf,
    /// `None` on a dry run
    pub proposals: Option<ProposalPaths>,
    pub warnings: Vec<String>,
}

/// How many suggestions a summary carries.
pub const SUMMARY_TOP_N: usize = 5;

#[derive(Debug)]
pub enum RunOutcome {
    /// Nothing survived collection; no artifacts were written.
    NoSessions {
        files_found: usize,
        warnings: Vec<String>,
    },
    Completed(RunSummary),
}

#[derive(Debug)]
pub enum ClassifyOutcome {
    /// No pattern files, or all of them empty
    NoPatterns,
    Classified {
        suggestions: usize,
        by_priority: PriorityCounts,
        path: PathBuf,
    },
}

#[derive(Debug)]
pub enum ProposeOutcome {
    /// No classified suggestions file, or an empty one
    NoSuggestions,
    Proposed { proposals: usize, paths: ProposalPaths },
}

/// Runs every stage against one output directory.
pub struct Pipeline {
    config: Config,
    output_dir: PathBuf,
}

impl Pipeline {
    /// Pipeline writing to [`Config::output_dir`].
    pub fn new(config: Config) -> Self {
        Self {
            config,
            output_dir: Config::output_dir(),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Collect only. Nothing is written.
    pub fn collect_at(&self, now: DateTime<Utc>) -> Result<CollectResult> {
        SessionCollector::new(&self.config.collector).collect(now)
    }

    pub fn run(&self, options: RunOptions) -> Result<RunOutcome> {
        self.run_at(options, Utc::now())
    }

    /// Run relative to a fixed `now`, which drives the recency cutoff and
    /// every artifact timestamp.
    pub fn run_at(&self, options: RunOptions, now: DateTime<Utc>) -> Result<RunOutcome> {
        let collected = self.collect_at(now)?;
        tracing::info!(
            files = collected.files_found,
            sessions = collected.sessions.len(),
            skipped = collected.sessions_skipped,
            bytes = collected.total_bytes,
            "Collected sessions"
        );

        if collected.sessions.is_empty() {
            return Ok(RunOutcome::NoSessions {
                files_found: collected.files_found,
                warnings: collected.warnings,
            });
        }

        store::write_documents(
            &self.output_dir.join(store::SESSIONS_DIR),
            &collected.sessions,
        )?;

        let mined = create_default_miner(&self.config.miner).mine(&collected.sessions);
        store::save_patterns(&self.output_dir.join(store::PATTERNS_DIR), &mined, now)?;

        let suggestions = classify_and_prioritize(&mined, &self.config.classifier);
        let classified_path = store::save_classified(
            &self.output_dir.join(store::CLASSIFIED_DIR),
            &suggestions,
            now,
        )?;

        let proposals = if options.dry_run {
            tracing::info!("Dry run, skipping proposals");
            None
        } else {
            let proposals = generate_proposals(&suggestions);
            Some(save_proposals(
                &self.output_dir.join(store::PROPOSALS_DIR),
                &proposals,
                now,
            )?)
        };

        Ok(RunOutcome::Completed(RunSummary {
            files_found: collected.files_found,
            sessions_collected: collected.sessions.len(),
            sessions_skipped: collected.sessions_skipped,
            total_bytes: collected.total_bytes,
            patterns: PatternCounts::from(&mined),
            suggestions: suggestions.len(),
            by_priority: PriorityCounts::from_suggestions(&suggestions),
            top: suggestions.iter().take(SUMMARY_TOP_N).cloned().collect(),
            output_dir: self.output_dir.clone(),
            classified_path,
            proposals,
            warnings: collected.warnings,
        }))
    }
}

fn classify_and_prioritize(
    mined: &MinedPatterns,
    config: &ClassifierConfig,
) -> Vec<ClassifiedSuggestion> {
    prioritize(Classifier::new(config.clone()).classify_all(mined))
}

/// Classify the pattern files under `dir/patterns` into `dir/classified`.
pub fn classify_stored(
    dir: &Path,
    config: &ClassifierConfig,
    now: DateTime<Utc>,
) -> Result<ClassifyOutcome> {
    let mined = store::load_patterns(&dir.join(store::PATTERNS_DIR));
    if mined.is_empty() {
        return Ok(ClassifyOutcome::NoPatterns);
    }

    let suggestions = classify_and_prioritize(&mined, config);
    let path = store::save_classified(&dir.join(store::CLASSIFIED_DIR), &suggestions, now)?;
    Ok(ClassifyOutcome::Classified {
        suggestions: suggestions.len(),
        by_priority: PriorityCounts::from_suggestions(&suggestions),
        path,
    })
}

/// Generate proposals from `dir/classified` into `dir/proposals`.
pub fn propose_stored(dir: &Path, now: DateTime<Utc>) -> Result<ProposeOutcome> {
    let suggestions = store::load_classified(&dir.join(store::CLASSIFIED_DIR))?;
    if suggestions.is_empty() {
        return Ok(ProposeOutcome::NoSuggestions);
    }

    let proposals = generate_proposals(&suggestions);
    let paths = save_proposals(&dir.join(store::PROPOSALS_DIR), &proposals, now)?;
    Ok(ProposeOutcome::Proposed {
        proposals: proposals.len(),
        paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Pattern, PatternFamily, SuggestionType};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
    }

    fn pipeline(source: &Path, output: &Path) -> Pipeline {
        let mut config = Config::default();
        config.collector.source_dir = Some(source.to_path_buf());
        Pipeline::new(config).with_output_dir(output)
    }

    #[test]
    fn test_run_without_sessions() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        let outcome = pipeline(source.path(), output.path())
            .run_at(RunOptions::default(), now())
            .unwrap();
        assert!(matches!(outcome, RunOutcome::NoSessions { files_found: 0, .. }));
        assert!(!output.path().join(store::PATTERNS_DIR).exists());
    }

    #[test]
    fn test_classify_stored_without_patterns() {
        let dir = TempDir::new().unwrap();
        let outcome = classify_stored(dir.path(), &ClassifierConfig::default(), now()).unwrap();
        assert!(matches!(outcome, ClassifyOutcome::NoPatterns));
    }

    #[test]
    fn test_propose_stored_without_suggestions() {
        let dir = TempDir::new().unwrap();
        let outcome = propose_stored(dir.path(), now()).unwrap();
        assert!(matches!(outcome, ProposeOutcome::NoSuggestions));
    }

    #[test]
    fn test_classify_then_propose_from_disk() {
        let dir = TempDir::new().unwrap();
        let mut mined = MinedPatterns::default();
        mined.push(Pattern {
            id: "tool_seq_1".to_string(),
            family: PatternFamily::ToolSequence,
            signature: "Read → Edit → Bash".to_string(),
            frequency: 6,
            examples: vec!["[app] Read → Edit → Bash".to_string()],
            confidence: 1.0,
        });
        mined.push(Pattern {
            id: "tool_seq_2".to_string(),
            family: PatternFamily::ToolSequence,
            signature: "Read → Read → Read".to_string(),
            frequency: 2,
            examples: vec![],
            confidence: 0.2,
        });
        store::save_patterns(&dir.path().join(store::PATTERNS_DIR), &mined, now()).unwrap();

        let ClassifyOutcome::Classified {
            suggestions,
            by_priority,
            ..
        } = classify_stored(dir.path(), &ClassifierConfig::default(), now()).unwrap()
        else {
            panic!("expected classified outcome");
        };
        assert_eq!(suggestions, 2);
        // 0.4 + 0.075 + 0.05 + 0.1 + 0.3 = 0.925 with frequency 6
        assert_eq!(by_priority, PriorityCounts { p1: 1, p2: 0, p3: 1 });

        let loaded = store::load_classified(&dir.path().join(store::CLASSIFIED_DIR)).unwrap();
        assert_eq!(loaded[0].suggestion_type, SuggestionType::Skill);
        assert_eq!(loaded[0].priority, Priority::P1);

        let ProposeOutcome::Proposed { proposals, paths } = propose_stored(dir.path(), now()).unwrap()
        else {
            panic!("expected proposed outcome");
        };
        // The unknown suggestion gets no proposal
        assert_eq!(proposals, 1);
        assert!(paths.json.exists());
        assert!(paths.markdown.ends_with("2025-03-14_proposals.md"));
    }
}
