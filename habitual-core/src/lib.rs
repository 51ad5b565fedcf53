//! # habitual-core
//!
//! Core library for habitual - mines coding-assistant transcripts for
//! repeated work and proposes automations for it.
//!
//! This library provides:
//! - Transcript reading and normalization into compact session documents
//! - Pattern mining over tool sequences, prompt phrasing and usage habits
//! - Classification into skills, slash commands, agents and CLAUDE.md rules
//! - Prioritization and markdown/JSON proposal reports
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through four stages, each persisting its output:
//! - **Collect:** `*.jsonl` transcripts become [`NormalizedSession`]s within a byte budget
//! - **Mine:** sessions become frequency-scored [`Pattern`]s
//! - **Classify:** patterns become prioritized [`ClassifiedSuggestion`]s
//! - **Propose:** suggestions become reviewable [`proposal::Proposal`]s
//!
//! ## Example
//!
//! ```rust,no_run
//! use habitual_core::{Config, Pipeline, RunOptions, RunOutcome};
//!
//! let config = Config::load().expect("failed to load config");
//! let outcome = Pipeline::new(config)
//!     .run(RunOptions::default())
//!     .expect("pipeline failed");
//!
//! if let RunOutcome::Completed(summary) = outcome {
//!     println!("{} suggestions", summary.suggestions);
//! }
//! ```

// Re-export commonly used items at the crate root
pub use classify::Classifier;
pub use config::Config;
pub use error::{Error, Result};
pub use ingest::{CollectResult, SessionCollector};
pub use mining::{create_default_miner, MinedPatterns, PatternMiner};
pub use normalize::Normalizer;
pub use pipeline::{Pipeline, RunOptions, RunOutcome, RunSummary};
pub use types::*;

// Public modules
pub mod classify;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod mining;
pub mod normalize;
pub mod pipeline;
pub mod prioritize;
pub mod proposal;
pub mod store;
pub mod types;
