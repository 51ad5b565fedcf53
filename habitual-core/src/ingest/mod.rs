//! Transcript ingestion
//!
//! - [`transcript`] reads one JSONL session log into a [`crate::types::RawSession`].
//! - [`collector`] walks the transcript root and produces the bounded,
//!   newest-first set of normalized sessions that the miner consumes.

pub mod collector;
pub mod transcript;

pub use collector::{render_analysis_input, take_within_budget, CollectResult, SessionCollector};
pub use transcript::{read_transcript, TranscriptRead};
