//! habitual - mine assistant transcripts for automation suggestions
//!
//! Collects recent sessions, mines repeated patterns and writes prioritized
//! proposals for skills, slash commands, agents and CLAUDE.md rules.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use habitual_core::ingest::render_analysis_input;
use habitual_core::pipeline::{self, ClassifyOutcome, ProposeOutcome};
use habitual_core::{Config, Pipeline, RunOptions, RunOutcome, RunSummary};

#[derive(Parser)]
#[command(name = "habitual")]
#[command(about = "Mine assistant transcripts for automation suggestions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect, mine, classify and write proposals
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory (default: $XDG_DATA_HOME/habitual/analysis)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop after classification without writing proposals
        #[arg(long)]
        dry_run: bool,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Print the collected sessions as one analysis document
    Collect {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Re-classify previously mined patterns
    Classify {
        /// Output directory of a previous run
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-generate proposals from previously classified suggestions
    Propose {
        /// Output directory of a previous run
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Overrides for the `[collector]` config section.
#[derive(Args)]
struct SourceArgs {
    /// Only sessions from the last N days
    #[arg(short, long)]
    days: Option<u32>,

    /// Byte budget for collected sessions, in KB
    #[arg(short, long)]
    limit_kb: Option<u64>,

    /// Transcript root (default: ~/.claude/projects)
    #[arg(short, long)]
    source: Option<PathBuf>,
}

impl SourceArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(days) = self.days {
            config.collector.days = days;
        }
        if let Some(limit_kb) = self.limit_kb {
            config.collector.limit_kb = limit_kb;
        }
        if let Some(ref source) = self.source {
            config.collector.source_dir = Some(source.clone());
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    Config::ensure_xdg_env();

    // Load configuration
    let mut config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        habitual_core::logging::init(&config.logging).context("failed to initialize logging")?;

    match cli.command {
        Command::Run {
            source,
            output,
            dry_run,
            format,
        } => {
            source.apply(&mut config);
            config.validate().context("invalid options")?;
            cmd_run(config, output, dry_run, &format)
        }
        Command::Collect { source } => {
            source.apply(&mut config);
            config.validate().context("invalid options")?;
            cmd_collect(config)
        }
        Command::Classify { output } => cmd_classify(&config, output),
        Command::Propose { output } => cmd_propose(output),
    }
}

fn output_dir(output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(Config::output_dir)
}

fn cmd_run(config: Config, output: Option<PathBuf>, dry_run: bool, format: &str) -> Result<()> {
    let source_dir = config.collector.source_dir();
    let pipeline = Pipeline::new(config).with_output_dir(output_dir(output));

    tracing::info!(
        source = %source_dir.display(),
        output = %pipeline.output_dir().display(),
        dry_run,
        "Starting run"
    );

    let outcome = pipeline
        .run(RunOptions { dry_run })
        .context("pipeline run failed")?;

    match outcome {
        RunOutcome::NoSessions {
            files_found,
            warnings,
        } => {
            if format == "json" {
                let value = serde_json::json!({
                    "status": "no_sessions",
                    "files_found": files_found,
                    "warnings": warnings,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!(
                    "No sessions collected from {} ({} files found).",
                    source_dir.display(),
                    files_found
                );
                println!("Check --source, or widen the window with --days.");
            }
        }
        RunOutcome::Completed(summary) => {
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Collected {} sessions ({:.1} KB) from {} files, {} skipped",
        summary.sessions_collected,
        summary.total_bytes as f64 / 1024.0,
        summary.files_found,
        summary.sessions_skipped
    );
    println!(
        "Patterns: {} tool sequences, {} prompt templates, {} behavioral",
        summary.patterns.tool_sequences,
        summary.patterns.prompt_templates,
        summary.patterns.behavioral
    );
    println!(
        "Suggestions: {} (P1 {}, P2 {}, P3 {})",
        summary.suggestions,
        summary.by_priority.p1,
        summary.by_priority.p2,
        summary.by_priority.p3
    );

    if !summary.top.is_empty() {
        println!("\n--- Top Suggestions ---");
        for s in &summary.top {
            println!("[{}] {}: {}", s.priority, s.suggestion_type, s.pattern);
            println!("    → {}", s.suggested_name);
            println!(
                "    Confidence: {:.2}, Frequency: {}",
                s.confidence, s.frequency
            );
        }
    }

    println!("\nClassified: {}", summary.classified_path.display());
    match &summary.proposals {
        Some(paths) => {
            println!("Proposals:  {}", paths.markdown.display());
            println!("            {}", paths.json.display());
        }
        None => println!("Dry run: proposals not written"),
    }

    if !summary.warnings.is_empty() {
        eprintln!(
            "{} warnings while reading transcripts (see {})",
            summary.warnings.len(),
            habitual_core::logging::log_file_path().display()
        );
    }
}

fn cmd_collect(config: Config) -> Result<()> {
    let pipeline = Pipeline::new(config);
    let collected = pipeline
        .collect_at(Utc::now())
        .context("failed to collect sessions")?;

    println!("{}", render_analysis_input(&collected.sessions));

    if !collected.warnings.is_empty() {
        eprintln!("{} warnings while reading transcripts", collected.warnings.len());
    }
    Ok(())
}

fn cmd_classify(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let dir = output_dir(output);
    match pipeline::classify_stored(&dir, &config.classifier, Utc::now())
        .context("failed to classify patterns")?
    {
        ClassifyOutcome::NoPatterns => {
            println!("No patterns found under {}.", dir.display());
            println!("Run 'habitual run' first.");
        }
        ClassifyOutcome::Classified {
            suggestions,
            by_priority,
            path,
        } => {
            println!(
                "Classified {} suggestions (P1 {}, P2 {}, P3 {})",
                suggestions, by_priority.p1, by_priority.p2, by_priority.p3
            );
            println!("Saved: {}", path.display());
        }
    }
    Ok(())
}

fn cmd_propose(output: Option<PathBuf>) -> Result<()> {
    let dir = output_dir(output);
    match pipeline::propose_stored(&dir, Utc::now()).context("failed to generate proposals")? {
        ProposeOutcome::NoSuggestions => {
            println!("No classified suggestions found under {}.", dir.display());
            println!("Run 'habitual classify' or 'habitual run' first.");
        }
        ProposeOutcome::Proposed { proposals, paths } => {
            println!("Generated {} proposals", proposals);
            println!("Saved: {}", paths.markdown.display());
            println!("       {}", paths.json.display());
        }
    }
    Ok(())
}
