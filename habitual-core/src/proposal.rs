//! Proposal generation
//!
//! Turns prioritized suggestions into concrete, reviewable proposals: a
//! markdown implementation per suggestion, a checklist report grouped by
//! priority, and a machine-readable `proposals.json`. Nothing here applies a
//! proposal; the report is for a human to act on.

use crate::error::Result;
use crate::mining::tool_sequence::ARROW;
use crate::types::{ClassifiedSuggestion, Priority, SuggestionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const PROPOSALS_FILE: &str = "proposals.json";

/// Steps used in skill workflows, by tool name.
const TOOL_DESCRIPTIONS: &[(&str, &str)] = &[
    ("Read", "Read the file"),
    ("Edit", "Edit the file"),
    ("Write", "Write the file"),
    ("Bash", "Run a command"),
    ("Grep", "Search for a pattern"),
    ("Glob", "Find files"),
    ("Task", "Delegate a subtask"),
    ("TodoWrite", "Write a todo list"),
    ("WebFetch", "Fetch web content"),
    ("WebSearch", "Search the web"),
];

/// A reviewable change derived from one suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub pattern_id: String,
    #[serde(rename = "type")]
    pub suggestion_type: SuggestionType,
    pub name: String,
    pub description: String,
    /// Markdown body of the skill, command, agent or rule
    pub implementation: String,
    pub estimated_impact: String,
    pub priority: Priority,
}

/// Where [`save_proposals`] wrote its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalPaths {
    pub json: PathBuf,
    pub markdown: PathBuf,
}

/// One proposal per actionable suggestion, in input order. `unknown` is skipped.
pub fn generate_proposals(suggestions: &[ClassifiedSuggestion]) -> Vec<Proposal> {
    suggestions
        .iter()
        .filter_map(|s| {
            let (implementation, impact) = match s.suggestion_type {
                SuggestionType::Skill => (skill_template(s), "Automates a repeated workflow"),
                SuggestionType::SlashCommand => {
                    (slash_template(s), "Turns a frequent request into a command")
                }
                SuggestionType::Agent => (agent_template(s), "Delegates complex work to a sub-agent"),
                SuggestionType::ClaudeMdRule => {
                    (rule_template(s), "Keeps responses consistent with a standing rule")
                }
                SuggestionType::Unknown => return None,
            };

            Some(Proposal {
                pattern_id: s.pattern_id.clone(),
                suggestion_type: s.suggestion_type,
                name: s.suggested_name.clone(),
                description: s.reason.clone(),
                implementation,
                estimated_impact: impact.to_string(),
                priority: s.priority,
            })
        })
        .collect()
}

// ============================================
// Implementation templates
// ============================================

fn skill_template(s: &ClassifiedSuggestion) -> String {
    let examples = if s.examples.is_empty() {
        "- Pattern observed in past sessions".to_string()
    } else {
        s.examples
            .iter()
            .take(3)
            .map(|e| format!("- {e}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "# {title}\n\n\
         ## Trigger\n\
         Suggest when the \"{pattern}\" sequence appears\n\n\
         ## Workflow\n\
         {steps}\n\n\
         ## Examples\n\
         {examples}\n\n\
         ## Evidence\n\
         - Frequency: {frequency} times\n\
         - Confidence: {confidence:.2}\n\
         - {reason}\n",
        title = title_case(s.suggested_name.trim_end_matches(".md")),
        pattern = s.pattern,
        steps = workflow_steps(&s.pattern),
        frequency = s.frequency,
        confidence = s.confidence,
        reason = s.reason,
    )
}

fn slash_template(s: &ClassifiedSuggestion) -> String {
    format!(
        "# {name}\n\n\
         ## Description\n\
         {reason}\n\n\
         ## Steps\n\
         1. Analyze the request\n\
         2. Run the relevant tools\n\
         3. Return the result\n\n\
         ## Origin pattern\n\
         - Pattern: \"{pattern}\"\n\
         - Frequency: {frequency} times\n\
         - Confidence: {confidence:.2}\n",
        name = s.suggested_name,
        reason = s.reason,
        pattern = s.pattern,
        frequency = s.frequency,
        confidence = s.confidence,
    )
}

fn agent_template(s: &ClassifiedSuggestion) -> String {
    format!(
        "# Agent: {name}\n\n\
         ## Description\n\
         {reason}\n\n\
         ## Role\n\
         Take over complex multi-step work as a sub-agent\n\n\
         ## Trigger patterns\n\
         - \"{pattern}\"\n\n\
         ## Evidence\n\
         - Frequency: {frequency} times\n\
         - Confidence: {confidence:.2}\n",
        name = s.suggested_name,
        reason = s.reason,
        pattern = s.pattern,
        frequency = s.frequency,
        confidence = s.confidence,
    )
}

fn rule_template(s: &ClassifiedSuggestion) -> String {
    format!(
        "## {name}\n\n{reason}\n\n**Evidence**: \"{pattern}\" (frequency: {frequency})\n",
        name = s.suggested_name,
        reason = s.reason,
        pattern = s.pattern,
        frequency = s.frequency,
    )
}

/// Numbered steps for a tool sequence. `Task(Explore)` is described as `Task`.
fn workflow_steps(sequence: &str) -> String {
    sequence
        .split(ARROW.trim())
        .map(str::trim)
        .enumerate()
        .map(|(i, tool)| {
            let name = tool.split('(').next().unwrap_or(tool).trim();
            let step = TOOL_DESCRIPTIONS
                .iter()
                .find(|(t, _)| *t == name)
                .map_or(name, |(_, desc)| *desc);
            format!("{}. {}", i + 1, step)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `read-edit-bash` becomes `Read Edit Bash`.
fn title_case(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================
// Report
// ============================================

/// Markdown report: front matter, one checklist per non-empty tier, details
/// with every implementation, and a feedback section.
pub fn render_report(proposals: &[Proposal], generated_at: DateTime<Utc>) -> String {
    let stamp = generated_at.format("%Y-%m-%d %H:%M");
    let mut out = String::new();

    let _ = write!(
        out,
        "---\n\
         type: proposal\n\
         category: optimization\n\
         date: {stamp}\n\
         tags: [proposal, classified]\n\
         status: pending\n\
         ---\n\n\
         # Optimization Proposals\n\n\
         **Generated**: {stamp}\n\
         **Total proposals**: {total}\n\n\
         ---\n\n",
        total = proposals.len(),
    );

    for priority in Priority::ALL {
        let tier: Vec<&Proposal> = proposals.iter().filter(|p| p.priority == priority).collect();
        if tier.is_empty() {
            continue;
        }

        let _ = writeln!(out, "## {}\n", priority.label());
        for p in tier {
            let _ = writeln!(out, "- [ ] **{}** ({})", p.name, p.suggestion_type);
            let _ = writeln!(out, "  - Description: {}", p.description);
            let _ = writeln!(out, "  - Expected impact: {}", p.estimated_impact);
            let _ = writeln!(out, "  - Pattern ID: `{}`\n", p.pattern_id);
        }
    }

    out.push_str("\n---\n\n# Details\n\n");
    for p in proposals {
        let _ = writeln!(out, "## {} ({})\n", p.name, p.priority);
        let _ = writeln!(out, "**Type**: {}", p.suggestion_type);
        let _ = writeln!(out, "**Pattern ID**: `{}`\n", p.pattern_id);
        out.push_str("### Implementation\n\n");
        let _ = writeln!(out, "```markdown\n{}\n```\n", p.implementation.trim_end());
        out.push_str("---\n\n");
    }

    out.push_str(
        "# Feedback\n\n\
         ## Proposals to apply\n\
         Check the boxes above for the proposals you want to apply.\n\n\
         ## Notes\n\
         (free-form)\n\n\
         ## Next steps\n\
         1. Pick the proposals to apply\n\
         2. Apply them to your skills, commands or CLAUDE.md\n\
         3. Check the result in the next run\n",
    );

    out
}

// ============================================
// Persistence
// ============================================

#[derive(Serialize)]
struct ProposalsFile<'a> {
    generated_at: DateTime<Utc>,
    total_count: usize,
    by_priority: BTreeMap<&'static str, usize>,
    by_type: BTreeMap<&'static str, usize>,
    proposals: &'a [Proposal],
}

/// Write `proposals.json` and `<YYYY-MM-DD>_proposals.md` into `dir`.
pub fn save_proposals(
    dir: &Path,
    proposals: &[Proposal],
    generated_at: DateTime<Utc>,
) -> Result<ProposalPaths> {
    fs::create_dir_all(dir)?;

    let by_priority = Priority::ALL
        .iter()
        .map(|priority| {
            let count = proposals.iter().filter(|p| p.priority == *priority).count();
            (priority.as_str(), count)
        })
        .collect();

    let mut by_type: BTreeMap<&'static str, usize> = BTreeMap::new();
    for p in proposals {
        *by_type.entry(p.suggestion_type.as_str()).or_default() += 1;
    }

    let file = ProposalsFile {
        generated_at,
        total_count: proposals.len(),
        by_priority,
        by_type,
        proposals,
    };

    let json = dir.join(PROPOSALS_FILE);
    fs::write(&json, serde_json::to_string_pretty(&file)?)?;

    let markdown = dir.join(format!("{}_proposals.md", generated_at.format("%Y-%m-%d")));
    fs::write(&markdown, render_report(proposals, generated_at))?;

    tracing::info!(
        count = proposals.len(),
        json = %json.display(),
        markdown = %markdown.display(),
        "Saved proposals"
    );
    Ok(ProposalPaths { json, markdown })
}
