//! Per-tool call summaries
//!
//! Every assistant tool call is reduced to a short string built from at most
//! one salient argument, e.g. `Read: src/main.rs` or `Task(Explore)`.
//!
//! Summarizers are registered by tool name in a [`SummarizerRegistry`].
//! Names without a summarizer fall back to [`tool_label`], which turns
//! namespaced server tools (`mcp__server__tool`) into `server.tool` and keeps
//! anything else as the bare name.
//!
//! ```rust
//! use habitual_core::normalize::create_default_registry;
//! use serde_json::json;
//!
//! let registry = create_default_registry();
//! let summary = registry.summarize("Bash", &json!({"command": "cargo test"}));
//! assert_eq!(summary, "Bash: cargo test");
//! ```

use super::clean::{shorten_path, truncate};
use serde_json::Value;
use std::collections::HashMap;

/// Marker that prefixes namespaced server tool names.
pub const NAMESPACED_TOOL_PREFIX: &str = "mcp__";

/// Summarizes calls to one tool.
pub trait ToolSummarizer: Send + Sync {
    /// Tool name this summarizer handles, matched exactly.
    fn tool(&self) -> &str;

    /// Build the summary from the call's argument map.
    ///
    /// Returns `None` when an expected argument is missing; the registry then
    /// degrades to `<tool>: ...`.
    fn summarize(&self, input: &Value) -> Option<String>;
}

/// Display label for a tool with no registered summarizer.
///
/// This is also the name recorded for the call in the turn's tool list, so
/// it must be recoverable from the rendered summary.
pub fn tool_label(name: &str) -> String {
    match name.strip_prefix(NAMESPACED_TOOL_PREFIX) {
        Some(rest) => {
            let segments: Vec<&str> = name.split("__").collect();
            if segments.len() >= 3 {
                format!("{}.{}", segments[1], segments[2])
            } else {
                rest.to_string()
            }
        }
        None => name.to_string(),
    }
}

fn str_arg<'a>(input: &'a Value, key: &str) -> Option<&'a str> {
    input.get(key).and_then(Value::as_str)
}

// ============================================
// Built-in summarizers
// ============================================

/// `<Tool>: <shortened path>`
pub struct PathSummarizer {
    tool: &'static str,
    key: &'static str,
    depth: usize,
}

impl PathSummarizer {
    pub fn new(tool: &'static str, key: &'static str) -> Self {
        Self {
            tool,
            key,
            depth: 3,
        }
    }
}

impl ToolSummarizer for PathSummarizer {
    fn tool(&self) -> &str {
        self.tool
    }

    fn summarize(&self, input: &Value) -> Option<String> {
        let path = str_arg(input, self.key)?;
        Some(format!("{}: {}", self.tool, shorten_path(path, self.depth)))
    }
}

/// `<Tool>: <text>`, optionally truncated and quoted.
pub struct TextSummarizer {
    tool: &'static str,
    key: &'static str,
    max_chars: Option<usize>,
    quoted: bool,
}

impl TextSummarizer {
    pub fn new(tool: &'static str, key: &'static str) -> Self {
        Self {
            tool,
            key,
            max_chars: None,
            quoted: false,
        }
    }

    pub fn truncated(mut self, max_chars: usize) -> Self {
        self.max_chars = Some(max_chars);
        self
    }

    pub fn quoted(mut self) -> Self {
        self.quoted = true;
        self
    }
}

impl ToolSummarizer for TextSummarizer {
    fn tool(&self) -> &str {
        self.tool
    }

    fn summarize(&self, input: &Value) -> Option<String> {
        let raw = str_arg(input, self.key)?;
        let text = match self.max_chars {
            Some(max) => truncate(raw, max),
            None => raw.to_string(),
        };
        if self.quoted {
            Some(format!("{}: \"{}\"", self.tool, text))
        } else {
            Some(format!("{}: {}", self.tool, text))
        }
    }
}

/// `Grep: "<pattern>" in <path>`
pub struct GrepSummarizer;

impl ToolSummarizer for GrepSummarizer {
    fn tool(&self) -> &str {
        "Grep"
    }

    fn summarize(&self, input: &Value) -> Option<String> {
        let pattern = str_arg(input, "pattern")?;
        // Grep searches the working directory when no path is given
        let path = str_arg(input, "path").unwrap_or(".");
        Some(format!("Grep: \"{}\" in {}", pattern, shorten_path(path, 2)))
    }
}

/// `Task(<subagent type>)`
pub struct TaskSummarizer;

impl ToolSummarizer for TaskSummarizer {
    fn tool(&self) -> &str {
        "Task"
    }

    fn summarize(&self, input: &Value) -> Option<String> {
        let agent = str_arg(input, "subagent_type").unwrap_or("Unknown");
        Some(format!("Task({})", agent))
    }
}

/// `Todo: <n> items`
pub struct TodoSummarizer;

impl ToolSummarizer for TodoSummarizer {
    fn tool(&self) -> &str {
        "TodoWrite"
    }

    fn summarize(&self, input: &Value) -> Option<String> {
        let todos = input.get("todos")?.as_array()?;
        Some(format!("Todo: {} items", todos.len()))
    }
}

// ============================================
// Registry
// ============================================

/// Tool summarizers keyed by tool name.
#[derive(Default)]
pub struct SummarizerRegistry {
    summarizers: HashMap<String, Box<dyn ToolSummarizer>>,
}

impl SummarizerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a summarizer, replacing any previous one for the same tool.
    pub fn register(&mut self, summarizer: Box<dyn ToolSummarizer>) {
        tracing::trace!(tool = summarizer.tool(), "Registered tool summarizer");
        self.summarizers
            .insert(summarizer.tool().to_string(), summarizer);
    }

    pub fn has_summarizer(&self, tool: &str) -> bool {
        self.summarizers.contains_key(tool)
    }

    /// Summarize one tool call. Never fails.
    pub fn summarize(&self, name: &str, input: &Value) -> String {
        match self.summarizers.get(name) {
            Some(summarizer) => summarizer.summarize(input).unwrap_or_else(|| {
                tracing::debug!(tool = name, "Missing tool argument, using placeholder");
                format!("{}: ...", name)
            }),
            None => tool_label(name),
        }
    }

    /// The name recorded in a turn's tool list for this call.
    pub fn tool_name(&self, name: &str) -> String {
        if self.has_summarizer(name) {
            name.to_string()
        } else {
            tool_label(name)
        }
    }
}

/// Registry with summarizers for the assistant's built-in tools.
pub fn create_default_registry() -> SummarizerRegistry {
    let mut registry = SummarizerRegistry::new();
    registry.register(Box::new(PathSummarizer::new("Read", "file_path")));
    registry.register(Box::new(PathSummarizer::new("Edit", "file_path")));
    registry.register(Box::new(PathSummarizer::new("Write", "file_path")));
    registry.register(Box::new(PathSummarizer::new(
        "NotebookEdit",
        "notebook_path",
    )));
    registry.register(Box::new(TextSummarizer::new("Bash", "command").truncated(40)));
    registry.register(Box::new(TextSummarizer::new("Glob", "pattern")));
    registry.register(Box::new(TextSummarizer::new("Skill", "skill")));
    registry.register(Box::new(TextSummarizer::new("WebFetch", "url").truncated(40)));
    registry.register(Box::new(
        TextSummarizer::new("WebSearch", "query")
            .truncated(30)
            .quoted(),
    ));
    registry.register(Box::new(GrepSummarizer));
    registry.register(Box::new(TaskSummarizer));
    registry.register(Box::new(TodoSummarizer));
    registry
}
