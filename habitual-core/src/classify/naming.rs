//! Suggested names for each suggestion type.

use crate::mining::tool_sequence::ARROW;
use crate::types::{Pattern, SuggestionType};
use once_cell::sync::Lazy;
use regex::Regex;

/// Korean request vocabulary mapped to command names.
pub const COMMAND_NAMES: &[(&str, &str)] = &[
    ("커밋", "commit"),
    ("푸시", "push"),
    ("테스트", "test"),
    ("빌드", "build"),
    ("배포", "deploy"),
    ("리팩토링", "refactor"),
    ("수정", "fix"),
    ("추가", "add"),
    ("삭제", "delete"),
    ("확인", "check"),
    ("분석", "analyze"),
    ("요약", "summarize"),
    ("정리", "organize"),
    ("이 파일", "file"),
    ("이거", "this"),
    ("여기", "here"),
];

/// Verbs searched for, in order, inside a suffix pattern's first example.
const EXAMPLE_VERBS: &[&str] = &[
    "리팩토링", "커밋", "테스트", "빌드", "수정", "분석", "요약", "확인", "추가",
];

/// Agent names by signature vocabulary, first hit wins.
const AGENT_NAMES: &[(&[&str], &str)] = &[
    (&["review", "리뷰"], "code-reviewer"),
    (&["refactor", "리팩토링"], "code-refactorer"),
    (&["explore", "탐색"], "code-explorer"),
    (&["test", "테스트"], "test-runner"),
    (&["debug", "디버그"], "debugger"),
];

const RULE_NAME_CHARS: usize = 50;

static KEYWORD_SIGNATURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^'(.+)'\s*keyword$").expect("valid keyword regex"));

static TOOL_IN_SIGNATURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\w.]+)\s*(?:도구|tool)").expect("valid tool regex"));

/// Name for `pattern` once classified as `suggestion_type`.
pub fn suggested_name(pattern: &Pattern, suggestion_type: SuggestionType) -> String {
    match suggestion_type {
        SuggestionType::Skill => skill_name(&pattern.signature),
        SuggestionType::SlashCommand => slash_name(&pattern.signature, &pattern.examples),
        SuggestionType::Agent => agent_name(&pattern.signature).to_string(),
        SuggestionType::ClaudeMdRule => rule_name(&pattern.signature),
        SuggestionType::Unknown => "unknown".to_string(),
    }
}

/// `Read → Task(Explore) → Bash` becomes `read-task-explore-bash.md`.
pub fn skill_name(signature: &str) -> String {
    let parts: Vec<String> = signature
        .split(ARROW.trim())
        .map(|tool| tool.trim().to_lowercase().replace('(', "-").replace(')', ""))
        .collect();
    format!("{}.md", parts.join("-"))
}

pub fn slash_name(signature: &str, examples: &[String]) -> String {
    if let Some(caps) = KEYWORD_SIGNATURE.captures(signature) {
        return format!("/{}", command_name(&caps[1]));
    }

    if signature.starts_with('~') {
        return match examples.first() {
            Some(example) => format!("/{}", command_from_example(example)),
            None => "/quick-task".to_string(),
        };
    }

    if let Some(prefix) = signature.strip_suffix('~') {
        return format!("/{}-action", command_name(prefix.trim()));
    }

    "/custom-command".to_string()
}

pub fn agent_name(signature: &str) -> &'static str {
    let lower = signature.to_lowercase();
    AGENT_NAMES
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, name)| *name)
        .unwrap_or("custom-agent")
}

pub fn rule_name(signature: &str) -> String {
    let lower = signature.to_lowercase();

    if signature.contains("한글") || lower.contains("korean") {
        "Output language: Korean".to_string()
    } else if signature.contains("짧은") || lower.contains("short") {
        "Prefer short sessions".to_string()
    } else if signature.contains("긴") || lower.contains("long") {
        "Prefer detailed responses".to_string()
    } else if signature.contains("도구") || lower.contains("tool") {
        match TOOL_IN_SIGNATURE.captures(signature) {
            Some(caps) => format!("Prefer {} tool", &caps[1]),
            None => "Tool preference rule".to_string(),
        }
    } else {
        signature.chars().take(RULE_NAME_CHARS).collect()
    }
}

/// Table lookup with `action` as the fallback.
pub fn command_name(korean: &str) -> &'static str {
    COMMAND_NAMES
        .iter()
        .find(|(k, _)| *k == korean)
        .map(|(_, name)| *name)
        .unwrap_or("action")
}

fn command_from_example(example: &str) -> &'static str {
    EXAMPLE_VERBS
        .iter()
        .find(|verb| example.contains(*verb))
        .map(|verb| command_name(verb))
        .unwrap_or("task")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_name() {
        assert_eq!(skill_name("Read → Edit → Bash"), "read-edit-bash.md");
        assert_eq!(
            skill_name("Grep → Task(Explore) → Read"),
            "grep-task-explore-read.md"
        );
    }

    #[test]
    fn test_slash_name_from_keyword() {
        assert_eq!(slash_name("'커밋' keyword", &[]), "/commit");
        assert_eq!(slash_name("'고양이' keyword", &[]), "/action");
    }

    #[test]
    fn test_slash_name_from_suffix() {
        let examples = vec!["이 파일 리팩토링해줘".to_string(), "커밋해줘".to_string()];
        assert_eq!(slash_name("~해줘", &examples), "/refactor");
        assert_eq!(slash_name("~해줘", &["뭐든 해줘".to_string()]), "/task");
        assert_eq!(slash_name("~해줘", &[]), "/quick-task");
    }

    #[test]
    fn test_slash_name_from_prefix() {
        assert_eq!(slash_name("이 파일~", &[]), "/file-action");
        assert_eq!(slash_name("@파일~", &[]), "/action-action");
        assert_eq!(slash_name("something else", &[]), "/custom-command");
    }

    #[test]
    fn test_agent_name() {
        assert_eq!(agent_name("Code Review loop"), "code-reviewer");
        assert_eq!(agent_name("Task(Explore) chain"), "code-explorer");
        assert_eq!(agent_name("디버그 세션"), "debugger");
        assert_eq!(agent_name("Task(general)"), "custom-agent");
    }

    #[test]
    fn test_rule_name() {
        assert_eq!(rule_name("Korean prompt preference"), "Output language: Korean");
        assert_eq!(
            rule_name("short session preference (5 turns or fewer)"),
            "Prefer short sessions"
        );
        assert_eq!(
            rule_name("long session preference (15 turns or more)"),
            "Prefer detailed responses"
        );
        assert_eq!(rule_name("Read tool frequently used"), "Prefer Read tool");
        assert_eq!(rule_name("Read 도구 자주 사용"), "Prefer Read tool");
        assert_eq!(
            rule_name("medium session (8.0 turns average)"),
            "medium session (8.0 turns average)"
        );
    }

    #[test]
    fn test_unknown_name() {
        let pattern = Pattern {
            id: "tool_seq_9".to_string(),
            family: crate::types::PatternFamily::ToolSequence,
            signature: "Read → Read → Read".to_string(),
            frequency: 2,
            examples: vec![],
            confidence: 0.1,
        };
        assert_eq!(suggested_name(&pattern, SuggestionType::Unknown), "unknown");
        assert_eq!(
            suggested_name(&pattern, SuggestionType::Skill),
            "read-read-read.md"
        );
    }
}
