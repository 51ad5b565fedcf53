//! Prompt-template mining
//!
//! All user requests form one pool. Three sub-extractors run over it:
//!
//! - **suffix**: request endings from [`rules::REQUEST_SUFFIXES`], first match wins
//! - **prefix**: leading references from [`rules::REFERENCE_PREFIXES`], first match wins
//! - **keyword**: Hangul words of two or more syllables, top N by count
//!
//! Confidence is the bucket's count over the number of requests in the pool.

use super::rules::{self, example_text, is_stopword};
use super::{ratio, round3, PatternExtractor, Tally};
use crate::types::{NormalizedSession, Pattern, PatternFamily};
use once_cell::sync::Lazy;
use regex::Regex;

static HANGUL_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[가-힣]{2,}").expect("valid hangul regex"));

pub struct PromptTemplateExtractor {
    min_frequency: usize,
    keyword_top_n: usize,
}

impl PromptTemplateExtractor {
    pub fn new(min_frequency: usize, keyword_top_n: usize) -> Self {
        Self {
            min_frequency: min_frequency.max(1),
            keyword_top_n,
        }
    }

    /// Bucket each message under the first matching signature.
    fn first_match_patterns(
        &self,
        messages: &[&str],
        id_prefix: &str,
        matcher: fn(&str) -> Option<&'static str>,
    ) -> Vec<Pattern> {
        let mut tally: Tally<&'static str> = Tally::new();
        for message in messages {
            if let Some(signature) = matcher(message) {
                tally.add(&signature, Some(example_text(message)));
            }
        }
        self.to_patterns(tally, messages.len(), id_prefix, |s| s.to_string(), None)
    }

    fn keyword_patterns(&self, messages: &[&str]) -> Vec<Pattern> {
        let mut tally: Tally<&str> = Tally::new();
        for message in messages {
            for word in HANGUL_WORD.find_iter(message).map(|m| m.as_str()) {
                if !is_stopword(word) {
                    tally.add(&word, Some(example_text(message)));
                }
            }
        }
        self.to_patterns(
            tally,
            messages.len(),
            "prompt_keyword",
            |word| format!("'{}' keyword", word),
            Some(self.keyword_top_n),
        )
    }

    fn to_patterns<K: Eq + std::hash::Hash + Clone>(
        &self,
        tally: Tally<K>,
        message_count: usize,
        id_prefix: &str,
        signature: impl Fn(&K) -> String,
        top_n: Option<usize>,
    ) -> Vec<Pattern> {
        let ranked = tally.ranked();
        let take = top_n.unwrap_or(ranked.len());
        ranked
            .into_iter()
            .take(take)
            .filter(|entry| entry.count >= self.min_frequency)
            .enumerate()
            .map(|(i, entry)| Pattern {
                id: format!("{}_{}", id_prefix, i + 1),
                family: PatternFamily::PromptTemplate,
                signature: signature(&entry.key),
                frequency: entry.count,
                examples: entry.examples,
                confidence: round3(ratio(entry.count, message_count)),
            })
            .collect()
    }
}

impl Default for PromptTemplateExtractor {
    fn default() -> Self {
        Self::new(3, 10)
    }
}

impl PatternExtractor for PromptTemplateExtractor {
    fn name(&self) -> &str {
        "prompt_template"
    }

    fn extract(&self, sessions: &[NormalizedSession]) -> Vec<Pattern> {
        let messages: Vec<&str> = sessions
            .iter()
            .flat_map(|s| s.user_messages())
            .map(str::trim)
            .collect();
        if messages.is_empty() {
            return Vec::new();
        }

        let mut patterns =
            self.first_match_patterns(&messages, "prompt_suffix", rules::match_suffix);
        patterns.extend(self.first_match_patterns(&messages, "prompt_prefix", rules::match_prefix));
        patterns.extend(self.keyword_patterns(&messages));
        patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NormalizedTurn;

    fn pool(messages: &[&str]) -> Vec<NormalizedSession> {
        vec![NormalizedSession {
            session_id: "s".to_string(),
            project: "p".to_string(),
            title: "t".to_string(),
            date: None,
            started_at: None,
            turn_count: messages.len(),
            turns: messages.iter().map(|m| NormalizedTurn::user(*m)).collect(),
        }]
    }

    fn by_signature<'a>(patterns: &'a [Pattern], signature: &str) -> Option<&'a Pattern> {
        patterns.iter().find(|p| p.signature == signature)
    }

    #[test]
    fn test_suffix_buckets() {
        let sessions = pool(&[
            "이 파일 리팩토링해줘",
            "커밋해줘",
            "테스트 돌려줘",
            "빌드해줘",
            "결과 보여줘",
            "버그 고쳐줘",
            "hello world",
        ]);
        let patterns = PromptTemplateExtractor::default().extract(&sessions);

        let haejwo = by_signature(&patterns, "~해줘").unwrap();
        assert_eq!(haejwo.frequency, 3);
        assert_eq!(haejwo.id, "prompt_suffix_1");
        assert_eq!(haejwo.confidence, 0.429);
        assert_eq!(haejwo.examples.len(), 3);

        // 보여줘 is shadowed by the shorter 줘 ending
        let jwo = by_signature(&patterns, "~줘").unwrap();
        assert_eq!(jwo.frequency, 3);
        assert!(by_signature(&patterns, "~보여줘").is_none());
    }

    #[test]
    fn test_suffix_output_sorted_by_frequency() {
        let sessions = pool(&["a 줘", "b 줘", "c 줘", "d 해줘", "e 해줘", "f 해줘", "g 해줘"]);
        let patterns = PromptTemplateExtractor::default().extract(&sessions);
        let suffixes: Vec<_> = patterns
            .iter()
            .filter(|p| p.id.starts_with("prompt_suffix"))
            .map(|p| (p.signature.as_str(), p.frequency))
            .collect();
        assert_eq!(suffixes, vec![("~해줘", 4), ("~줘", 3)]);
    }

    #[test]
    fn test_prefix_buckets() {
        let sessions = pool(&[
            "이 파일 분석해줘",
            "이 파일 정리",
            "이 파일 읽어봐",
            "이거 뭐야",
            "@src/lib.rs 확인",
        ]);
        let patterns = PromptTemplateExtractor::default().extract(&sessions);
        let file = by_signature(&patterns, "이 파일~").unwrap();
        assert_eq!(file.id, "prompt_prefix_1");
        assert_eq!(file.frequency, 3);
        assert!(by_signature(&patterns, "이거~").is_none());
    }

    #[test]
    fn test_keyword_patterns() {
        let sessions = pool(&[
            "테스트 실행",
            "테스트 다시 실행",
            "테스트 고쳐",
            "배포 준비",
        ]);
        let patterns = PromptTemplateExtractor::default().extract(&sessions);
        let keyword = by_signature(&patterns, "'테스트' keyword").unwrap();
        assert_eq!(keyword.frequency, 3);
        assert_eq!(keyword.confidence, 0.75);
        assert!(by_signature(&patterns, "'실행' keyword").is_none());
    }

    #[test]
    fn test_keyword_top_n_applies_before_threshold() {
        let sessions = pool(&["가나 다라", "가나 다라", "가나 다라"]);
        let patterns = PromptTemplateExtractor::new(3, 1).extract(&sessions);
        let keywords: Vec<_> = patterns
            .iter()
            .filter(|p| p.id.starts_with("prompt_keyword"))
            .collect();
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0].signature, "'가나' keyword");
    }

    #[test]
    fn test_empty_pool() {
        assert!(PromptTemplateExtractor::default().extract(&[]).is_empty());
    }
}
