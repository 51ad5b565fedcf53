//! Fixed matching tables for prompt-template mining.
//!
//! Order matters: a message is counted under the first entry that matches.
//! Some later entries (`보여줘`, `확인해`, ...) are shadowed by shorter endings
//! listed before them and only show up if the earlier entries are removed.

/// Request endings as `(ending, signature)`, tested against the end of a message.
pub const REQUEST_SUFFIXES: &[(&str, &str)] = &[
    ("해줘", "~해줘"),
    ("해봐", "~해봐"),
    ("할래", "~할래"),
    ("해", "~해"),
    ("줘", "~줘"),
    ("보여줘", "~보여줘"),
    ("알려줘", "~알려줘"),
    ("확인해", "~확인해"),
    ("수정해", "~수정해"),
    ("추가해", "~추가해"),
];

/// Leading references as `(prefix, signature)`, tested against the start of a message.
pub const REFERENCE_PREFIXES: &[(&str, &str)] = &[
    ("이 파일", "이 파일~"),
    ("이거", "이거~"),
    ("여기", "여기~"),
    ("이것", "이것~"),
    ("저거", "저거~"),
    ("@", "@파일~"),
];

/// Particles and fillers never counted as keywords.
pub const STOPWORDS: &[&str] = &[
    "이", "그", "저", "것", "수", "등", "좀", "를", "을", "에", "는", "가", "의", "로", "와",
    "과", "도",
];

/// Examples are cut to this many characters.
pub const EXAMPLE_CHARS: usize = 50;
/// At most this many examples are kept per pattern.
pub const MAX_EXAMPLES: usize = 3;

/// First suffix signature whose ending closes `message`.
///
/// The ending must follow at least one other character on the same line.
pub fn match_suffix(message: &str) -> Option<&'static str> {
    REQUEST_SUFFIXES
        .iter()
        .find(|(ending, _)| {
            message
                .strip_suffix(ending)
                .and_then(|rest| rest.chars().next_back())
                .is_some_and(|c| c != '\n')
        })
        .map(|(_, signature)| *signature)
}

/// First prefix signature that opens `message`.
pub fn match_prefix(message: &str) -> Option<&'static str> {
    REFERENCE_PREFIXES
        .iter()
        .find(|(prefix, _)| message.starts_with(prefix))
        .map(|(_, signature)| *signature)
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.iter().any(|s| *s == word)
}

/// Example text: the message, cut to [`EXAMPLE_CHARS`] with `...` appended when cut.
pub fn example_text(message: &str) -> String {
    if message.chars().count() > EXAMPLE_CHARS {
        let head: String = message.chars().take(EXAMPLE_CHARS).collect();
        format!("{head}...")
    } else {
        message.to_string()
    }
}
