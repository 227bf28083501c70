use once_cell::sync::Lazy;
use regex::Regex;

/// Default target size of a chunk, in words
pub const DEFAULT_MAX_WORDS: usize = 200;

/// Fewest words a sentence-less fragment needs before `halve` splits it
const MIN_WORDS_TO_SPLIT: usize = 5;

/// Sentence terminator: a run of `.`, `!` or `?` followed by whitespace or end of text
static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+(\s+|$)").expect("sentence pattern is valid"));

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Collapse every whitespace run to a single space and trim both ends
pub fn normalize_text(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Split text into sentences. The returned slices cover the whole input,
/// so concatenating them yields the original text.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut last_end = 0;

    for mat in SENTENCE_END.find_iter(text) {
        sentences.push(&text[last_end..mat.end()]);
        last_end = mat.end();
    }

    if last_end < text.len() {
        sentences.push(&text[last_end..]);
    }

    sentences
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split text into sentence-respecting chunks of at most `max_words` words.
///
/// Sentences are accumulated until the next one would push the running chunk
/// over the limit. A sentence longer than `max_words` is never cut here; it
/// becomes a chunk of its own. Whitespace is normalized before splitting.
pub fn segment(text: &str, max_words: usize) -> Vec<String> {
    let normalized = normalize_text(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_words = 0;

    for sentence in split_sentences(&normalized) {
        let sentence_words = word_count(sentence);
        if sentence_words == 0 {
            continue;
        }

        if current_words + sentence_words > max_words && !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
            current.clear();
            current_words = 0;
        }

        current.push_str(sentence);
        current_words += sentence_words;
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
}

/// Split a failing chunk in two for the split-and-retry pass.
///
/// Prefers the middle sentence boundary, then the middle word boundary.
/// A single-element result means the text cannot be made smaller.
pub fn halve(text: &str) -> Vec<String> {
    let normalized = normalize_text(text);

    let sentences: Vec<&str> = split_sentences(&normalized)
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.len() >= 2 {
        let mid = sentences.len() / 2;
        return vec![sentences[..mid].join(" "), sentences[mid..].join(" ")];
    }

    let words: Vec<&str> = normalized.split_whitespace().collect();
    if words.len() >= MIN_WORDS_TO_SPLIT {
        let mid = words.len() / 2;
        return vec![words[..mid].join(" "), words[mid..].join(" ")];
    }

    vec![text.to_string()]
}
