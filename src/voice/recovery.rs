//! Heuristic description recovery.
//!
//! Language models routinely put the whole utterance in `title` and leave
//! `description` empty. These heuristics claw the context back out of the
//! transcript. Recovery is best-effort string matching, so it sits behind
//! a strategy trait and the parsing engine treats it as swappable.

/// Strategy for recovering a description the model failed to extract.
pub trait DescriptionRecovery: Send + Sync {
    /// Try to pull a description out of the transcript, given the title the
    /// draft ended up with. Returns None when nothing usable is found.
    fn recover(&self, transcript: &str, title: &str) -> Option<String>;
}

/// Accepted description length, in characters.
const MIN_LEN: usize = 6;
const MAX_LEN: usize = 4999;

/// Connector words dropped when they lead the recovered text.
const CONNECTORS: &[&str] = &[
    "and", "or", "but", "because", "for", "to", "by", "with", "about", "on", "at", "in", "the",
    "a", "an",
];

/// Default recovery: anchor on the title, then fall back to sentence
/// splitting.
#[derive(Debug, Default)]
pub struct HeuristicRecovery;

impl DescriptionRecovery for HeuristicRecovery {
    fn recover(&self, transcript: &str, title: &str) -> Option<String> {
        after_title(transcript, title).or_else(|| trailing_sentences(transcript))
    }
}

/// Path one: the transcript contains the title; whatever follows it is the
/// description, minus a leading comma and connector word.
fn after_title(transcript: &str, title: &str) -> Option<String> {
    let end = find_ignore_case(transcript, title)?;
    let mut rest = transcript[end..].trim_start();
    if let Some(stripped) = rest.strip_prefix(',') {
        rest = stripped.trim_start();
    }
    rest = strip_leading_connector(rest);
    accept(rest.trim())
}

/// Path two: everything after the first sentence.
fn trailing_sentences(transcript: &str) -> Option<String> {
    if transcript.chars().count() <= 50 {
        return None;
    }
    let sentences: Vec<&str> = transcript
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if sentences.len() < 2 {
        return None;
    }
    accept(&sentences[1..].join(". "))
}

fn accept(candidate: &str) -> Option<String> {
    let len = candidate.chars().count();
    if (MIN_LEN..=MAX_LEN).contains(&len) {
        Some(candidate.to_string())
    } else {
        None
    }
}

/// Drops the first word when it is a connector ("and", "to", "about", ...).
fn strip_leading_connector(text: &str) -> &str {
    let word_end = text.find(char::is_whitespace).unwrap_or(text.len());
    let word = &text[..word_end];
    if CONNECTORS.iter().any(|c| word.eq_ignore_ascii_case(c)) {
        text[word_end..].trim_start()
    } else {
        text
    }
}

/// Case-insensitive substring search returning the byte offset just past
/// the first match.
///
/// Walks char boundaries instead of lowercasing both strings, because
/// lowercasing can change byte lengths and would corrupt the offset.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let hay: Vec<(usize, char)> = haystack.char_indices().collect();
    let want: Vec<char> = needle.chars().collect();

    for start in 0..hay.len() {
        let mut h = start;
        let mut w = 0;
        while w < want.len() && h < hay.len() && chars_eq_ignore_case(hay[h].1, want[w]) {
            h += 1;
            w += 1;
        }
        if w == want.len() {
            return Some(hay.get(h).map_or(haystack.len(), |(offset, _)| *offset));
        }
    }
    None
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
