use std::collections::HashSet;

/// Sentence terminator of normalized text.
pub const SENTENCE_END: char = '.';

/// Normalizes a raw document before any other processing.
///
/// - `?` and `!` become `.`
/// - every `.` is followed by a space
/// - newlines (any whitespace) and hyphens become spaces
/// - everything that is not a letter, a space or `.` is stripped
/// - the result is lowercase, trimmed and always ends with `.`
pub fn normalize(raw: &str) -> String {
	let mut text = String::with_capacity(raw.len() + 2);
	for c in raw.chars() {
		match c {
			'?' | '!' | '.' => text.push_str(". "),
			'-' => text.push(' '),
			c if c.is_whitespace() => text.push(' '),
			c if c.is_alphabetic() => text.extend(c.to_lowercase()),
			_ => (),
		}
	}

	let mut text = text.trim().to_owned();
	if !text.ends_with(SENTENCE_END) {
		text.push(SENTENCE_END);
	}
	text
}

/// Reduces a whitespace-delimited token to its letters, lowercased.
///
/// Returns an empty string when the token has no letters.
pub fn normalize_word(token: &str) -> String {
	token
		.chars()
		.filter(|c| c.is_alphabetic())
		.flat_map(char::to_lowercase)
		.collect()
}

/// Iterates the normalized, non-empty words of a text in order.
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
	text.split_whitespace()
		.map(normalize_word)
		.filter(|w| !w.is_empty())
}

/// Splits normalized text on sentence boundaries.
///
/// Sentences are trimmed; empty ones (and ones without any letter) are dropped.
pub fn sentences(text: &str) -> Vec<String> {
	text.split(SENTENCE_END)
		.map(str::trim)
		.filter(|s| s.chars().any(char::is_alphabetic))
		.map(str::to_owned)
		.collect()
}

/// Distinct normalized words of a text, in first-occurrence order.
pub fn distinct_words(text: &str) -> Vec<String> {
	let mut seen = HashSet::new();
	words(text).filter(|w| seen.insert(w.clone())).collect()
}

/// True when a chunk carries no word once normalized.
pub fn is_blank(chunk: &str) -> bool {
	words(chunk).next().is_none()
}
