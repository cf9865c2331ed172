use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::group::{GroupCounts, GroupLevel};

/// Reserved symbol classes of a transcription.
///
/// - `stress`: marks removed before analysis
/// - `length`: marker fused into the symbol right before it
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TranscriptionMarks {
	pub stress: Vec<char>,
	pub length: char,
}

impl Default for TranscriptionMarks {
	fn default() -> Self {
		Self {
			stress: vec!['ˈ', 'ˌ', '\''],
			length: 'ː',
		}
	}
}

impl TranscriptionMarks {
	/// Reduces a raw transcription to its logical tokens.
	///
	/// Stress marks and whitespace are dropped. A symbol directly followed by
	/// the length marker becomes one token. A length marker with nothing to
	/// extend is dropped.
	pub fn tokenize(&self, transcription: &str) -> Vec<String> {
		let mut tokens = Vec::new();
		let mut symbols = transcription
			.chars()
			.filter(|c| !c.is_whitespace() && !self.stress.contains(c))
			.peekable();

		while let Some(symbol) = symbols.next() {
			if symbol == self.length {
				continue;
			}
			let mut token = String::from(symbol);
			if symbols.peek() == Some(&self.length) {
				token.push(self.length);
				symbols.next();
			}
			tokens.push(token);
		}
		tokens
	}
}

/// Phoneme-group model of a single word.
///
/// Holds the word's logical tokens and, for every group level, how many
/// times each group occurs in the word alone.
///
/// # Invariants
/// - `tokens` is empty only if the transcription carried no symbol
/// - a word of `n` tokens has `n` singles, `n-1` pairs and `n-2` triplets
///   (never negative)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WordModel {
	text: String,
	transcription: String,
	tokens: Vec<String>,
	groups: BTreeMap<GroupLevel, GroupCounts>,
}

impl WordModel {
	/// Parses one word's transcription.
	pub fn new(text: &str, transcription: &str, marks: &TranscriptionMarks) -> Self {
		let tokens = marks.tokenize(transcription);
		let groups = GroupLevel::ALL
			.iter()
			.map(|level| (*level, Self::count_windows(&tokens, level.width())))
			.collect();

		Self {
			text: text.to_owned(),
			transcription: transcription.to_owned(),
			tokens,
			groups,
		}
	}

	/// Counts every window of `width` consecutive tokens.
	///
	/// Windows that would run past the last token contribute nothing.
	fn count_windows(tokens: &[String], width: usize) -> GroupCounts {
		let mut counts = GroupCounts::new();
		for window in tokens.windows(width) {
			*counts.entry(window.concat()).or_insert(0) += 1;
		}
		counts
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn transcription(&self) -> &str {
		&self.transcription
	}

	pub fn tokens(&self) -> &[String] {
		&self.tokens
	}

	/// True when every level has a count table.
	pub(crate) fn is_complete(&self) -> bool {
		GroupLevel::ALL.iter().all(|level| self.groups.contains_key(level))
	}

	/// Group counts of this word for `level`.
	pub fn groups(&self, level: GroupLevel) -> &GroupCounts {
		// every level is filled in `new`
		&self.groups[&level]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn model(transcription: &str) -> WordModel {
		WordModel::new("w", transcription, &TranscriptionMarks::default())
	}

	fn counts(pairs: &[(&str, u64)]) -> GroupCounts {
		pairs.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
	}

	#[test]
	fn plain_transcription_yields_overlapping_windows() {
		let word = model("kæt");
		assert_eq!(word.tokens(), &["k", "æ", "t"]);
		assert_eq!(word.groups(GroupLevel::Single), &counts(&[("k", 1), ("æ", 1), ("t", 1)]));
		assert_eq!(word.groups(GroupLevel::Pair), &counts(&[("kæ", 1), ("æt", 1)]));
		assert_eq!(word.groups(GroupLevel::Triplet), &counts(&[("kæt", 1)]));
	}

	#[test]
	fn missing_level_makes_the_model_incomplete() {
		let mut word = model("a");
		assert!(word.is_complete());
		word.groups.remove(&GroupLevel::Pair);
		assert!(!word.is_complete());
	}

	#[test]
	fn stress_marks_are_removed() {
		let word = model("ˈkɑˌnt");
		assert_eq!(word.tokens(), &["k", "ɑ", "n", "t"]);
	}

	#[test]
	fn length_marker_fuses_with_previous_symbol() {
		let word = model("ʃiːp");
		assert_eq!(word.tokens(), &["ʃ", "iː", "p"]);
		assert_eq!(word.groups(GroupLevel::Pair), &counts(&[("ʃiː", 1), ("iːp", 1)]));
		assert_eq!(word.groups(GroupLevel::Triplet), &counts(&[("ʃiːp", 1)]));
	}

	#[test]
	fn trailing_length_marker_stays_in_range() {
		let word = model("biː");
		assert_eq!(word.tokens(), &["b", "iː"]);
		assert_eq!(word.groups(GroupLevel::Pair), &counts(&[("biː", 1)]));
		assert!(word.groups(GroupLevel::Triplet).is_empty());
	}

	#[test]
	fn stray_length_marker_is_dropped() {
		assert_eq!(model("ːab").tokens(), &["a", "b"]);
		assert_eq!(model("ˈːa").tokens(), &["a"]);
	}

	#[test]
	fn repeated_groups_are_counted() {
		let word = model("mama");
		assert_eq!(word.groups(GroupLevel::Single), &counts(&[("m", 2), ("a", 2)]));
		assert_eq!(word.groups(GroupLevel::Pair), &counts(&[("ma", 2), ("am", 1)]));
	}

	#[test]
	fn short_words_have_no_higher_windows() {
		let single = model("a");
		assert_eq!(single.groups(GroupLevel::Single).len(), 1);
		assert!(single.groups(GroupLevel::Pair).is_empty());
		assert!(single.groups(GroupLevel::Triplet).is_empty());

		let empty = model("");
		assert!(empty.tokens().is_empty());
		assert!(empty.groups(GroupLevel::Single).is_empty());
	}

	#[test]
	fn whitespace_in_transcription_is_ignored() {
		assert_eq!(model(" kæt\n").tokens(), &["k", "æ", "t"]);
	}
}
