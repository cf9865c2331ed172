#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

use phono_synth_core::{PhonemeSource, SynthError, SynthResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Spells a word letter by letter: vowels get a length marker, the first
/// letter carries primary stress.
pub fn spelled(word: &str) -> String {
	let mut transcription = String::from("ˈ");
	for c in word.chars() {
		transcription.push(c);
		if "aeiou".contains(c) {
			transcription.push('ː');
		}
	}
	transcription
}

/// Source transcribing every word with [`spelled`], counting lookups and
/// optionally failing on chosen words.
#[derive(Default)]
pub struct SpellingSource {
	failing: RefCell<BTreeSet<String>>,
	lookups: Cell<usize>,
}

impl SpellingSource {
	pub fn failing_on(words: &[&str]) -> Self {
		Self {
			failing: RefCell::new(words.iter().map(|w| (*w).to_owned()).collect()),
			lookups: Cell::new(0),
		}
	}

	pub fn recover(&self) {
		self.failing.borrow_mut().clear();
	}

	pub fn lookups(&self) -> usize {
		self.lookups.get()
	}
}

impl PhonemeSource for SpellingSource {
	fn text_to_phoneme(&self, word: &str) -> SynthResult<String> {
		self.lookups.set(self.lookups.get() + 1);
		if self.failing.borrow().contains(word) {
			return Err(SynthError::Http(format!("connection reset while fetching {word}")));
		}
		Ok(spelled(word))
	}
}

/// Random text of `sentences` sentences built from a small vocabulary.
pub fn random_text(seed: u64, sentences: usize) -> String {
	const VOCABULARY: [&str; 12] = [
		"airport", "night", "snow", "runway", "plane", "tower", "storm", "pilot", "gate", "a", "to", "is",
	];
	let mut rng = StdRng::seed_from_u64(seed);
	let mut text = String::new();
	for _ in 0..sentences {
		let length = rng.random_range(2..=8);
		let words: Vec<&str> = (0..length)
			.map(|_| VOCABULARY[rng.random_range(0..VOCABULARY.len())])
			.collect();
		text.push_str(&words.join(" "));
		text.push_str(if rng.random_bool(0.2) { "! " } else { ". " });
	}
	text
}
