mod helpers;

use phono_synth_core::model::group::GroupCounts;
use phono_synth_core::{CorpusModel, GroupLevel, GroupSize, MemoryCache, TranscriptionMarks, text};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use helpers::{SpellingSource, random_text};

fn build(raw: &str) -> CorpusModel {
	let source = SpellingSource::default();
	let mut cache = MemoryCache::default();
	CorpusModel::build(raw, &source, &mut cache, &TranscriptionMarks::default()).unwrap()
}

#[test]
fn every_level_of_a_corpus_sums_to_one() {
	for seed in 0..20 {
		let corpus = build(&random_text(seed, 12));
		for level in GroupLevel::ALL {
			let distribution = corpus.level_percentage(level);
			if corpus.total(level) == 0 {
				assert!(distribution.is_empty());
				continue;
			}
			let sum: f64 = distribution.values().sum();
			assert!((sum - 1.0).abs() < 1e-9, "seed {seed}, {level:?}: {sum}");
		}
	}
}

#[test]
fn merged_group_sizes_sum_to_their_level_count() {
	let corpus = build(&random_text(3, 20));
	for (size, expected) in [(GroupSize::SINGLES, 1.0), (GroupSize::PAIRS, 2.0), (GroupSize::TRIPLETS, 3.0)] {
		let sum: f64 = corpus.corpus_percentage(size).values().sum();
		assert!((sum - expected).abs() < 1e-9, "{size}: {sum}");
	}
}

#[test]
fn chunk_counts_add_up_to_corpus_counts() {
	let mut rng = StdRng::seed_from_u64(42);
	for seed in 0..10 {
		let corpus = build(&random_text(seed, 15));
		let words: Vec<String> = text::words(corpus.text()).collect();

		// random contiguous partition of the word sequence
		let mut chunks = Vec::new();
		let mut start = 0;
		while start < words.len() {
			let end = (start + rng.random_range(1..=6)).min(words.len());
			chunks.push(words[start..end].join(" "));
			start = end;
		}

		for level in GroupLevel::ALL {
			let mut summed = GroupCounts::new();
			for chunk in &chunks {
				for (key, count) in corpus.chunk_counts(chunk, level).unwrap() {
					*summed.entry(key).or_insert(0) += count;
				}
			}
			assert_eq!(&summed, corpus.counts(level), "seed {seed}, {level:?}");
		}
	}
}

#[test]
fn sentence_chunks_of_the_text_add_up_too() {
	let corpus = build(&random_text(11, 25));
	for level in GroupLevel::ALL {
		let mut summed = GroupCounts::new();
		for sentence in text::sentences(corpus.text()) {
			for (key, count) in corpus.chunk_counts(&sentence, level).unwrap() {
				*summed.entry(key).or_insert(0) += count;
			}
		}
		assert_eq!(&summed, corpus.counts(level));
	}
}

#[test]
fn corpus_of_short_words_has_no_triplets() {
	let corpus = build("a to is. to a.");
	assert_eq!(corpus.total(GroupLevel::Triplet), 0);
	assert!(corpus.level_percentage(GroupLevel::Triplet).is_empty());
	assert!(corpus.chunk_percentage("to is", GroupSize::TRIPLETS).is_ok());
}

#[test]
fn length_markers_survive_into_corpus_keys() {
	let corpus = build("snow.");
	let singles = corpus.counts(GroupLevel::Single);
	assert_eq!(singles.get("oː"), Some(&1));
	assert!(!singles.contains_key("ː"));
	assert!(!singles.contains_key("ˈ"));
	assert_eq!(corpus.counts(GroupLevel::Triplet).get("noːw"), Some(&1));
}
