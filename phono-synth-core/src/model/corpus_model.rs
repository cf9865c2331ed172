use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::group::{
	add_counts, merge_distributions, to_distribution, Distribution, GroupCounts, GroupLevel, GroupSize,
};
use super::word_model::{TranscriptionMarks, WordModel};
use crate::cache::{TranscriptionCache, Transcriptions};
use crate::error::{SynthError, SynthResult};
use crate::io::{build_output_path, read_text};
use crate::phoneme::PhonemeSource;
use crate::text;

/// A distinct word of the corpus and how often it occurs.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WordEntry {
	pub model: WordModel,
	pub count: u64,
}

/// Phoneme-group statistics of a whole source text.
///
/// This struct manages:
/// - `text`: the normalized source text the model was built from
/// - `words`: every distinct normalized word with its model and occurrence count
/// - `counts`: per level, the weighted count of every group over the whole text
/// - `totals`: per level, the sum of `counts`
///
/// Built once per run; read-only afterwards.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CorpusModel {
	text: String,
	marks: TranscriptionMarks,
	word_count: usize,
	words: BTreeMap<String, WordEntry>,
	counts: BTreeMap<GroupLevel, GroupCounts>,
	totals: BTreeMap<GroupLevel, u64>,
}

impl CorpusModel {
	/// Builds the model of a raw text.
	///
	/// - Normalizes the text and every whitespace-delimited word.
	/// - Resolves each distinct word once, through `cache` first and `source`
	///   for the rest.
	/// - Aggregates every word's group counts weighted by its occurrences.
	///
	/// # Errors
	/// Returns a `Provider` error if the source fails for an uncached word.
	/// Transcriptions resolved so far are written to `cache` before it is
	/// returned.
	pub fn build<S, C>(raw: &str, source: &S, cache: &mut C, marks: &TranscriptionMarks) -> SynthResult<Self>
	where
		S: PhonemeSource + ?Sized,
		C: TranscriptionCache + ?Sized,
	{
		let text = text::normalize(raw);

		let mut occurrences: BTreeMap<String, u64> = BTreeMap::new();
		let mut word_count = 0;
		for word in text::words(&text) {
			*occurrences.entry(word).or_insert(0) += 1;
			word_count += 1;
		}

		let transcriptions = Self::resolve(&text::distinct_words(&text), source, cache)?;

		let mut model = Self {
			text,
			marks: marks.clone(),
			word_count,
			words: BTreeMap::new(),
			counts: GroupLevel::ALL.iter().map(|level| (*level, GroupCounts::new())).collect(),
			totals: BTreeMap::new(),
		};

		for (word, count) in occurrences {
			let transcription = transcriptions
				.get(&word)
				.ok_or_else(|| SynthError::UnknownWord(word.clone()))?;
			let word_model = WordModel::new(&word, transcription, marks);
			for level in GroupLevel::ALL {
				if let Some(level_counts) = model.counts.get_mut(&level) {
					add_counts(level_counts, word_model.groups(level), count);
				}
			}
			model.words.insert(word, WordEntry { model: word_model, count });
		}

		model.totals = model
			.counts
			.iter()
			.map(|(level, counts)| (*level, counts.values().sum()))
			.collect();

		info!(
			"corpus built: {} words, {} distinct, {} single groups",
			model.word_count,
			model.words.len(),
			model.total(GroupLevel::Single)
		);
		Ok(model)
	}

	/// Looks up every word missing from the cache.
	///
	/// The cache is written back once at the end when anything new was
	/// resolved, and immediately when a lookup fails.
	fn resolve<S, C>(words: &[String], source: &S, cache: &mut C) -> SynthResult<Transcriptions>
	where
		S: PhonemeSource + ?Sized,
		C: TranscriptionCache + ?Sized,
	{
		let mut mapping = cache.get();
		let mut resolved = 0;

		for word in words {
			if mapping.contains_key(word) {
				continue;
			}
			match source.text_to_phoneme(word) {
				Ok(transcription) => {
					debug!("getting phoneme for {word} - {transcription}");
					mapping.insert(word.clone(), transcription);
					resolved += 1;
				}
				Err(e) => {
					warn!("lookup failed for `{word}`, checkpointing {} transcriptions", mapping.len());
					if let Err(save) = cache.update(&mapping) {
						warn!("transcription cache checkpoint failed: {save}");
					}
					return Err(e.into_lookup_failure(word));
				}
			}
		}

		if resolved > 0 {
			cache.update(&mapping)?;
			info!("resolved {resolved} new transcriptions");
		}
		Ok(mapping)
	}

	/// Loads the model of a text file, reusing its `.bin` snapshot when it was
	/// built from the same normalized text with the same marks.
	///
	/// - `input_path` is the raw text file; the snapshot lives next to it.
	/// - Uses `postcard` for the snapshot.
	/// - A stale or unreadable snapshot is rebuilt and overwritten.
	pub fn load_or_build<P, S, C>(input_path: P, source: &S, cache: &mut C, marks: &TranscriptionMarks) -> SynthResult<Self>
	where
		P: AsRef<Path>,
		S: PhonemeSource + ?Sized,
		C: TranscriptionCache + ?Sized,
	{
		let raw = read_text(&input_path)?;
		let snapshot_path = build_output_path(&input_path, "bin")?;

		if snapshot_path.exists() {
			match Self::load_snapshot(&snapshot_path) {
				Ok(model) if model.text == text::normalize(&raw) && model.marks == *marks && model.is_complete() => {
					info!("corpus loaded from snapshot {}", snapshot_path.display());
					return Ok(model);
				}
				Ok(_) => info!("snapshot {} is stale or incomplete, rebuilding", snapshot_path.display()),
				Err(e) => warn!("snapshot {} unreadable ({e}), rebuilding", snapshot_path.display()),
			}
		}

		let model = Self::build(&raw, source, cache, marks)?;
		model.save_snapshot(&snapshot_path)?;
		Ok(model)
	}

	/// True when every level is present in the corpus tables and in each word.
	///
	/// A snapshot failing this check is rebuilt rather than trusted.
	fn is_complete(&self) -> bool {
		GroupLevel::ALL
			.iter()
			.all(|level| self.counts.contains_key(level) && self.totals.contains_key(level))
			&& self.words.values().all(|entry| entry.model.is_complete())
	}

	/// Serializes the model to `path`.
	pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> SynthResult<()> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(path, bytes)?;
		Ok(())
	}

	/// Deserializes a model written by [`CorpusModel::save_snapshot`].
	pub fn load_snapshot<P: AsRef<Path>>(path: P) -> SynthResult<Self> {
		let bytes = std::fs::read(path)?;
		Ok(postcard::from_bytes(&bytes)?)
	}

	/// Normalized source text.
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Number of words (with repetitions) in the source text.
	pub fn word_count(&self) -> usize {
		self.word_count
	}

	pub fn distinct_word_count(&self) -> usize {
		self.words.len()
	}

	pub fn word(&self, word: &str) -> Option<&WordEntry> {
		self.words.get(word)
	}

	pub fn marks(&self) -> &TranscriptionMarks {
		&self.marks
	}

	/// Weighted counts of `level` over the whole text.
	pub fn counts(&self, level: GroupLevel) -> &GroupCounts {
		&self.counts[&level]
	}

	/// Sum of all counts of `level`.
	pub fn total(&self, level: GroupLevel) -> u64 {
		self.totals.get(&level).copied().unwrap_or(0)
	}

	/// Corpus-wide distribution of a single level.
	pub fn level_percentage(&self, level: GroupLevel) -> Distribution {
		to_distribution(self.counts(level))
	}

	/// Corpus-wide distribution of the levels selected by `size`.
	///
	/// Each level is normalized by its own total before the union.
	pub fn corpus_percentage(&self, size: GroupSize) -> Distribution {
		merge_distributions(size.levels().iter().map(|level| self.level_percentage(*level)))
	}

	/// Raw counts of `level` restricted to the words of `chunk`.
	///
	/// Every occurrence of a word in the chunk counts once.
	///
	/// # Errors
	/// Returns `UnknownWord` if the chunk has a word the corpus never saw.
	pub fn chunk_counts(&self, chunk: &str, level: GroupLevel) -> SynthResult<GroupCounts> {
		let mut counts = GroupCounts::new();
		for word in self.chunk_words(chunk)? {
			add_counts(&mut counts, word.groups(level), 1);
		}
		Ok(counts)
	}

	/// Local distribution of one chunk: shares are relative to the chunk's
	/// own totals, not the corpus totals.
	///
	/// # Errors
	/// Returns `UnknownWord` if the chunk has a word the corpus never saw.
	pub fn chunk_percentage(&self, chunk: &str, size: GroupSize) -> SynthResult<Distribution> {
		self.chunks_percentage(&[chunk], size)
	}

	/// Local distribution of several chunks taken together, as if joined.
	///
	/// # Errors
	/// Returns `UnknownWord` if a chunk has a word the corpus never saw.
	pub fn chunks_percentage<T: AsRef<str>>(&self, chunks: &[T], size: GroupSize) -> SynthResult<Distribution> {
		let mut words = Vec::new();
		for chunk in chunks {
			words.extend(self.chunk_words(chunk.as_ref())?);
		}

		let levels = size.levels().iter().map(|level| {
			let mut counts = GroupCounts::new();
			for word in &words {
				add_counts(&mut counts, word.groups(*level), 1);
			}
			to_distribution(&counts)
		});
		Ok(merge_distributions(levels))
	}

	fn chunk_words(&self, chunk: &str) -> SynthResult<Vec<&WordModel>> {
		text::words(chunk)
			.map(|word| {
				self.words
					.get(&word)
					.map(|entry| &entry.model)
					.ok_or(SynthError::UnknownWord(word))
			})
			.collect()
	}
}
