//! Phoneme-group models.
//!
//! - Group levels, counts and distributions (`group`)
//! - Per-word transcription parsing (`WordModel`)
//! - Whole-text aggregation and chunk distributions (`CorpusModel`)

/// Group levels, group sizes and count → share conversion.
pub mod group;

/// Single word model: tokens plus single/pair/triplet counts.
pub mod word_model;

/// Corpus-wide model built once per run from the source text.
///
/// Supports snapshot loading, chunk distributions and unknown-word detection.
pub mod corpus_model;
