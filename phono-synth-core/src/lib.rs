//! Phonetically representative text synthesis.
//!
//! This crate selects a subset of a text's sentences or words whose
//! phoneme-group distribution is statistically close to the whole text's:
//! - Transcription of words through interchangeable phoneme sources
//! - A durable word → transcription cache
//! - Single/pair/triplet phoneme-group models per word and per corpus
//! - A two-sample relevance oracle over aligned distributions
//! - A greedy append/delete synthesizer with spreadsheet and JSON report export

/// Crate-wide error type.
pub mod error;

/// Source text normalization and chunking.
pub mod text;

/// Phoneme-group models (word and corpus level).
pub mod model;

/// Two-sample relevance test and best/worst selection.
pub mod oracle;

/// Greedy synthesis search and its result record.
pub mod synthesis;

/// Word → transcription providers.
pub mod phoneme;

/// Durable transcription cache.
pub mod cache;

/// Report export.
pub mod export;

/// I/O utilities (file loading, path helpers).
pub mod io;

pub use cache::{JsonFileCache, MemoryCache, TranscriptionCache, Transcriptions};
pub use error::{SynthError, SynthResult};
pub use export::{JsonExport, ReportFormat, SpreadsheetExport};
pub use model::corpus_model::CorpusModel;
pub use model::group::{Distribution, GroupLevel, GroupSize};
pub use model::word_model::{TranscriptionMarks, WordModel};
pub use oracle::{Criterion, KsOutcome, RelevanceOracle};
pub use phoneme::{PhonemeSource, SourceConfig, StaticPhonemeSource};
pub use synthesis::params::{ChunkMode, Direction, SynthesisParams};
pub use synthesis::report::{SynthesisReport, SynthesisStatus};
pub use synthesis::synthesizer::{SearchState, Synthesizer};
