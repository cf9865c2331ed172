use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::warn;
use tempfile::NamedTempFile;

use crate::error::SynthResult;

/// Default file name of the on-disk transcription cache.
pub const DEFAULT_CACHE_FILE: &str = "saved_phonemes.json";

/// Word → transcription mapping.
pub type Transcriptions = BTreeMap<String, String>;

/// Durable store of already resolved transcriptions.
pub trait TranscriptionCache {
	/// Returns the stored mapping, or an empty one if nothing usable is stored.
	fn get(&self) -> Transcriptions;

	/// Replaces the stored mapping with `mapping`.
	///
	/// # Errors
	/// Any failure to persist the mapping.
	fn update(&mut self, mapping: &Transcriptions) -> SynthResult<()>;
}

/// Cache persisted as one flat JSON object.
#[derive(Clone, Debug)]
pub struct JsonFileCache {
	path: PathBuf,
}

impl JsonFileCache {
	pub fn new<P: AsRef<Path>>(path: P) -> Self {
		Self {
			path: path.as_ref().to_path_buf(),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn read(&self) -> SynthResult<Transcriptions> {
		let reader = BufReader::new(File::open(&self.path)?);
		Ok(serde_json::from_reader(reader)?)
	}
}

impl Default for JsonFileCache {
	fn default() -> Self {
		Self::new(DEFAULT_CACHE_FILE)
	}
}

impl TranscriptionCache for JsonFileCache {
	fn get(&self) -> Transcriptions {
		if !self.path.exists() {
			return Transcriptions::new();
		}
		match self.read() {
			Ok(mapping) => mapping,
			Err(e) => {
				warn!("ignoring unreadable transcription cache {}: {e}", self.path.display());
				Transcriptions::new()
			}
		}
	}

	/// Writes a temporary sibling file, then renames it over the cache.
	fn update(&mut self, mapping: &Transcriptions) -> SynthResult<()> {
		let parent_dir = match self.path.parent() {
			Some(dir) if !dir.as_os_str().is_empty() => dir,
			_ => Path::new("."),
		};
		fs::create_dir_all(parent_dir)?;

		let temp_file = NamedTempFile::new_in(parent_dir)?;
		{
			let mut writer = BufWriter::new(&temp_file);
			serde_json::to_writer(&mut writer, mapping)?;
			writer.flush()?;
		}
		temp_file.persist(&self.path).map_err(|e| e.error)?;
		Ok(())
	}
}

/// In-memory cache; counts how often it was written.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
	mapping: Transcriptions,
	updates: usize,
}

impl MemoryCache {
	pub fn new(mapping: Transcriptions) -> Self {
		Self { mapping, updates: 0 }
	}

	/// Number of `update` calls so far.
	pub fn updates(&self) -> usize {
		self.updates
	}

	pub fn len(&self) -> usize {
		self.mapping.len()
	}

	pub fn is_empty(&self) -> bool {
		self.mapping.is_empty()
	}
}

impl TranscriptionCache for MemoryCache {
	fn get(&self) -> Transcriptions {
		self.mapping.clone()
	}

	fn update(&mut self, mapping: &Transcriptions) -> SynthResult<()> {
		self.mapping = mapping.clone();
		self.updates += 1;
		Ok(())
	}
}

impl<C: TranscriptionCache + ?Sized> TranscriptionCache for &mut C {
	fn get(&self) -> Transcriptions {
		(**self).get()
	}

	fn update(&mut self, mapping: &Transcriptions) -> SynthResult<()> {
		(**self).update(mapping)
	}
}
