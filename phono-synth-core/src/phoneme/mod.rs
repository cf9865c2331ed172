//! Word → transcription providers.
//!
//! The corpus model only sees the [`PhonemeSource`] trait; which provider
//! answers is chosen by [`SourceConfig`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};

/// Local phonemizer run as a subprocess.
pub mod espeak;

/// Remote HTML form lookup.
pub mod remote;

pub use espeak::EspeakPhonemeSource;
pub use remote::RemotePhonemeSource;

/// Maps a normalized word to its transcription string.
pub trait PhonemeSource {
	/// Returns the phonetic transcription of `word`.
	///
	/// # Errors
	/// Any network or process failure of the provider.
	fn text_to_phoneme(&self, word: &str) -> SynthResult<String>;
}

impl<S: PhonemeSource + ?Sized> PhonemeSource for Box<S> {
	fn text_to_phoneme(&self, word: &str) -> SynthResult<String> {
		(**self).text_to_phoneme(word)
	}
}

impl<S: PhonemeSource + ?Sized> PhonemeSource for &S {
	fn text_to_phoneme(&self, word: &str) -> SynthResult<String> {
		(**self).text_to_phoneme(word)
	}
}

/// Fixed in-memory transcription table.
#[derive(Clone, Debug, Default)]
pub struct StaticPhonemeSource {
	table: BTreeMap<String, String>,
}

impl StaticPhonemeSource {
	pub fn new<I, K, V>(entries: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			table: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
		}
	}
}

impl PhonemeSource for StaticPhonemeSource {
	fn text_to_phoneme(&self, word: &str) -> SynthResult<String> {
		self.table.get(word).cloned().ok_or_else(|| SynthError::Provider {
			word: word.to_owned(),
			reason: "no transcription in static table".to_owned(),
		})
	}
}

/// Provider selection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
	Remote { url: String },
	Espeak { program: String, voice: String },
}

impl SourceConfig {
	pub fn remote() -> Self {
		SourceConfig::Remote { url: remote::DEFAULT_URL.to_owned() }
	}

	pub fn espeak() -> Self {
		SourceConfig::Espeak {
			program: espeak::DEFAULT_PROGRAM.to_owned(),
			voice: espeak::DEFAULT_VOICE.to_owned(),
		}
	}

	/// Instantiates the configured provider.
	///
	/// # Errors
	/// Returns an error if the HTTP client cannot be built.
	pub fn build(&self) -> SynthResult<Box<dyn PhonemeSource + Send + Sync>> {
		Ok(match self {
			SourceConfig::Remote { url } => Box::new(RemotePhonemeSource::new(url)?),
			SourceConfig::Espeak { program, voice } => Box::new(EspeakPhonemeSource::new(program, voice)),
		})
	}
}

impl Default for SourceConfig {
	fn default() -> Self {
		SourceConfig::remote()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn static_source_answers_known_words_only() {
		let source = StaticPhonemeSource::new([("cat", "kæt")]);
		assert_eq!(source.text_to_phoneme("cat").unwrap(), "kæt");
		let err = source.text_to_phoneme("dog").unwrap_err();
		assert!(matches!(err, SynthError::Provider { word, .. } if word == "dog"));
	}

	#[test]
	fn boxed_source_delegates() {
		let source: Box<dyn PhonemeSource> = Box::new(StaticPhonemeSource::new([("a", "ə")]));
		assert_eq!(source.text_to_phoneme("a").unwrap(), "ə");
	}

	#[test]
	fn source_config_reads_tagged_json() {
		let config: SourceConfig =
			serde_json::from_str(r#"{"kind":"espeak","program":"espeak-ng","voice":"en-gb"}"#).unwrap();
		assert_eq!(
			config,
			SourceConfig::Espeak { program: "espeak-ng".to_owned(), voice: "en-gb".to_owned() }
		);
		assert_eq!(SourceConfig::default(), SourceConfig::remote());
	}
}
