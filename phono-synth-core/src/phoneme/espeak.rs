use std::process::{Command, Stdio};

use log::debug;

use super::PhonemeSource;
use crate::error::{SynthError, SynthResult};

pub const DEFAULT_PROGRAM: &str = "espeak";
pub const DEFAULT_VOICE: &str = "en-us";

/// Transcribes words with a local `espeak` compatible command
/// (`<program> -q --ipa -v <voice> <word>`).
#[derive(Clone, Debug)]
pub struct EspeakPhonemeSource {
	program: String,
	voice: String,
}

impl EspeakPhonemeSource {
	pub fn new(program: &str, voice: &str) -> Self {
		Self {
			program: program.to_owned(),
			voice: voice.to_owned(),
		}
	}

	fn args(&self, word: &str) -> Vec<String> {
		vec![
			"-q".to_owned(),
			"--ipa".to_owned(),
			"-v".to_owned(),
			self.voice.clone(),
			word.to_owned(),
		]
	}
}

impl Default for EspeakPhonemeSource {
	fn default() -> Self {
		Self::new(DEFAULT_PROGRAM, DEFAULT_VOICE)
	}
}

impl PhonemeSource for EspeakPhonemeSource {
	fn text_to_phoneme(&self, word: &str) -> SynthResult<String> {
		if which::which(&self.program).is_err() {
			return Err(SynthError::CommandMissing {
				command: self.program.clone(),
			});
		}

		let args = self.args(word);
		let rendered = format!("{} {}", self.program, args.join(" "));
		let output = Command::new(&self.program)
			.args(&args)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.output()?;

		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr);
			return Err(SynthError::from_command_failure(
				rendered,
				output.status.code().unwrap_or(-1),
				&stderr,
			));
		}

		let transcription = String::from_utf8_lossy(&output.stdout).trim().to_owned();
		debug!("{rendered} -> {transcription}");
		Ok(transcription)
	}
}
