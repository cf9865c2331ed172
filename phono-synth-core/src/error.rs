use thiserror::Error;

pub type SynthResult<T> = Result<T, SynthError>;

/// Errors raised by corpus construction, phoneme lookup and synthesis.
///
/// Empty candidate texts and zero-total n-gram levels are not errors:
/// they are answered in-band ("not relevant", empty distribution).
#[derive(Debug, Error)]
pub enum SynthError {
	#[error("phoneme lookup failed for `{word}`: {reason}")]
	Provider { word: String, reason: String },

	#[error("word `{0}` is not part of the corpus")]
	UnknownWord(String),

	#[error("invalid parameter: {0}")]
	InvalidParameter(String),

	#[error("missing command `{command}` on PATH")]
	CommandMissing { command: String },

	#[error("command failed: `{command}` (status: {status}){stderr_suffix}")]
	CommandFailed {
		command: String,
		status: i32,
		stderr_suffix: String,
	},

	#[error("http failure: {0}")]
	Http(String),

	#[error("transcription not found in response: {0}")]
	Scrape(String),

	#[error("i/o failure: {0}")]
	Io(#[from] std::io::Error),

	#[error("json failure: {0}")]
	Json(#[from] serde_json::Error),

	#[error("snapshot failure: {0}")]
	Snapshot(#[from] postcard::Error),

	#[error("spreadsheet failure: {0}")]
	Spreadsheet(#[from] rust_xlsxwriter::XlsxError),
}

impl SynthError {
	#[must_use]
	pub fn from_command_failure(command: String, status: i32, stderr: &str) -> Self {
		let trimmed = stderr.trim();
		let stderr_suffix = if trimmed.is_empty() {
			String::new()
		} else {
			format!("; stderr: {trimmed}")
		};
		Self::CommandFailed {
			command,
			status,
			stderr_suffix,
		}
	}

	/// Wraps a source-level failure into a lookup failure for `word`.
	#[must_use]
	pub fn into_lookup_failure(self, word: &str) -> Self {
		match self {
			Self::Provider { .. } => self,
			other => Self::Provider {
				word: word.to_owned(),
				reason: other.to_string(),
			},
		}
	}

	/// True for failures of the external phoneme provider.
	#[must_use]
	pub fn is_provider_failure(&self) -> bool {
		matches!(
			self,
			Self::Provider { .. }
				| Self::CommandMissing { .. }
				| Self::CommandFailed { .. }
				| Self::Http(_)
				| Self::Scrape(_)
		)
	}
}
