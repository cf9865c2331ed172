use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::params::{ChunkMode, Direction};
use crate::model::group::{Distribution, GroupSize};
use crate::oracle::Criterion;

/// How a synthesis run stopped.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisStatus {
	/// The kept text passed the relevance test against the whole corpus.
	Converged,
	/// The candidate pool ran out first; the text is a best-effort partial result.
	Exhausted,
}

impl fmt::Display for SynthesisStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			SynthesisStatus::Converged => "converged",
			SynthesisStatus::Exhausted => "exhausted",
		})
	}
}

/// Everything known about a finished run, as handed to exporters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SynthesisReport {
	pub mode: ChunkMode,
	pub criterion: Criterion,
	pub threshold: f64,
	pub timestamp: DateTime<Utc>,
	pub initial_words: usize,
	pub result_words: usize,
	pub initial_distribution: Distribution,
	pub result_distribution: Distribution,
	/// Wall time of the run, in seconds.
	pub run_time: f64,
	pub iterations: usize,
	pub direction: Direction,
	/// P-value of the last stopping test (0.0 when none ran).
	pub pvalue: f64,
	pub statistic: f64,
	pub group_size: GroupSize,
	pub status: SynthesisStatus,
	pub text: String,
}

impl SynthesisReport {
	/// One-line human summary.
	pub fn summary(&self) -> String {
		format!(
			"{} {} by {} (group size {}): {} after {} iterations, pvalue {:.4}, {} of {} words",
			self.mode,
			self.direction,
			self.criterion,
			self.group_size,
			self.status,
			self.iterations,
			self.pvalue,
			self.result_words,
			self.initial_words
		)
	}
}
