use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};
use crate::model::group::GroupSize;
use crate::oracle::Criterion;

/// Unit of candidate text.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChunkMode {
	/// Sentences of the normalized text.
	#[default]
	Sentence,
	/// Distinct normalized words.
	Word,
}

/// Whether the result is grown from nothing or carved out of the full text.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
	/// Move the most representative pool chunk into the result.
	#[default]
	Append,
	/// Drop the least representative chunk; the pool is the result.
	Delete,
}

impl ChunkMode {
	pub const ALL: [ChunkMode; 2] = [ChunkMode::Sentence, ChunkMode::Word];
}

impl Direction {
	pub const ALL: [Direction; 2] = [Direction::Append, Direction::Delete];
}

impl fmt::Display for ChunkMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			ChunkMode::Sentence => "sentence",
			ChunkMode::Word => "word",
		})
	}
}

impl FromStr for ChunkMode {
	type Err = SynthError;

	fn from_str(s: &str) -> SynthResult<Self> {
		match s.trim().to_lowercase().as_str() {
			"sentence" => Ok(ChunkMode::Sentence),
			"word" => Ok(ChunkMode::Word),
			other => Err(SynthError::InvalidParameter(format!("mode must be `sentence` or `word`, got `{other}`"))),
		}
	}
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Direction::Append => "append",
			Direction::Delete => "delete",
		})
	}
}

impl FromStr for Direction {
	type Err = SynthError;

	fn from_str(s: &str) -> SynthResult<Self> {
		match s.trim().to_lowercase().as_str() {
			"append" => Ok(Direction::Append),
			"delete" => Ok(Direction::Delete),
			other => Err(SynthError::InvalidParameter(format!(
				"synthesis direction must be `append` or `delete`, got `{other}`"
			))),
		}
	}
}

/// Default relevance threshold (minimum p-value).
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Parameters of one synthesis run.
///
/// # Invariants
/// - `threshold` is within `[0.0, 1.0]`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(try_from = "RawParams")]
pub struct SynthesisParams {
	pub mode: ChunkMode,
	pub direction: Direction,
	pub criterion: Criterion,
	pub group_size: GroupSize,
	threshold: f64,
}

/// Unchecked wire form of [`SynthesisParams`]; missing fields take defaults.
#[derive(Deserialize)]
#[serde(default)]
struct RawParams {
	mode: ChunkMode,
	direction: Direction,
	criterion: Criterion,
	group_size: GroupSize,
	threshold: f64,
}

impl Default for RawParams {
	fn default() -> Self {
		Self {
			mode: ChunkMode::default(),
			direction: Direction::default(),
			criterion: Criterion::default(),
			group_size: GroupSize::default(),
			threshold: DEFAULT_THRESHOLD,
		}
	}
}

impl TryFrom<RawParams> for SynthesisParams {
	type Error = SynthError;

	fn try_from(raw: RawParams) -> SynthResult<Self> {
		Self::new(raw.mode, raw.direction, raw.criterion, raw.group_size, raw.threshold)
	}
}

impl Default for SynthesisParams {
	fn default() -> Self {
		Self {
			mode: ChunkMode::default(),
			direction: Direction::default(),
			criterion: Criterion::default(),
			group_size: GroupSize::default(),
			threshold: DEFAULT_THRESHOLD,
		}
	}
}

impl SynthesisParams {
	/// Creates a parameter set.
	///
	/// # Errors
	/// Returns an error if `threshold` is outside `[0.0, 1.0]`.
	pub fn new(
		mode: ChunkMode,
		direction: Direction,
		criterion: Criterion,
		group_size: GroupSize,
		threshold: f64,
	) -> SynthResult<Self> {
		let mut params = Self {
			mode,
			direction,
			criterion,
			group_size,
			threshold: DEFAULT_THRESHOLD,
		};
		params.set_threshold(threshold)?;
		Ok(params)
	}

	/// Returns the relevance threshold.
	pub fn threshold(&self) -> f64 {
		self.threshold
	}

	/// Sets the relevance threshold (0.0..=1.0).
	///
	/// # Errors
	/// Returns an error if the value is outside the valid range.
	pub fn set_threshold(&mut self, threshold: f64) -> SynthResult<()> {
		if !(0.0..=1.0).contains(&threshold) {
			return Err(SynthError::InvalidParameter(format!(
				"relevance threshold must be between 0.0 and 1.0, got {threshold}"
			)));
		}
		self.threshold = threshold;
		Ok(())
	}

	/// Every combination of mode, direction, criterion and group size at
	/// `threshold`.
	///
	/// # Errors
	/// Returns an error if `threshold` is outside `[0.0, 1.0]`.
	pub fn grid(threshold: f64) -> SynthResult<Vec<Self>> {
		let mut grid = Vec::new();
		for mode in ChunkMode::ALL {
			for direction in Direction::ALL {
				for criterion in Criterion::ALL {
					for group_size in [GroupSize::SINGLES, GroupSize::PAIRS, GroupSize::TRIPLETS] {
						grid.push(Self::new(mode, direction, criterion, group_size, threshold)?);
					}
				}
			}
		}
		Ok(grid)
	}
}
