use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};

/// Raw (weighted) occurrence counts of phoneme groups, keyed by the
/// concatenated group text.
pub type GroupCounts = BTreeMap<String, u64>;

/// Share of each phoneme group inside one population.
///
/// Keys are sorted, so iteration (and therefore float summation) is
/// deterministic across runs.
pub type Distribution = BTreeMap<String, f64>;

/// Width of a phoneme group window.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupLevel {
	Single,
	Pair,
	Triplet,
}

impl GroupLevel {
	pub const ALL: [GroupLevel; 3] = [GroupLevel::Single, GroupLevel::Pair, GroupLevel::Triplet];

	/// Number of consecutive tokens in one group.
	pub fn width(self) -> usize {
		match self {
			GroupLevel::Single => 1,
			GroupLevel::Pair => 2,
			GroupLevel::Triplet => 3,
		}
	}
}

/// Which group levels are merged into every distribution of a run.
///
/// A size of `k` selects the levels `1..=k`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub struct GroupSize(u8);

impl GroupSize {
	pub const SINGLES: GroupSize = GroupSize(1);
	pub const PAIRS: GroupSize = GroupSize(2);
	pub const TRIPLETS: GroupSize = GroupSize(3);

	/// Creates a group size.
	///
	/// # Errors
	/// Returns an error unless `size` is 1, 2 or 3.
	pub fn new(size: u8) -> SynthResult<Self> {
		if !(1..=3).contains(&size) {
			return Err(SynthError::InvalidParameter(format!(
				"phoneme group size must be 1, 2 or 3, got {size}"
			)));
		}
		Ok(Self(size))
	}

	pub fn get(self) -> u8 {
		self.0
	}

	/// Levels merged by this size, smallest first.
	pub fn levels(self) -> &'static [GroupLevel] {
		&GroupLevel::ALL[..usize::from(self.0)]
	}
}

impl Default for GroupSize {
	fn default() -> Self {
		GroupSize::SINGLES
	}
}

impl TryFrom<u8> for GroupSize {
	type Error = SynthError;

	fn try_from(value: u8) -> SynthResult<Self> {
		GroupSize::new(value)
	}
}

impl From<GroupSize> for u8 {
	fn from(value: GroupSize) -> Self {
		value.0
	}
}

impl FromStr for GroupSize {
	type Err = SynthError;

	fn from_str(s: &str) -> SynthResult<Self> {
		let size = s
			.trim()
			.parse::<u8>()
			.map_err(|_| SynthError::InvalidParameter(format!("phoneme group size must be an integer, got `{s}`")))?;
		GroupSize::new(size)
	}
}

impl fmt::Display for GroupSize {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Turns counts into shares of their own total.
///
/// A zero total yields the empty distribution.
pub fn to_distribution(counts: &GroupCounts) -> Distribution {
	let total: u64 = counts.values().sum();
	if total == 0 {
		return Distribution::new();
	}
	counts
		.iter()
		.filter(|(_, count)| **count > 0)
		.map(|(key, count)| (key.clone(), *count as f64 / total as f64))
		.collect()
}

/// Union of per-level distributions.
///
/// A key found in several levels has its shares summed.
pub fn merge_distributions<I>(levels: I) -> Distribution
where
	I: IntoIterator<Item = Distribution>,
{
	let mut merged = Distribution::new();
	for distribution in levels {
		for (key, share) in distribution {
			*merged.entry(key).or_insert(0.0) += share;
		}
	}
	merged
}

/// Adds `weight` times every count of `other` into `target`.
pub(crate) fn add_counts(target: &mut GroupCounts, other: &GroupCounts, weight: u64) {
	for (key, count) in other {
		*target.entry(key.clone()).or_insert(0) += count * weight;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn group_size_selects_levels_up_to_its_width() {
		assert_eq!(GroupSize::SINGLES.levels(), &[GroupLevel::Single]);
		assert_eq!(GroupSize::PAIRS.levels(), &[GroupLevel::Single, GroupLevel::Pair]);
		assert_eq!(GroupSize::TRIPLETS.levels(), &GroupLevel::ALL);
	}

	#[test]
	fn group_size_rejects_out_of_range() {
		assert!(GroupSize::new(0).is_err());
		assert!(GroupSize::new(4).is_err());
		assert!("x".parse::<GroupSize>().is_err());
		assert_eq!("2".parse::<GroupSize>().unwrap(), GroupSize::PAIRS);
	}

	#[test]
	fn distribution_of_zero_total_is_empty() {
		assert!(to_distribution(&GroupCounts::new()).is_empty());

		let mut zeros = GroupCounts::new();
		zeros.insert("a".to_owned(), 0);
		assert!(to_distribution(&zeros).is_empty());
	}

	#[test]
	fn distribution_sums_to_one() {
		let counts: GroupCounts = [("a", 1), ("b", 2), ("c", 5)]
			.into_iter()
			.map(|(k, v)| (k.to_owned(), v))
			.collect();
		let distribution = to_distribution(&counts);
		let sum: f64 = distribution.values().sum();
		assert!((sum - 1.0).abs() < 1e-12);
		assert!((distribution["c"] - 0.625).abs() < 1e-12);
	}

	#[test]
	fn merge_sums_colliding_keys() {
		let a: Distribution = [("x".to_owned(), 0.5), ("y".to_owned(), 0.5)].into_iter().collect();
		let b: Distribution = [("x".to_owned(), 0.25), ("z".to_owned(), 0.75)].into_iter().collect();
		let merged = merge_distributions([a, b]);
		assert_eq!(merged.len(), 3);
		assert!((merged["x"] - 0.75).abs() < 1e-12);
	}
}
