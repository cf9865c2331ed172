//! Two-sample similarity test between phoneme distributions.
//!
//! Two distributions are aligned over the keys of the reference (missing
//! candidate keys count as `0.0`) and the two resulting value sequences are
//! fed to an asymptotic two-sided Kolmogorov–Smirnov test. The p-value and
//! statistic are used as similarity scores between percentage profiles.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};
use crate::model::corpus_model::CorpusModel;
use crate::model::group::{Distribution, GroupSize};
use crate::text;

/// Result of one two-sample test.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct KsOutcome {
	pub statistic: f64,
	pub pvalue: f64,
}

impl KsOutcome {
	/// Outcome used when there is nothing to compare.
	pub const DISJOINT: KsOutcome = KsOutcome { statistic: 1.0, pvalue: 0.0 };
}

/// Which half of the test output drives best/worst selection.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
	/// Higher p-value is more similar.
	#[default]
	PValue,
	/// Lower statistic is more similar.
	Statistic,
}

impl Criterion {
	pub const ALL: [Criterion; 2] = [Criterion::PValue, Criterion::Statistic];

	/// True when `candidate` is strictly more similar than `incumbent`.
	pub fn is_better(self, candidate: &KsOutcome, incumbent: &KsOutcome) -> bool {
		match self {
			Criterion::PValue => candidate.pvalue > incumbent.pvalue,
			Criterion::Statistic => candidate.statistic < incumbent.statistic,
		}
	}

	/// True when `candidate` is strictly less similar than `incumbent`.
	pub fn is_worse(self, candidate: &KsOutcome, incumbent: &KsOutcome) -> bool {
		match self {
			Criterion::PValue => candidate.pvalue < incumbent.pvalue,
			Criterion::Statistic => candidate.statistic > incumbent.statistic,
		}
	}
}

impl fmt::Display for Criterion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Criterion::PValue => "pvalue",
			Criterion::Statistic => "statistic",
		})
	}
}

impl FromStr for Criterion {
	type Err = SynthError;

	fn from_str(s: &str) -> SynthResult<Self> {
		match s.trim().to_lowercase().as_str() {
			"pvalue" => Ok(Criterion::PValue),
			"statistic" => Ok(Criterion::Statistic),
			other => Err(SynthError::InvalidParameter(format!(
				"distribution criterion must be `pvalue` or `statistic`, got `{other}`"
			))),
		}
	}
}

/// A candidate chosen by [`RelevanceOracle::best_of`] or [`RelevanceOracle::worst_of`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Choice {
	/// Position of the chunk in the candidate slice.
	pub index: usize,
	pub outcome: KsOutcome,
}

/// Survival function of the Kolmogorov distribution, `P(K > x)`.
pub fn kolmogorov_sf(x: f64) -> f64 {
	if x <= 0.0 || x.is_nan() {
		return 1.0;
	}

	if x < 1.18 {
		// Jacobi theta form of the CDF, converges fast for small x
		let factor = (2.0 * PI).sqrt() / x;
		let w = -PI * PI / (8.0 * x * x);
		let mut cdf = 0.0;
		for k in 1..=40 {
			let j = f64::from(2 * k - 1);
			let term = (w * j * j).exp();
			cdf += term;
			if term <= f64::EPSILON * cdf {
				break;
			}
		}
		return (1.0 - factor * cdf).clamp(0.0, 1.0);
	}

	let mut sf = 0.0;
	let mut sign = 1.0;
	for k in 1..=100 {
		let k = f64::from(k);
		let term = (-2.0 * k * k * x * x).exp();
		sf += sign * term;
		if term <= f64::EPSILON * sf.abs() {
			break;
		}
		sign = -sign;
	}
	(2.0 * sf).clamp(0.0, 1.0)
}

/// Asymptotic two-sided two-sample Kolmogorov–Smirnov test.
///
/// - `statistic` is the largest gap between the two empirical CDFs
/// - `pvalue` is `Q((√en + 0.12 + 0.11/√en) · statistic)` with
///   `en = n1·n2 / (n1 + n2)`
///
/// An empty sample yields [`KsOutcome::DISJOINT`].
pub fn ks_2samp(first: &[f64], second: &[f64]) -> KsOutcome {
	if first.is_empty() || second.is_empty() {
		return KsOutcome::DISJOINT;
	}

	let mut first = first.to_vec();
	let mut second = second.to_vec();
	first.sort_by(f64::total_cmp);
	second.sort_by(f64::total_cmp);

	let n1 = first.len() as f64;
	let n2 = second.len() as f64;

	let mut statistic: f64 = 0.0;
	for value in first.iter().chain(second.iter()) {
		let cdf1 = first.partition_point(|x| x <= value) as f64 / n1;
		let cdf2 = second.partition_point(|x| x <= value) as f64 / n2;
		statistic = statistic.max((cdf1 - cdf2).abs());
	}

	let en = (n1 * n2 / (n1 + n2)).sqrt();
	let pvalue = kolmogorov_sf((en + 0.12 + 0.11 / en) * statistic);
	KsOutcome { statistic, pvalue }
}

/// Aligns `candidate` on the keys of `reference` and tests the two value
/// sequences. Keys only present in `candidate` are ignored.
pub fn compare(candidate: &Distribution, reference: &Distribution) -> KsOutcome {
	let (aligned, expected): (Vec<f64>, Vec<f64>) = reference
		.iter()
		.map(|(key, share)| (candidate.get(key).copied().unwrap_or(0.0), *share))
		.unzip();
	ks_2samp(&aligned, &expected)
}

/// Relevance predicate and best/worst chunk selection of a synthesis run.
#[derive(Clone, Copy, Debug)]
pub struct RelevanceOracle<'a> {
	corpus: &'a CorpusModel,
	group_size: GroupSize,
	criterion: Criterion,
	threshold: f64,
}

impl<'a> RelevanceOracle<'a> {
	pub fn new(corpus: &'a CorpusModel, group_size: GroupSize, criterion: Criterion, threshold: f64) -> Self {
		Self {
			corpus,
			group_size,
			criterion,
			threshold,
		}
	}

	pub fn threshold(&self) -> f64 {
		self.threshold
	}

	/// Distribution of several chunks taken together.
	pub fn distribution<T: AsRef<str>>(&self, chunks: &[T]) -> SynthResult<Distribution> {
		self.corpus.chunks_percentage(chunks, self.group_size)
	}

	/// Tests `chunks` (taken together) against `reference`.
	///
	/// Returns `None` without running the test when the chunks hold no word
	/// or the reference is empty.
	pub fn evaluate<T: AsRef<str>>(&self, chunks: &[T], reference: &Distribution) -> SynthResult<Option<KsOutcome>> {
		if reference.is_empty() || chunks.iter().all(|chunk| text::is_blank(chunk.as_ref())) {
			return Ok(None);
		}
		let distribution = self.distribution(chunks)?;
		Ok(Some(compare(&distribution, reference)))
	}

	/// True iff the p-value reaches the threshold.
	pub fn accepts(&self, outcome: &KsOutcome) -> bool {
		outcome.pvalue >= self.threshold
	}

	/// True iff `chunks` are relevant to `reference`; always false for empty text.
	pub fn is_relevant<T: AsRef<str>>(&self, chunks: &[T], reference: &Distribution) -> SynthResult<bool> {
		Ok(self
			.evaluate(chunks, reference)?
			.is_some_and(|outcome| self.accepts(&outcome)))
	}

	/// Candidate most similar to `reference`; the first one wins ties.
	pub fn best_of<T: AsRef<str>>(&self, candidates: &[T], reference: &Distribution) -> SynthResult<Option<Choice>> {
		let criterion = self.criterion;
		self.select(candidates, reference, |candidate, incumbent| criterion.is_better(candidate, incumbent))
	}

	/// Candidate least similar to `reference`; the first one wins ties.
	pub fn worst_of<T: AsRef<str>>(&self, candidates: &[T], reference: &Distribution) -> SynthResult<Option<Choice>> {
		let criterion = self.criterion;
		self.select(candidates, reference, |candidate, incumbent| criterion.is_worse(candidate, incumbent))
	}

	fn select<T, F>(&self, candidates: &[T], reference: &Distribution, replaces: F) -> SynthResult<Option<Choice>>
	where
		T: AsRef<str>,
		F: Fn(&KsOutcome, &KsOutcome) -> bool,
	{
		let mut chosen: Option<Choice> = None;
		for (index, candidate) in candidates.iter().enumerate() {
			let chunk = candidate.as_ref();
			if text::is_blank(chunk) {
				continue;
			}
			let distribution = self.corpus.chunk_percentage(chunk, self.group_size)?;
			let outcome = compare(&distribution, reference);
			debug!(
				"analyzing `{chunk}`: statistic {:.6}, pvalue {:.6}",
				outcome.statistic, outcome.pvalue
			);

			let replace = match &chosen {
				None => true,
				Some(incumbent) => replaces(&outcome, &incumbent.outcome),
			};
			if replace {
				chosen = Some(Choice { index, outcome });
			}
		}
		Ok(chosen)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cache::MemoryCache;
	use crate::model::word_model::TranscriptionMarks;
	use crate::phoneme::StaticPhonemeSource;

	fn close(actual: f64, expected: f64, tolerance: f64) {
		assert!((actual - expected).abs() < tolerance, "{actual} != {expected}");
	}

	fn distribution(entries: &[(&str, f64)]) -> Distribution {
		entries.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
	}

	fn corpus(text: &str) -> CorpusModel {
		let source = StaticPhonemeSource::new([
			("cat", "kæt"),
			("sat", "sæt"),
			("mat", "mæt"),
			("dog", "dɒg"),
			("top", "tɒp"),
		]);
		let mut cache = MemoryCache::default();
		CorpusModel::build(text, &source, &mut cache, &TranscriptionMarks::default()).unwrap()
	}

	#[test]
	fn kolmogorov_survival_matches_reference_values() {
		close(kolmogorov_sf(0.0), 1.0, 1e-15);
		close(kolmogorov_sf(0.5), 0.963_945_243_664_875, 1e-9);
		close(kolmogorov_sf(1.0), 0.269_999_671_677_354_6, 1e-9);
		close(kolmogorov_sf(2.0), 0.000_670_925_255_779_695, 1e-12);
		// both series agree where they switch
		close(kolmogorov_sf(1.179_999_9), kolmogorov_sf(1.18), 1e-6);
	}

	#[test]
	fn identical_samples_are_indistinguishable() {
		let outcome = ks_2samp(&[0.1, 0.2, 0.3], &[0.3, 0.1, 0.2]);
		assert_eq!(outcome.statistic, 0.0);
		assert_eq!(outcome.pvalue, 1.0);
	}

	#[test]
	fn ks_matches_reference_computation() {
		let disjoint = ks_2samp(&[0.1, 0.2], &[0.7, 0.8]);
		close(disjoint.statistic, 1.0, 1e-15);
		close(disjoint.pvalue, 0.097_026_897_595_220_7, 1e-9);

		let shifted = ks_2samp(&[1.0, 2.0, 3.0, 4.0, 5.0], &[3.0, 4.0, 5.0, 6.0, 7.0]);
		close(shifted.statistic, 0.4, 1e-15);
		close(shifted.pvalue, 0.697_404_878_020_590_8, 1e-9);
	}

	#[test]
	fn empty_sample_is_disjoint() {
		assert_eq!(ks_2samp(&[], &[0.5]), KsOutcome::DISJOINT);
	}

	#[test]
	fn alignment_uses_reference_keys_and_zero_fill() {
		let reference = distribution(&[("k", 1.0 / 9.0), ("æ", 3.0 / 9.0), ("t", 3.0 / 9.0), ("s", 1.0 / 9.0), ("m", 1.0 / 9.0)]);
		let candidate = distribution(&[("k", 1.0 / 3.0), ("æ", 1.0 / 3.0), ("t", 1.0 / 3.0), ("z", 0.5)]);

		let outcome = compare(&candidate, &reference);
		let expected = ks_2samp(
			&[1.0 / 3.0, 0.0, 0.0, 1.0 / 3.0, 1.0 / 3.0],
			&[1.0 / 9.0, 1.0 / 9.0, 1.0 / 9.0, 3.0 / 9.0, 3.0 / 9.0],
		);
		assert_eq!(outcome, expected);
		close(outcome.statistic, 0.4, 1e-12);
		close(outcome.pvalue, 0.697_404_878_020_590_8, 1e-9);
	}

	#[test]
	fn comparison_is_symmetric_on_shared_keys() {
		let a = distribution(&[("a", 0.5), ("b", 0.3), ("c", 0.2)]);
		let b = distribution(&[("a", 0.1), ("b", 0.1), ("c", 0.8)]);
		let ab = compare(&a, &b);
		let ba = compare(&b, &a);
		assert_eq!(ab.statistic, ba.statistic);
		assert_eq!(ab.pvalue, ba.pvalue);
	}

	#[test]
	fn comparison_is_asymmetric_when_keys_differ() {
		let reference = distribution(&[("a", 0.5), ("b", 0.5)]);
		let wider = distribution(&[("a", 0.5), ("b", 0.25), ("c", 0.25)]);
		let forward = compare(&wider, &reference);
		let backward = compare(&reference, &wider);
		// forward aligns on two keys, backward on three
		assert_eq!(forward, ks_2samp(&[0.5, 0.25], &[0.5, 0.5]));
		assert_eq!(backward, ks_2samp(&[0.5, 0.5, 0.0], &[0.5, 0.25, 0.25]));
	}

	#[test]
	fn criterion_parses_and_displays() {
		assert_eq!("PValue".parse::<Criterion>().unwrap(), Criterion::PValue);
		assert_eq!("statistic".parse::<Criterion>().unwrap(), Criterion::Statistic);
		assert!("both".parse::<Criterion>().is_err());
		assert_eq!(Criterion::Statistic.to_string(), "statistic");
	}

	#[test]
	fn criteria_rank_independently() {
		let high_p = KsOutcome { statistic: 0.5, pvalue: 0.9 };
		let low_stat = KsOutcome { statistic: 0.1, pvalue: 0.2 };
		assert!(Criterion::PValue.is_better(&high_p, &low_stat));
		assert!(Criterion::Statistic.is_better(&low_stat, &high_p));
		assert!(Criterion::PValue.is_worse(&low_stat, &high_p));
		assert!(Criterion::Statistic.is_worse(&high_p, &low_stat));
		assert!(!Criterion::PValue.is_better(&high_p, &high_p));
	}

	#[test]
	fn empty_text_is_never_relevant() {
		let corpus = corpus("cat sat mat.");
		let reference = corpus.corpus_percentage(GroupSize::SINGLES);
		let oracle = RelevanceOracle::new(&corpus, GroupSize::SINGLES, Criterion::PValue, 0.0);

		assert!(!oracle.is_relevant(&[""], &reference).unwrap());
		assert!(!oracle.is_relevant::<&str>(&[], &reference).unwrap());
		assert!(!oracle.is_relevant(&[" . "], &reference).unwrap());
		assert!(!oracle.is_relevant(&["cat"], &Distribution::new()).unwrap());
		assert!(oracle.is_relevant(&["cat sat mat"], &reference).unwrap());
	}

	#[test]
	fn relevance_threshold_is_inclusive() {
		let corpus = corpus("cat sat mat.");
		let reference = corpus.corpus_percentage(GroupSize::SINGLES);
		let exact = RelevanceOracle::new(&corpus, GroupSize::SINGLES, Criterion::PValue, 1.0);
		assert!(exact.is_relevant(&["cat", "sat", "mat"], &reference).unwrap());
	}

	#[test]
	fn best_and_worst_follow_the_criterion() {
		let corpus = corpus("cat sat mat. dog top.");
		let reference = corpus.corpus_percentage(GroupSize::SINGLES);
		let oracle = RelevanceOracle::new(&corpus, GroupSize::SINGLES, Criterion::PValue, 0.7);

		let candidates = ["", "cat sat mat", "dog", "top"];
		let best = oracle.best_of(&candidates, &reference).unwrap().unwrap();
		assert_eq!(best.index, 1);
		// "dog" and "top" tie for last; the first one is kept
		let worst = oracle.worst_of(&candidates, &reference).unwrap().unwrap();
		assert_eq!(worst.index, 2);
		assert!(worst.outcome.pvalue < best.outcome.pvalue);
	}

	#[test]
	fn ties_keep_the_first_candidate() {
		let corpus = corpus("cat sat mat.");
		let reference = corpus.corpus_percentage(GroupSize::SINGLES);
		for criterion in Criterion::ALL {
			let oracle = RelevanceOracle::new(&corpus, GroupSize::SINGLES, criterion, 0.7);
			// every word scores the same against the corpus
			let candidates = ["sat", "mat", "cat"];
			assert_eq!(oracle.best_of(&candidates, &reference).unwrap().unwrap().index, 0);
			assert_eq!(oracle.worst_of(&candidates, &reference).unwrap().unwrap().index, 0);
		}
	}

	#[test]
	fn blank_candidates_give_no_choice() {
		let corpus = corpus("cat sat mat.");
		let reference = corpus.corpus_percentage(GroupSize::SINGLES);
		let oracle = RelevanceOracle::new(&corpus, GroupSize::SINGLES, Criterion::Statistic, 0.7);
		assert_eq!(oracle.best_of(&["", " . "], &reference).unwrap(), None);
		assert_eq!(oracle.worst_of::<&str>(&[], &reference).unwrap(), None);
	}
}
