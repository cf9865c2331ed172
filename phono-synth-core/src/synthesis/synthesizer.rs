use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, info};

use super::params::{ChunkMode, Direction, SynthesisParams};
use super::report::{SynthesisReport, SynthesisStatus};
use crate::error::SynthResult;
use crate::model::corpus_model::CorpusModel;
use crate::model::group::Distribution;
use crate::oracle::{KsOutcome, RelevanceOracle};
use crate::text;

/// Position of a run in the search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
	Running,
	Converged,
	Exhausted,
}

/// Greedy append/delete search for a phonetically representative excerpt.
///
/// # Responsibilities
/// - Keep the candidate pool and the result accumulator of one run
/// - Pick the next chunk against the pool's own distribution
/// - Stop once the kept text passes the relevance test against the
///   whole-corpus distribution, or when the pool runs out
///
/// Selection and stopping use two different references: the shrinking
/// pool and the whole corpus respectively.
pub struct Synthesizer<'a> {
	corpus: &'a CorpusModel,
	params: SynthesisParams,
	oracle: RelevanceOracle<'a>,
	initial: Distribution,
	pool: Vec<String>,
	result: Vec<String>,
	iterations: usize,
	last_outcome: Option<KsOutcome>,
	state: SearchState,
	started: Instant,
	timestamp: DateTime<Utc>,
}

impl<'a> Synthesizer<'a> {
	/// Prepares a run over `corpus`.
	///
	/// The pool starts with every non-blank chunk of the corpus text, in
	/// text order.
	pub fn new(corpus: &'a CorpusModel, params: SynthesisParams) -> Self {
		let oracle = RelevanceOracle::new(corpus, params.group_size, params.criterion, params.threshold());
		let initial = corpus.corpus_percentage(params.group_size);
		let pool = match params.mode {
			ChunkMode::Sentence => text::sentences(corpus.text()),
			ChunkMode::Word => text::distinct_words(corpus.text()),
		};

		Self {
			corpus,
			params,
			oracle,
			initial,
			pool,
			result: Vec::new(),
			iterations: 0,
			last_outcome: None,
			state: SearchState::Running,
			started: Instant::now(),
			timestamp: Utc::now(),
		}
	}

	pub fn state(&self) -> SearchState {
		self.state
	}

	pub fn iterations(&self) -> usize {
		self.iterations
	}

	/// Chunks not yet consumed.
	pub fn pool(&self) -> &[String] {
		&self.pool
	}

	/// Chunks that currently make up the result.
	pub fn kept(&self) -> &[String] {
		match self.params.direction {
			Direction::Append => &self.result,
			Direction::Delete => &self.pool,
		}
	}

	/// Corpus-wide distribution used by the stopping test.
	pub fn initial_distribution(&self) -> &Distribution {
		&self.initial
	}

	/// Runs one iteration. Does nothing once the search has stopped.
	pub fn step(&mut self) -> SynthResult<SearchState> {
		if self.state != SearchState::Running {
			return Ok(self.state);
		}

		let pool_distribution = self.oracle.distribution(&self.pool)?;
		let choice = match self.params.direction {
			Direction::Append => self.oracle.best_of(&self.pool, &pool_distribution)?,
			Direction::Delete => self.oracle.worst_of(&self.pool, &pool_distribution)?,
		};

		let Some(choice) = choice else {
			info!("candidate pool exhausted after {} iterations", self.iterations);
			self.state = SearchState::Exhausted;
			return Ok(self.state);
		};

		let chunk = self.pool.remove(choice.index);
		self.iterations += 1;
		info!(
			"iteration {}: {} `{}` (statistic {:.6}, pvalue {:.6})",
			self.iterations, self.params.direction, chunk, choice.outcome.statistic, choice.outcome.pvalue
		);
		if self.params.direction == Direction::Append {
			self.result.push(chunk);
		}

		let kept = match self.params.direction {
			Direction::Append => &self.result,
			Direction::Delete => &self.pool,
		};
		self.last_outcome = self.oracle.evaluate(kept, &self.initial)?;
		debug!("stopping test: {:?}", self.last_outcome);

		if self.last_outcome.is_some_and(|outcome| self.oracle.accepts(&outcome)) {
			info!("converged after {} iterations", self.iterations);
			self.state = SearchState::Converged;
		}
		Ok(self.state)
	}

	/// Steps until the search stops and reports the outcome.
	pub fn run(mut self) -> SynthResult<SynthesisReport> {
		while self.step()? == SearchState::Running {}
		self.into_report()
	}

	fn render(&self, chunks: &[String]) -> String {
		match self.params.mode {
			ChunkMode::Sentence => chunks
				.iter()
				.map(|sentence| format!("{sentence}{}", text::SENTENCE_END))
				.collect::<Vec<_>>()
				.join(" "),
			ChunkMode::Word => chunks.join(" "),
		}
	}

	fn into_report(self) -> SynthResult<SynthesisReport> {
		let status = match self.state {
			SearchState::Converged => SynthesisStatus::Converged,
			SearchState::Running | SearchState::Exhausted => SynthesisStatus::Exhausted,
		};
		let kept = self.kept();
		let text = self.render(kept);
		let result_distribution = self.oracle.distribution(kept)?;
		let outcome = self.last_outcome.unwrap_or(KsOutcome::DISJOINT);

		Ok(SynthesisReport {
			mode: self.params.mode,
			criterion: self.params.criterion,
			threshold: self.params.threshold(),
			timestamp: self.timestamp,
			initial_words: self.corpus.word_count(),
			result_words: text::words(&text).count(),
			initial_distribution: self.initial.clone(),
			result_distribution,
			run_time: self.started.elapsed().as_secs_f64(),
			iterations: self.iterations,
			direction: self.params.direction,
			pvalue: outcome.pvalue,
			statistic: outcome.statistic,
			group_size: self.params.group_size,
			status,
			text,
		})
	}
}
