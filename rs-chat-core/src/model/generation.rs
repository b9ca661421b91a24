use log::debug;
use rand::Rng;

use super::distribution::Distribution;
use super::mixture::{build_mixture, smooth, unigram_fallback};
use super::multigram_model::MultiGramModel;
use super::prediction_input::PredictionInput;
use super::sampler::{RecentCounts, Sampler, SamplingParams};
use crate::config::GeneratorConfig;
use crate::text::{LINE_BREAK, Language};

/// Why the generation loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
	/// No candidate left at any fallback level.
	Exhausted,
	/// A line break after the minimum reply length.
	SentenceBreak,
	/// The model started a new user turn; the role tag was removed.
	RoleSwitch,
	/// The per-call token budget was reached.
	Budget,
}

/// Tokens produced by one call, before detokenization.
#[derive(Clone, Debug, PartialEq)]
pub struct Generation {
	pub tokens: Vec<String>,
	pub stop_reason: StopReason,
}

/// Level of the backoff chain that produced a candidate set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateSource {
	/// Context mixture, smoothed and language filtered.
	Mixture,
	/// Unigram counts, language filtered.
	Unigram,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Candidates {
	pub distribution: Distribution,
	pub source: CandidateSource,
}

enum Step {
	Running,
	Stopped(StopReason),
}

/// Token-by-token generation loop over one model.
///
/// Borrows everything it needs for a single call: the model, the engine
/// configuration, the sampler and the conversation's target language.
pub struct TokenGenerator<'a> {
	model: &'a MultiGramModel,
	config: &'a GeneratorConfig,
	sampler: &'a Sampler,
	language: Language,
}

impl<'a> TokenGenerator<'a> {
	pub fn new(model: &'a MultiGramModel, config: &'a GeneratorConfig, sampler: &'a Sampler, language: Language) -> Self {
		Self { model, config, sampler, language }
	}

	/// Next-token candidates after `sequence`.
	///
	/// The smoothed context mixture restricted to the target language (or to
	/// neutral tokens) is preferred. When no context matched, or filtering
	/// left nothing, the language-filtered unigram table is used instead.
	pub fn candidates(&self, sequence: &[String]) -> Candidates {
		let (mut mixture, hits) = build_mixture(self.model, sequence, self.config.order_gamma);
		if hits > 0 {
			smooth(&mut mixture, self.model.unigram(), self.config.unigram_lambda);
			let filtered = mixture.of_language_or_neutral(self.language, &self.config.scripts);
			if !filtered.is_empty() {
				return Candidates { distribution: filtered, source: CandidateSource::Mixture };
			}
			debug!("no {} candidate among {} mixed tokens", self.language.code(), mixture.len());
		}

		Candidates {
			distribution: unigram_fallback(self.model, self.language, &self.config.scripts),
			source: CandidateSource::Unigram,
		}
	}

	/// Generates a reply continuing `history`.
	///
	/// Runs until a stop condition fires or `input.max_tokens()` tokens were
	/// produced. `history` itself is left untouched.
	pub fn run<R: Rng + ?Sized>(&self, history: &[String], input: &PredictionInput, rng: &mut R) -> Generation {
		let params = input.sampling_params();
		let mut sequence = history.to_vec();
		let start = sequence.len();

		let stop_reason = loop {
			if let Step::Stopped(reason) = self.step(&mut sequence, start, input, &params, &mut *rng) {
				break reason;
			}
		};

		let tokens = sequence.split_off(start);
		debug!("generated {} tokens, stopped: {:?}", tokens.len(), stop_reason);
		Generation { tokens, stop_reason }
	}

	/// Emits one token at the end of `sequence`; `sequence[start..]` is the
	/// reply generated so far.
	fn step<R: Rng + ?Sized>(
		&self,
		sequence: &mut Vec<String>,
		start: usize,
		input: &PredictionInput,
		params: &SamplingParams,
		rng: &mut R,
	) -> Step {
		let emitted = sequence.len() - start;
		if emitted >= input.max_tokens() {
			return Step::Stopped(StopReason::Budget);
		}

		let recent = RecentCounts::from_window(sequence.as_slice(), input.rep_window());
		let mut distribution = self.candidates(sequence).distribution;

		let Some(mut chosen) = self.sampler.sample(&distribution, sequence, params, &recent, &mut *rng) else {
			return Step::Stopped(StopReason::Exhausted);
		};

		// A role tag right after a line break opens a fake user turn: draw once more
		let after_line_break = emitted > 0 && sequence.last().is_some_and(|t| t == LINE_BREAK);
		if after_line_break && chosen == self.config.user_tag {
			debug!("role tag {chosen:?} after line break, resampling");
			distribution.set(&chosen, 0.0);
			if !distribution.has_mass() {
				distribution = unigram_fallback(self.model, self.language, &self.config.scripts);
			}
			chosen = match self.sampler.sample(&distribution, sequence, params, &recent, &mut *rng) {
				Some(token) => token,
				None => return Step::Stopped(StopReason::Exhausted),
			};
		}

		let is_line_break = chosen == LINE_BREAK;
		sequence.push(chosen);

		if is_line_break && emitted >= self.config.min_stop_len {
			return Step::Stopped(StopReason::SentenceBreak);
		}

		if self.ends_with_role_switch(&sequence[start..]) {
			sequence.truncate(sequence.len() - 2);
			return Step::Stopped(StopReason::RoleSwitch);
		}

		if sequence.len() - start >= input.max_tokens() {
			return Step::Stopped(StopReason::Budget);
		}

		Step::Running
	}

	/// `["\n", user_tag, ":"]` at the end of the reply.
	fn ends_with_role_switch(&self, reply: &[String]) -> bool {
		match reply {
			[.., line_break, tag, colon] => {
				line_break == LINE_BREAK && *tag == self.config.user_tag && colon == ":"
			}
			_ => false,
		}
	}
}
