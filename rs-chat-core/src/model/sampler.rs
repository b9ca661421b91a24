use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::Rng;

use super::distribution::Distribution;

/// Floor applied to weights before temperature reshaping, so that a zero
/// weight stays drawable (with negligible probability) instead of
/// breaking the power.
pub const MIN_WEIGHT: f64 = 1e-9;

/// Parameters of one draw.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplingParams {
	/// `< 1` sharpens toward the mode, `> 1` flattens.
	pub temperature: f64,
	/// Candidates kept after sorting (`usize::MAX` keeps all).
	pub top_k: usize,
	/// Fraction of the top-k mass kept by nucleus truncation.
	pub top_p: f64,
	/// `0` disables the repetition penalty.
	pub rep_penalty: f64,
}

/// How often each token occurs in the trailing window of a sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecentCounts(HashMap<String, usize>);

impl RecentCounts {
	/// Counts the last `window` tokens of `sequence` (`0` counts nothing).
	pub fn from_window<S: AsRef<str>>(sequence: &[S], window: usize) -> Self {
		let start = sequence.len().saturating_sub(window);
		let mut counts = HashMap::new();
		for token in &sequence[start..] {
			*counts.entry(token.as_ref().to_owned()).or_insert(0) += 1;
		}
		Self(counts)
	}

	pub fn get(&self, token: &str) -> usize {
		self.0.get(token).copied().unwrap_or(0)
	}
}

/// Optional rule forbidding some continuations outright.
///
/// Returns the tokens that must not follow `sequence`. Implementations
/// are injected into the [`Sampler`]; without one nothing is forbidden.
pub trait BanPolicy: Send + Sync {
	fn forbidden_next(&self, sequence: &[String]) -> HashSet<String>;
}

/// Forbids tokens that would repeat an n-gram already present in the sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoRepeatNgram {
	n: usize,
}

impl NoRepeatNgram {
	/// `n` must be at least 2; smaller sizes would forbid every seen token.
	pub fn new(n: usize) -> Option<Self> {
		(n >= 2).then_some(Self { n })
	}
}

impl BanPolicy for NoRepeatNgram {
	fn forbidden_next(&self, sequence: &[String]) -> HashSet<String> {
		let prefix_len = self.n - 1;
		if sequence.len() < prefix_len {
			return HashSet::new();
		}

		let prefix = &sequence[sequence.len() - prefix_len..];
		sequence
			.windows(self.n)
			.filter(|window| &window[..prefix_len] == prefix)
			.map(|window| window[prefix_len].clone())
			.collect()
	}
}

/// Sampling engine: repetition penalty, temperature, top-k, top-p, draw.
#[derive(Clone, Default)]
pub struct Sampler {
	ban: Option<Arc<dyn BanPolicy>>,
}

impl Sampler {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_ban(ban: Arc<dyn BanPolicy>) -> Self {
		Self { ban: Some(ban) }
	}

	/// Draws the next token after `sequence`.
	///
	/// Tokens forbidden by the ban policy are removed first, unless that
	/// would leave nothing to draw from.
	pub fn sample<R: Rng + ?Sized>(
		&self,
		distribution: &Distribution,
		sequence: &[String],
		params: &SamplingParams,
		recent: &RecentCounts,
		rng: &mut R,
	) -> Option<String> {
		if let Some(ban) = &self.ban {
			let forbidden = ban.forbidden_next(sequence);
			if !forbidden.is_empty() {
				let mut allowed = distribution.clone();
				allowed.retain(|token, _| !forbidden.contains(token));
				if !allowed.is_empty() {
					return sample_token(&allowed, params, recent, rng);
				}
			}
		}
		sample_token(distribution, params, recent, rng)
	}
}

/// Applies the repetition penalty and temperature, then sorts descending
/// (ties by token text) and keeps the top `top_k` entries.
pub fn reshape_weights(distribution: &Distribution, params: &SamplingParams, recent: &RecentCounts) -> Vec<(String, f64)> {
	let inv_temperature = 1.0 / params.temperature;

	let mut weights: Vec<(String, f64)> = distribution
		.iter()
		.map(|(token, weight)| {
			let mut weight = weight;
			let seen = recent.get(token);
			if params.rep_penalty > 0.0 && seen > 0 {
				weight /= 1.0 + params.rep_penalty * seen as f64;
			}
			(token.to_owned(), weight.max(MIN_WEIGHT).powf(inv_temperature))
		})
		.collect();

	weights.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
	weights.truncate(params.top_k.max(1));
	weights
}

/// Draws one token from `distribution`.
///
/// Returns `None` only for an empty distribution. Nucleus truncation keeps
/// the shortest prefix of the reshaped, sorted weights whose sum reaches
/// `top_p` of the top-k total (at least one entry). If the reshaped total
/// degenerates (zero, infinite or NaN) the highest original weight wins.
pub fn sample_token<R: Rng + ?Sized>(
	distribution: &Distribution,
	params: &SamplingParams,
	recent: &RecentCounts,
	rng: &mut R,
) -> Option<String> {
	if distribution.is_empty() {
		return None;
	}

	let mut weights = reshape_weights(distribution, params, recent);

	let total: f64 = weights.iter().map(|(_, w)| w).sum();
	if !total.is_finite() || total <= 0.0 {
		return distribution.argmax().map(str::to_owned);
	}

	let threshold = params.top_p * total;
	let mut cumulative = 0.0;
	let mut keep = 0;
	for (_, weight) in &weights {
		cumulative += weight;
		keep += 1;
		if cumulative >= threshold {
			break;
		}
	}
	weights.truncate(keep.max(1));

	let kept_total: f64 = weights.iter().map(|(_, w)| w).sum();
	let r: f64 = rng.random();
	let mut acc = 0.0;
	for (token, weight) in &weights {
		acc += weight / kept_total;
		if r < acc {
			return Some(token.clone());
		}
	}

	// Rounding kept `acc` just below `r`
	weights.pop().map(|(token, _)| token)
}
