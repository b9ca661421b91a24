use std::ops::RangeInclusive;

use super::request::ChatRequest;
use super::sampler::SamplingParams;

pub const MAX_TOKENS_RANGE: RangeInclusive<usize> = 1..=200_000;
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.05..=2.0;
pub const TOP_K_RANGE: RangeInclusive<usize> = 1..=400;
pub const TOP_P_RANGE: RangeInclusive<f64> = 0.01..=1.0;
pub const REP_PENALTY_RANGE: RangeInclusive<f64> = 0.0..=2.0;
pub const REP_WINDOW_RANGE: RangeInclusive<usize> = 0..=4000;

/// Generation parameters of one inference call.
///
/// Every setter clamps its value into the accepted range instead of
/// failing, so any request produces a usable input.
///
/// # Invariants
/// - Every field lies within its `*_RANGE` constant
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionInput {
	/// Per-call token budget.
	max_tokens: usize,
	temperature: f64,
	top_k: usize,
	top_p: f64,
	rep_penalty: f64,
	/// Trailing tokens inspected by the repetition penalty.
	rep_window: usize,
}

impl Default for PredictionInput {
	fn default() -> Self {
		Self {
			max_tokens: 1400,
			temperature: 0.30,
			top_k: 160,
			top_p: 0.85,
			rep_penalty: 1.0,
			rep_window: 180,
		}
	}
}

impl PredictionInput {
	/// Builds an input from a request, using defaults for missing fields.
	pub fn from_request(request: &ChatRequest) -> Self {
		let mut input = Self::default();
		if let Some(max_tokens) = request.max_tokens {
			input.set_max_tokens(max_tokens);
		}
		if let Some(temperature) = request.temperature {
			input.set_temperature(temperature);
		}
		if let Some(top_k) = request.top_k {
			input.set_top_k(top_k);
		}
		if let Some(top_p) = request.top_p {
			input.set_top_p(top_p);
		}
		if let Some(rep_penalty) = request.rep_penalty {
			input.set_rep_penalty(rep_penalty);
		}
		if let Some(rep_window) = request.rep_window {
			input.set_rep_window(rep_window);
		}
		input
	}

	pub fn max_tokens(&self) -> usize {
		self.max_tokens
	}

	pub fn rep_window(&self) -> usize {
		self.rep_window
	}

	pub fn sampling_params(&self) -> SamplingParams {
		SamplingParams {
			temperature: self.temperature,
			top_k: self.top_k,
			top_p: self.top_p,
			rep_penalty: self.rep_penalty,
		}
	}

	pub fn set_max_tokens(&mut self, max_tokens: i64) {
		self.max_tokens = clamp_count(max_tokens, MAX_TOKENS_RANGE);
	}

	pub fn set_temperature(&mut self, temperature: f64) {
		self.temperature = clamp_float(temperature, TEMPERATURE_RANGE);
	}

	pub fn set_top_k(&mut self, top_k: i64) {
		self.top_k = clamp_count(top_k, TOP_K_RANGE);
	}

	pub fn set_top_p(&mut self, top_p: f64) {
		self.top_p = clamp_float(top_p, TOP_P_RANGE);
	}

	pub fn set_rep_penalty(&mut self, rep_penalty: f64) {
		self.rep_penalty = clamp_float(rep_penalty, REP_PENALTY_RANGE);
	}

	pub fn set_rep_window(&mut self, rep_window: i64) {
		self.rep_window = clamp_count(rep_window, REP_WINDOW_RANGE);
	}
}

fn clamp_count(value: i64, range: RangeInclusive<usize>) -> usize {
	let value = usize::try_from(value.max(0)).unwrap_or(usize::MAX);
	value.clamp(*range.start(), *range.end())
}

fn clamp_float(value: f64, range: RangeInclusive<f64>) -> f64 {
	// NaN would survive `clamp`
	if value.is_nan() {
		return *range.start();
	}
	value.clamp(*range.start(), *range.end())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let input = PredictionInput::from_request(&ChatRequest::default());
		assert_eq!(input, PredictionInput::default());
		assert_eq!(input.max_tokens(), 1400);
		assert_eq!(input.rep_window(), 180);
		assert_eq!(
			input.sampling_params(),
			SamplingParams { temperature: 0.30, top_k: 160, top_p: 0.85, rep_penalty: 1.0 }
		);
	}

	#[test]
	fn test_values_are_clamped() {
		let request = ChatRequest {
			max_tokens: Some(0),
			temperature: Some(9.0),
			top_k: Some(-3),
			top_p: Some(0.0),
			rep_penalty: Some(-1.0),
			rep_window: Some(1_000_000),
			..ChatRequest::default()
		};
		let input = PredictionInput::from_request(&request);
		assert_eq!(input.max_tokens(), 1);
		assert_eq!(input.rep_window(), 4000);
		let params = input.sampling_params();
		assert_eq!(params.temperature, 2.0);
		assert_eq!(params.top_k, 1);
		assert_eq!(params.top_p, 0.01);
		assert_eq!(params.rep_penalty, 0.0);
	}

	#[test]
	fn test_in_range_values_are_kept() {
		let mut input = PredictionInput::default();
		input.set_max_tokens(50);
		input.set_temperature(1.1);
		input.set_top_p(1.0);
		assert_eq!(input.max_tokens(), 50);
		assert_eq!(input.sampling_params().temperature, 1.1);
		assert_eq!(input.sampling_params().top_p, 1.0);
	}

	#[test]
	fn test_nan_is_clamped() {
		let mut input = PredictionInput::default();
		input.set_temperature(f64::NAN);
		assert_eq!(input.sampling_params().temperature, 0.05);
	}
}
