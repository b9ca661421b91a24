use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::distribution::Distribution;

/// Next-token counts observed after one context.
///
/// A `State` is a node of the Markov chain: its outgoing edges are the
/// tokens seen right after the context, weighted by how often they were
/// observed during training. The unigram table is a `State` with an
/// empty context.
///
/// ## Invariants
/// - Counts are non-negative
/// - The state is immutable once the model finished loading
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct State {
	/// Outgoing transitions indexed by the next token.
	/// Example: { "привет" => 42, "!" => 3 }
	transitions: HashMap<String, u64>,
}

impl State {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records `count` more occurrences of a transition toward `token`.
	pub fn add_transition(&mut self, token: &str, count: u64) {
		*self.transitions.entry(token.to_owned()).or_insert(0) += count;
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	/// Number of observations of `token` after this context.
	pub fn count(&self, token: &str) -> u64 {
		self.transitions.get(token).copied().unwrap_or(0)
	}

	/// Sum of all transition counts.
	pub fn total(&self) -> u64 {
		self.transitions.values().sum()
	}

	pub fn transitions(&self) -> impl Iterator<Item = (&str, u64)> {
		self.transitions.iter().map(|(token, count)| (token.as_str(), *count))
	}

	/// Drops every transition toward one of `tokens`.
	pub fn remove_tokens(&mut self, tokens: &[String]) {
		for token in tokens {
			self.transitions.remove(token);
		}
	}

	/// Adds `weight * count / total` for every transition into `mixture`.
	///
	/// Returns `false` (and leaves `mixture` untouched) when the state holds
	/// no positive count, so that callers do not count it as a context hit.
	pub fn accumulate_normalized(&self, mixture: &mut Distribution, weight: f64) -> bool {
		let total = self.total();
		if total == 0 {
			return false;
		}

		let total = total as f64;
		for (token, count) in self.transitions() {
			mixture.add(token, weight * count as f64 / total);
		}
		true
	}

	/// Raw counts as a distribution (used by the unigram fallback).
	pub fn to_distribution(&self) -> Distribution {
		self.transitions().map(|(token, count)| (token.to_owned(), count as f64)).collect()
	}
}

impl From<HashMap<String, u64>> for State {
	fn from(transitions: HashMap<String, u64>) -> Self {
		Self { transitions }
	}
}
