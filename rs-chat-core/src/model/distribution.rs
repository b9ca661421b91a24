use std::collections::HashMap;

use crate::text::{Language, ScriptRanges, is_token_of_language};

/// Candidate next tokens with non-negative weights.
///
/// Weights are either raw counts (unigram fallback) or mixture weights;
/// they do not need to sum to one. An empty distribution means "no
/// signal", never "nothing is allowed".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Distribution {
	weights: HashMap<String, f64>,
}

impl Distribution {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.weights.is_empty()
	}

	pub fn len(&self) -> usize {
		self.weights.len()
	}

	pub fn get(&self, token: &str) -> Option<f64> {
		self.weights.get(token).copied()
	}

	pub fn contains(&self, token: &str) -> bool {
		self.weights.contains_key(token)
	}

	/// Adds `weight` to the current weight of `token`.
	pub fn add(&mut self, token: &str, weight: f64) {
		match self.weights.get_mut(token) {
			Some(current) => *current += weight,
			None => {
				self.weights.insert(token.to_owned(), weight);
			}
		}
	}

	/// Overwrites the weight of `token`.
	pub fn set(&mut self, token: &str, weight: f64) {
		self.weights.insert(token.to_owned(), weight);
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
		self.weights.iter().map(|(token, weight)| (token.as_str(), *weight))
	}

	pub fn total(&self) -> f64 {
		self.weights.values().sum()
	}

	/// Whether at least one token carries a positive weight.
	pub fn has_mass(&self) -> bool {
		self.weights.values().any(|weight| *weight > 0.0)
	}

	pub fn retain<F: FnMut(&str, f64) -> bool>(&mut self, mut keep: F) {
		self.weights.retain(|token, weight| keep(token, *weight));
	}

	/// Highest-weight token, ties broken by token text.
	pub fn argmax(&self) -> Option<&str> {
		self.weights
			.iter()
			.max_by(|a, b| a.1.total_cmp(b.1).then_with(|| b.0.cmp(a.0)))
			.map(|(token, _)| token.as_str())
	}

	/// Tokens consistent with `lang` (see [`is_token_of_language`]).
	pub fn of_language(&self, lang: Language, scripts: &ScriptRanges) -> Self {
		self.filtered(|token| is_token_of_language(token, lang, scripts))
	}

	/// Tokens without letters of either script.
	pub fn neutral_only(&self, scripts: &ScriptRanges) -> Self {
		self.filtered(|token| scripts.letters(token).is_neutral())
	}

	/// Language filter with the neutral-only fallback: never returns an
	/// empty distribution when `self` holds a neutral token.
	pub fn of_language_or_neutral(&self, lang: Language, scripts: &ScriptRanges) -> Self {
		let filtered = self.of_language(lang, scripts);
		if filtered.is_empty() {
			self.neutral_only(scripts)
		} else {
			filtered
		}
	}

	fn filtered<F: Fn(&str) -> bool>(&self, keep: F) -> Self {
		self.weights
			.iter()
			.filter(|(token, _)| keep(token))
			.map(|(token, weight)| (token.clone(), *weight))
			.collect()
	}
}

impl FromIterator<(String, f64)> for Distribution {
	fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
		Self { weights: iter.into_iter().collect() }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn dist(entries: &[(&str, f64)]) -> Distribution {
		entries.iter().map(|(t, w)| (t.to_string(), *w)).collect()
	}

	#[test]
	fn test_add_and_total() {
		let mut d = Distribution::new();
		d.add("a", 1.0);
		d.add("a", 0.5);
		d.add("b", 2.0);
		assert_eq!(d.get("a"), Some(1.5));
		assert_eq!(d.total(), 3.5);
	}

	#[test]
	fn test_argmax_ties() {
		let d = dist(&[("b", 2.0), ("a", 2.0), ("c", 1.0)]);
		assert_eq!(d.argmax(), Some("a"));
		assert_eq!(Distribution::new().argmax(), None);
	}

	#[test]
	fn test_language_filters() {
		let scripts = ScriptRanges::default();
		let d = dist(&[("привет", 1.0), ("hello", 1.0), ("!", 1.0), ("OKей", 1.0)]);

		let ru = d.of_language(Language::Ru, &scripts);
		assert!(ru.contains("привет") && ru.contains("!"));
		assert_eq!(ru.len(), 2);

		let neutral = d.neutral_only(&scripts);
		assert_eq!(neutral.len(), 1);
		assert!(neutral.contains("!"));
	}

	#[test]
	fn test_neutral_fallback() {
		let scripts = ScriptRanges::default();
		let d = dist(&[("hello", 1.0), ("OKей", 1.0)]);
		// nothing Cyrillic and no neutral token either
		assert!(d.of_language_or_neutral(Language::Ru, &scripts).is_empty());

		let d = dist(&[("hello", 1.0), ("?", 1.0)]);
		let f = d.of_language_or_neutral(Language::Ru, &scripts);
		assert_eq!(f.len(), 1);
		assert!(f.contains("?"));
	}

	#[test]
	fn test_has_mass() {
		assert!(!dist(&[("a", 0.0)]).has_mass());
		assert!(dist(&[("a", 0.0), ("b", 0.1)]).has_mass());
	}
}
