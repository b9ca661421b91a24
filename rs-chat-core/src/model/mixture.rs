use super::distribution::Distribution;
use super::multigram_model::MultiGramModel;
use super::state::State;
use crate::text::{Language, ScriptRanges};

/// Weight of an order-`n` context in the mixture: `n^gamma`.
///
/// With `gamma > 1` a longer context always outweighs a shorter one per
/// unit of probability.
pub fn order_weight(order: usize, gamma: f64) -> f64 {
	(order as f64).powf(gamma)
}

/// Combines the predictions of every context order matching the end of
/// `sequence`.
///
/// Orders are scanned from `min(N - 1, len(sequence))` down to 1. Each
/// matching state is normalized to probabilities and added with weight
/// [`order_weight`]. Returns the mixture and the number of matching orders
/// (`hits`). With zero hits the mixture is empty and the caller falls back
/// to [`unigram_fallback`].
pub fn build_mixture<S: AsRef<str>>(model: &MultiGramModel, sequence: &[S], gamma: f64) -> (Distribution, usize) {
	let mut mixture = Distribution::new();
	let mut hits = 0;

	let longest = model.max_order().min(sequence.len());
	for order in (1..=longest).rev() {
		if let Some(state) = model.context(order, sequence) {
			if state.accumulate_normalized(&mut mixture, order_weight(order, gamma)) {
				hits += 1;
			}
		}
	}

	(mixture, hits)
}

/// Blends the normalized unigram distribution into `mixture` with weight
/// `lambda`, so every known token keeps a little mass.
pub fn smooth(mixture: &mut Distribution, unigram: &State, lambda: f64) {
	if lambda <= 0.0 {
		return;
	}
	unigram.accumulate_normalized(mixture, lambda);
}

/// Raw unigram counts restricted to `lang`, or to neutral tokens when no
/// token of that language exists.
pub fn unigram_fallback(model: &MultiGramModel, lang: Language, scripts: &ScriptRanges) -> Distribution {
	model.unigram().to_distribution().of_language_or_neutral(lang, scripts)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn model(json: &str) -> MultiGramModel {
		MultiGramModel::from_json_str(json, &[]).unwrap()
	}

	fn seq(tokens: &[&str]) -> Vec<String> {
		tokens.iter().map(|t| t.to_string()).collect()
	}

	#[test]
	fn test_longer_orders_weigh_more() {
		for order in 2..10 {
			assert!(order_weight(order, 1.25) > order_weight(order - 1, 1.25));
		}
		assert_eq!(order_weight(1, 1.25), 1.0);
	}

	#[test]
	fn test_mixture_combines_orders() {
		let m = model(
			r#"{"N": 3,
				"unigram": {"a": 1, "b": 1, "c": 1},
				"grams": {
					"1": {"b": {"c": 1, "a": 1}},
					"2": {"a\tb": {"c": 2}}
				}}"#,
		);

		let (mixture, hits) = build_mixture(&m, &seq(&["a", "b"]), 1.25);
		assert_eq!(hits, 2);
		let w2 = order_weight(2, 1.25);
		assert!((mixture.get("c").unwrap() - (w2 + 0.5)).abs() < 1e-12);
		assert!((mixture.get("a").unwrap() - 0.5).abs() < 1e-12);
		assert!(!mixture.contains("b"));
	}

	#[test]
	fn test_orders_beyond_n_are_ignored() {
		let m = model(
			r#"{"N": 2,
				"unigram": {"c": 1},
				"grams": {"2": {"a\tb": {"c": 2}}}}"#,
		);
		let (mixture, hits) = build_mixture(&m, &seq(&["a", "b"]), 1.25);
		assert_eq!(hits, 0);
		assert!(mixture.is_empty());
	}

	#[test]
	fn test_short_sequence() {
		let m = model(r#"{"N": 5, "unigram": {"a": 1}, "grams": {"1": {"a": {"a": 1}}}}"#);
		let (_, hits) = build_mixture(&m, &seq(&[]), 1.25);
		assert_eq!(hits, 0);
		let (_, hits) = build_mixture(&m, &seq(&["a"]), 1.25);
		assert_eq!(hits, 1);
	}

	#[test]
	fn test_smoothing_adds_every_unigram() {
		let m = model(r#"{"N": 2, "unigram": {"a": 3, "z": 1}, "grams": {"1": {"a": {"a": 1}}}}"#);
		let (mut mixture, _) = build_mixture(&m, &seq(&["a"]), 1.25);
		smooth(&mut mixture, m.unigram(), 0.04);
		assert!((mixture.get("a").unwrap() - 1.03).abs() < 1e-12);
		assert!((mixture.get("z").unwrap() - 0.01).abs() < 1e-12);
	}

	#[test]
	fn test_unigram_fallback_filters_language() {
		let m = model(r#"{"N": 2, "unigram": {"hello": 3, "привет": 1, ".": 2}, "grams": {}}"#);
		let scripts = ScriptRanges::default();

		let en = unigram_fallback(&m, Language::En, &scripts);
		assert_eq!(en.get("hello"), Some(3.0));
		assert!(!en.contains("привет"));

		let m = model(r#"{"N": 2, "unigram": {"hello": 3, ".": 2}, "grams": {}}"#);
		let ru = unigram_fallback(&m, Language::Ru, &scripts);
		assert_eq!(ru.len(), 1);
		assert_eq!(ru.get("."), Some(2.0));
	}
}
