use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::state::State;

/// Separator between tokens of a context key. Never part of a token since
/// the tokenizer drops all whitespace except line breaks.
pub const CONTEXT_SEPARATOR: &str = "\t";

/// Builds the lookup key for a context made of `tokens`.
pub fn context_key<S: AsRef<str>>(tokens: &[S]) -> String {
	let mut key = String::new();
	for (i, token) in tokens.iter().enumerate() {
		if i > 0 {
			key.push_str(CONTEXT_SEPARATOR);
		}
		key.push_str(token.as_ref());
	}
	key
}

/// All contexts of one order.
///
/// Maps the key of `order` consecutive tokens to the counts of the
/// token that followed them.
///
/// # Invariants
/// - `order` is always >= 1
/// - Every key is made of exactly `order` tokens joined by [`CONTEXT_SEPARATOR`]
/// - No state is empty once the model is loaded
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NGramModel {
	/// Number of context tokens
	order: usize,

	/// Mapping from a context key to its corresponding state
	states: HashMap<String, State>,
}

impl NGramModel {
	pub fn new(order: usize) -> Self {
		Self { order, states: HashMap::new() }
	}

	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	pub fn insert(&mut self, key: String, state: State) {
		self.states.insert(key, state);
	}

	/// Returns the state for the last `order` tokens of `sequence`.
	///
	/// Returns `None` if the sequence is too short or the context was never
	/// observed.
	pub fn context<S: AsRef<str>>(&self, sequence: &[S]) -> Option<&State> {
		if sequence.len() < self.order {
			return None;
		}
		let key = context_key(&sequence[sequence.len() - self.order..]);
		self.states.get(&key)
	}

	/// Strips `tokens` from every state, then drops states left empty.
	pub fn remove_tokens(&mut self, tokens: &[String]) {
		self.states.retain(|_, state| {
			state.remove_tokens(tokens);
			!state.is_empty()
		});
	}
}
