use serde::{Deserialize, Serialize};

use crate::text::Language;

/// Conversation so far, as tokens, bounded in length.
///
/// When the budget is exceeded the oldest tokens are dropped.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct History {
	tokens: Vec<String>,
	max_len: usize,
}

impl History {
	pub fn new(max_len: usize) -> Self {
		Self { tokens: Vec::new(), max_len }
	}

	pub fn tokens(&self) -> &[String] {
		&self.tokens
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	/// Appends `tokens`, then truncates from the head if over budget.
	pub fn extend<I: IntoIterator<Item = String>>(&mut self, tokens: I) {
		self.tokens.extend(tokens);
		if self.tokens.len() > self.max_len {
			let excess = self.tokens.len() - self.max_len;
			self.tokens.drain(..excess);
		}
	}

	pub fn clear(&mut self) {
		self.tokens.clear();
	}
}

/// Per-conversation state: history and target language.
///
/// Owned by whatever stores sessions; the generator only borrows it for
/// the duration of one call and never keeps global state of its own.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Session {
	history: History,
	language: Language,
}

impl Session {
	pub fn new(max_history_tokens: usize, language: Language) -> Self {
		Self { history: History::new(max_history_tokens), language }
	}

	pub fn history(&self) -> &History {
		&self.history
	}

	pub fn history_mut(&mut self) -> &mut History {
		&mut self.history
	}

	pub fn language(&self) -> Language {
		self.language
	}

	/// Remembers a detected language; `Unknown` keeps the previous one.
	pub fn observe_language(&mut self, detected: Language) {
		if detected != Language::Unknown {
			self.language = detected;
		}
	}

	/// Forgets the conversation. The remembered language is kept.
	pub fn reset(&mut self) {
		self.history.clear();
	}
}
