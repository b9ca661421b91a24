use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ChatResult;
use crate::text::{Language, ScriptRanges};

/// Which weights file answers a request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ModelSelection {
	/// Use the file named in each request.
	Requested,
	/// Always use this file; the request's `model` is ignored.
	Fixed(String),
}

/// How the target language of a conversation is chosen.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LanguagePolicy {
	/// Detect from every user message; sticky once detected.
	Detect,
	/// Always answer in this language.
	Fixed(Language),
}

/// Replies used when generation produced nothing printable.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FallbackReplies {
	pub en: String,
	pub ru: String,
}

impl Default for FallbackReplies {
	fn default() -> Self {
		Self { en: "ok.".to_owned(), ru: "окей.".to_owned() }
	}
}

impl FallbackReplies {
	pub fn for_language(&self, lang: Language) -> &str {
		match lang {
			Language::En => &self.en,
			Language::Ru | Language::Unknown => &self.ru,
		}
	}
}

/// Engine configuration.
///
/// Every field has a default matching the training conventions of the
/// bundled weights, so an empty TOML file is a valid configuration:
///
/// ```toml
/// models_dir = "./data"
/// model = { fixed = "weights_dialog_ru_en.json" }
/// language = "detect"
/// reserved_tokens = ["OK", "FILL", "DATA"]
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
	/// Directory holding `*.json` weights files.
	pub models_dir: PathBuf,
	pub model: ModelSelection,
	pub language: LanguagePolicy,
	/// Target language of a session before anything was detected.
	pub default_language: Language,
	pub scripts: ScriptRanges,
	/// Training placeholders removed from every distribution at load.
	pub reserved_tokens: Vec<String>,
	/// Role tag opening a user turn in the training data.
	pub user_tag: String,
	/// Text a new conversation starts with.
	pub opening_context: String,
	/// History budget, in tokens.
	pub max_history_tokens: usize,
	/// Weight of the unigram prior blended into context mixtures.
	pub unigram_lambda: f64,
	/// Exponent of the order weight `n^gamma`.
	pub order_gamma: f64,
	/// Tokens to emit before a line break may end the reply.
	pub min_stop_len: usize,
	/// Forbid repeating n-grams of this size (`0` disables).
	pub no_repeat_ngram: usize,
	/// Cache normalized models as `<name>.bin` next to the weights.
	pub binary_cache: bool,
	pub fallback_replies: FallbackReplies,
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		Self {
			models_dir: PathBuf::from("./data"),
			model: ModelSelection::Requested,
			language: LanguagePolicy::Detect,
			default_language: Language::Ru,
			scripts: ScriptRanges::default(),
			reserved_tokens: vec!["OK".to_owned(), "FILL".to_owned(), "DATA".to_owned()],
			user_tag: "User".to_owned(),
			opening_context: "System : you are a helpful assistant . Answer briefly . \n".to_owned(),
			max_history_tokens: 2400,
			unigram_lambda: 0.03,
			order_gamma: 1.25,
			min_stop_len: 8,
			no_repeat_ngram: 0,
			binary_cache: true,
			fallback_replies: FallbackReplies::default(),
		}
	}
}

impl GeneratorConfig {
	/// Reads a configuration from a TOML file.
	pub fn from_file<P: AsRef<Path>>(path: P) -> ChatResult<Self> {
		let text = std::fs::read_to_string(path)?;
		Self::from_toml(&text)
	}

	pub fn from_toml(text: &str) -> ChatResult<Self> {
		Ok(toml::from_str(text)?)
	}

	pub fn with_models_dir<P: Into<PathBuf>>(mut self, models_dir: P) -> Self {
		self.models_dir = models_dir.into();
		self
	}
}
