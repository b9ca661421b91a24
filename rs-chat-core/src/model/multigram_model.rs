use std::collections::HashMap;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::ngram_model::NGramModel;
use super::state::State;
use super::weights::WeightsFile;
use crate::error::{ChatError, ChatResult};
use crate::io::{build_output_path, is_up_to_date};

/// `N` used when a weights file does not declare one.
pub const DEFAULT_N: usize = 10;

/// Bounds applied to the declared `N`.
pub const MIN_N: usize = 2;
pub const MAX_N: usize = 100;

/// The complete word-level model: unigram counts plus one context table
/// per order.
///
/// This struct manages:
/// - `n`: one more than the longest context order used for prediction
/// - `unigram`: global token frequencies (smoothing prior and last-resort fallback)
/// - `ngrams`: a map from context order to its `NGramModel`
/// - `reserved`: training placeholders stripped at load time
///
/// The model is normalized once while loading and read-only afterwards,
/// so a single instance can be shared between concurrent requests.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MultiGramModel {
	n: usize,
	unigram: State,
	ngrams: HashMap<usize, NGramModel>,
	reserved: Vec<String>,
}

/// Summary of a loaded model, for inspection tools.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ModelInfo {
	#[serde(rename = "N")]
	pub n: usize,
	pub unigram: usize,
	pub levels: Vec<LevelInfo>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct LevelInfo {
	pub order: usize,
	pub contexts: usize,
}

impl MultiGramModel {
	/// Loads a model from a JSON weights file.
	///
	/// - If `use_cache` is set and `<stem>.bin` next to the file is at least as
	///   recent as the JSON, the normalized model is read from it with `postcard`.
	/// - Otherwise the JSON is parsed, normalized and, with `use_cache`, the
	///   result is written to `<stem>.bin` for the next load.
	///
	/// A stale or unreadable cache is never fatal; it is rebuilt from the JSON.
	///
	/// # Errors
	/// Returns an error if the weights file cannot be read or parsed, or lacks
	/// the `unigram` / `grams` tables.
	pub fn new<P: AsRef<Path>>(filepath: P, reserved: &[String], use_cache: bool) -> ChatResult<Self> {
		let filepath = filepath.as_ref();
		let binary_data_path = build_output_path(filepath, "bin")?;

		if use_cache && is_up_to_date(&binary_data_path, filepath) {
			match Self::read_binary(&binary_data_path) {
				Ok(model) if model.reserved == reserved => {
					debug!("loaded {} from cache", binary_data_path.display());
					return Ok(model);
				}
				Ok(_) => debug!("reserved tokens changed, rebuilding {}", binary_data_path.display()),
				Err(e) => warn!("ignoring unreadable cache {}: {e}", binary_data_path.display()),
			}
		}

		let bytes = std::fs::read(filepath)?;
		let model = Self::from_json_slice(&bytes, reserved)?;
		info!(
			"loaded {} (N={}, unigram={}, levels={})",
			filepath.display(),
			model.n,
			model.unigram.len(),
			model.ngrams.len()
		);

		if use_cache {
			match postcard::to_stdvec(&model) {
				Ok(bytes) => match std::fs::write(&binary_data_path, bytes) {
					Ok(()) => info!("wrote cache {}", binary_data_path.display()),
					Err(e) => warn!("cannot write cache {}: {e}", binary_data_path.display()),
				},
				Err(e) => warn!("cannot encode cache {}: {e}", binary_data_path.display()),
			}
		}

		Ok(model)
	}

	fn read_binary(path: &Path) -> ChatResult<Self> {
		let bytes = std::fs::read(path)?;
		Ok(postcard::from_bytes(&bytes)?)
	}

	/// Parses and normalizes a model from JSON text.
	pub fn from_json_str(json: &str, reserved: &[String]) -> ChatResult<Self> {
		Self::from_json_slice(json.as_bytes(), reserved)
	}

	/// Parses and normalizes a model from JSON bytes.
	pub fn from_json_slice(json: &[u8], reserved: &[String]) -> ChatResult<Self> {
		let file: WeightsFile = serde_json::from_slice(json)?;
		Self::from_weights(file, reserved)
	}

	fn from_weights(file: WeightsFile, reserved: &[String]) -> ChatResult<Self> {
		let unigram = file.unigram.ok_or(ChatError::MissingField("unigram"))?;
		let grams = file.grams.ok_or(ChatError::MissingField("grams"))?;

		let n = file
			.n
			.map(|n| n.clamp(MIN_N as i64, MAX_N as i64) as usize)
			.unwrap_or(DEFAULT_N);

		let mut ngrams = HashMap::with_capacity(grams.0.len());
		for (level, table) in grams.0 {
			let order = match level.parse::<usize>() {
				Ok(order) if order >= 1 => order,
				_ => {
					warn!("ignoring gram level {level:?}");
					continue;
				}
			};

			let mut ngram = NGramModel::new(order);
			for (key, counts) in table.0 {
				ngram.insert(key, State::from(counts.0));
			}
			ngrams.insert(order, ngram);
		}

		let mut model = Self {
			n,
			unigram: State::from(unigram.0),
			ngrams,
			reserved: reserved.to_vec(),
		};
		model.strip_reserved();
		Ok(model)
	}

	/// Removes reserved tokens everywhere, then contexts and levels left empty.
	fn strip_reserved(&mut self) {
		self.unigram.remove_tokens(&self.reserved);
		for ngram in self.ngrams.values_mut() {
			ngram.remove_tokens(&self.reserved);
		}
		self.ngrams.retain(|_, ngram| !ngram.is_empty());
	}

	/// One more than the longest context order used for prediction.
	pub fn n(&self) -> usize {
		self.n
	}

	/// Longest context order used for prediction (`N - 1`).
	pub fn max_order(&self) -> usize {
		self.n - 1
	}

	pub fn unigram(&self) -> &State {
		&self.unigram
	}

	/// Context table of the given order, if any survived loading.
	pub fn ngram(&self, order: usize) -> Option<&NGramModel> {
		self.ngrams.get(&order)
	}

	/// State for the last `order` tokens of `sequence`.
	pub fn context<S: AsRef<str>>(&self, order: usize, sequence: &[S]) -> Option<&State> {
		self.ngrams.get(&order)?.context(sequence)
	}

	/// Available orders, ascending.
	pub fn orders(&self) -> Vec<usize> {
		let mut orders: Vec<usize> = self.ngrams.keys().copied().collect();
		orders.sort_unstable();
		orders
	}

	pub fn info(&self) -> ModelInfo {
		ModelInfo {
			n: self.n,
			unigram: self.unigram.len(),
			levels: self
				.orders()
				.into_iter()
				.map(|order| LevelInfo { order, contexts: self.ngrams[&order].len() })
				.collect(),
		}
	}
}
