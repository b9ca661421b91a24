use std::io;
use std::path::PathBuf;

/// Unified error type for model loading, configuration and request handling.
///
/// Generation itself never fails: an exhausted distribution simply stops
/// the loop. Everything here happens before the first token is sampled.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
	#[error("IO error: {0}")]
	Io(#[from] io::Error),

	#[error("cannot parse weights file: {0}")]
	Json(#[from] serde_json::Error),

	#[error("binary cache error: {0}")]
	Cache(#[from] postcard::Error),

	#[error("cannot parse configuration: {0}")]
	Config(#[from] toml::de::Error),

	#[error("weights file is missing required field `{0}`")]
	MissingField(&'static str),

	#[error("invalid model name (must be *.json): {0}")]
	InvalidModelName(String),

	#[error("weights file not found: {0}")]
	ModelNotFound(String),

	#[error("expected a directory, got: {}", .0.display())]
	NotADirectory(PathBuf),

	#[error("{0} is required")]
	MissingParameter(&'static str),
}

impl ChatError {
	/// Whether the error was caused by the caller's request rather than
	/// by the server's data or environment.
	pub fn is_request_error(&self) -> bool {
		matches!(self, Self::InvalidModelName(_) | Self::MissingParameter(_))
	}
}

pub type ChatResult<T> = Result<T, ChatError>;
