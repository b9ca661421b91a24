use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use log::{debug, info};
use rand::Rng;

use crate::config::{GeneratorConfig, LanguagePolicy, ModelSelection};
use crate::error::{ChatError, ChatResult};
use crate::io::{self, FileEntry};
use crate::model::generation::TokenGenerator;
use crate::model::multigram_model::{ModelInfo, MultiGramModel};
use crate::model::prediction_input::PredictionInput;
use crate::model::request::{ChatRequest, ChatResponse};
use crate::model::sampler::{NoRepeatNgram, Sampler};
use crate::model::session::Session;
use crate::text::{Language, Tokenizer, detect_language, detokenize};

struct CachedModel {
	modified: SystemTime,
	model: Arc<MultiGramModel>,
}

/// High-level chat engine over a directory of weights files.
///
/// # Responsibilities
/// - Resolve and validate requested weights file names
/// - Load models on demand and keep them until their file changes
/// - Turn a user message into a reply, updating the caller's `Session`
///
/// The generator holds no conversation state: sessions are owned by the
/// caller, so one instance can serve many conversations concurrently.
pub struct Generator {
	config: GeneratorConfig,
	models_dir: PathBuf,
	tokenizer: Tokenizer,
	sampler: Sampler,
	models: RwLock<HashMap<String, CachedModel>>,
}

impl Generator {
	/// Creates a generator serving the weights files of `config.models_dir`.
	///
	/// # Errors
	/// Returns [`ChatError::NotADirectory`] if the models directory does not
	/// exist or is not a directory.
	///
	/// # Notes
	/// - No model is read here; files are loaded by the first request naming them.
	/// - `"."` and `"./"` resolve to the current working directory.
	pub fn new(config: GeneratorConfig) -> ChatResult<Self> {
		let models_dir = io::normalize_folder(&config.models_dir);
		if !models_dir.is_dir() {
			return Err(ChatError::NotADirectory(models_dir));
		}

		let sampler = match NoRepeatNgram::new(config.no_repeat_ngram) {
			Some(ban) => Sampler::with_ban(Arc::new(ban)),
			None => Sampler::new(),
		};
		let tokenizer = Tokenizer::new(config.scripts.clone());

		info!("serving weights from {}", models_dir.display());
		Ok(Self { config, models_dir, tokenizer, sampler, models: RwLock::new(HashMap::new()) })
	}

	/// A fresh conversation with the configured history budget and default language.
	pub fn new_session(&self) -> Session {
		Session::new(self.config.max_history_tokens, self.config.default_language)
	}

	/// Weights files available in the models directory, newest first.
	pub fn list_models(&self) -> ChatResult<Vec<FileEntry>> {
		Ok(io::list_files(&self.models_dir, "json")?)
	}

	/// Name of the weights file answering a request for `requested`.
	///
	/// With a fixed model selection the configured file is used and
	/// `requested` is ignored.
	///
	/// # Errors
	/// - [`ChatError::MissingParameter`] if no name was requested
	/// - [`ChatError::InvalidModelName`] if the name is not a `*.json` file name
	pub fn resolve_model_name(&self, requested: Option<&str>) -> ChatResult<String> {
		let requested = match &self.config.model {
			ModelSelection::Fixed(file) => file.as_str(),
			ModelSelection::Requested => requested
				.map(str::trim)
				.filter(|name| !name.is_empty())
				.ok_or(ChatError::MissingParameter("model"))?,
		};
		validate_model_name(requested)
	}

	/// Returns the model stored in `file`, loading it if needed.
	///
	/// A loaded model is reused until its file's modification time changes.
	///
	/// # Errors
	/// - [`ChatError::ModelNotFound`] if the file does not exist
	/// - Any loading error of [`MultiGramModel::new`]
	pub fn load_model(&self, file: &str) -> ChatResult<Arc<MultiGramModel>> {
		let path = self.model_path(file)?;
		let modified = fs::metadata(&path)?.modified()?;

		{
			let models = self.models.read().unwrap_or_else(PoisonError::into_inner);
			if let Some(cached) = models.get(file) {
				if cached.modified == modified {
					return Ok(Arc::clone(&cached.model));
				}
				debug!("{file} changed on disk, reloading");
			}
		}

		let model = Arc::new(MultiGramModel::new(&path, &self.config.reserved_tokens, self.config.binary_cache)?);
		let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
		models.insert(file.to_owned(), CachedModel { modified, model: Arc::clone(&model) });
		Ok(model)
	}

	/// Summary of the model stored in `requested`.
	///
	/// The name is validated like a chat request's, but the fixed model
	/// selection does not apply.
	pub fn model_info(&self, requested: &str) -> ChatResult<ModelInfo> {
		let file = validate_model_name(requested)?;
		Ok(self.load_model(&file)?.info())
	}

	/// Answers `request` within `session`, using the thread-local RNG.
	///
	/// See [`Generator::reply_with_rng`].
	pub fn reply(&self, session: &mut Session, request: &ChatRequest) -> ChatResult<ChatResponse> {
		self.reply_with_rng(session, request, &mut rand::rng())
	}

	/// Answers `request` within `session`.
	///
	/// # Behavior
	/// - The message is trimmed and lowercased.
	/// - The session's target language is updated from the message (unless fixed).
	/// - An empty history is primed with the opening context.
	/// - The user turn `"<tag> : <message>\n"` is appended, then the reply is
	///   generated after it and appended too.
	///
	/// # Errors
	/// - [`ChatError::MissingParameter`] if the model or message is missing or blank
	/// - [`ChatError::InvalidModelName`] or [`ChatError::ModelNotFound`] for a bad model
	/// - Any loading error of the weights file
	///
	/// The session is only modified once the model is loaded.
	pub fn reply_with_rng<R: Rng + ?Sized>(
		&self,
		session: &mut Session,
		request: &ChatRequest,
		rng: &mut R,
	) -> ChatResult<ChatResponse> {
		let file = self.resolve_model_name(request.model.as_deref())?;
		let message = request
			.message
			.as_deref()
			.map(str::trim)
			.filter(|message| !message.is_empty())
			.ok_or(ChatError::MissingParameter("message"))?
			.to_lowercase();
		let model = self.load_model(&file)?;

		let input = PredictionInput::from_request(request);
		let language = self.target_language(session, &message);

		if session.history().is_empty() {
			session.history_mut().extend(self.tokenizer.tokenize(&self.config.opening_context));
		}
		let turn = format!("{} : {}\n", self.config.user_tag, message);
		session.history_mut().extend(self.tokenizer.tokenize(&turn));

		let generation =
			TokenGenerator::new(&model, &self.config, &self.sampler, language).run(session.history().tokens(), &input, rng);
		let reply = self.render_reply(&generation.tokens, language);
		debug!(
			"{file}: {} tokens ({:?}), language {}",
			generation.tokens.len(),
			generation.stop_reason,
			language.code()
		);

		let tokens_generated = generation.tokens.len();
		session.history_mut().extend(generation.tokens);

		Ok(ChatResponse { reply, tokens_generated, weights: file, n: model.n() })
	}

	/// Text shown to the user for `tokens`: joined, trimmed, lowercased, and
	/// replaced by the fallback phrase of `language` when nothing is left.
	pub fn render_reply<S: AsRef<str>>(&self, tokens: &[S], language: Language) -> String {
		let reply = detokenize(tokens).to_lowercase();
		if reply.is_empty() {
			return self.config.fallback_replies.for_language(language).to_owned();
		}
		reply
	}

	fn target_language(&self, session: &mut Session, message: &str) -> Language {
		match self.config.language {
			LanguagePolicy::Fixed(language) => language,
			LanguagePolicy::Detect => {
				session.observe_language(detect_language(message, &self.config.scripts));
				session.language()
			}
		}
	}

	fn model_path(&self, file: &str) -> ChatResult<PathBuf> {
		let path = self.models_dir.join(file);
		if !path.is_file() {
			return Err(ChatError::ModelNotFound(file.to_owned()));
		}
		Ok(path)
	}
}

/// Reduces `requested` to a bare `*.json` file name.
fn validate_model_name(requested: &str) -> ChatResult<String> {
	let name = io::base_name(requested).ok_or_else(|| ChatError::InvalidModelName(requested.to_owned()))?;
	let is_json = Path::new(name)
		.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
	if !is_json {
		return Err(ChatError::InvalidModelName(requested.to_owned()));
	}
	Ok(name.to_owned())
}
