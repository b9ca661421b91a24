use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_chat_core::{ChatError, ChatRequest, Generator, GeneratorConfig, Language, LanguagePolicy, ModelSelection};

const UNIGRAM_ONLY: &str = r#"{"N": 3, "unigram": {"a": 5, "b": 5}, "grams": {}}"#;

fn write_model(dir: &Path, name: &str, json: &str) {
	fs::write(dir.join(name), json).unwrap();
}

fn setup(config: GeneratorConfig, models: &[(&str, &str)]) -> (tempfile::TempDir, Generator) {
	let dir = tempfile::tempdir().unwrap();
	for (name, json) in models {
		write_model(dir.path(), name, json);
	}
	let generator = Generator::new(config.with_models_dir(dir.path())).unwrap();
	(dir, generator)
}

fn request(model: &str, message: &str, max_tokens: i64) -> ChatRequest {
	ChatRequest { max_tokens: Some(max_tokens), ..ChatRequest::new(model, message) }
}

#[test]
fn unigram_only_model_draws_from_unigrams() {
	let (_dir, generator) = setup(GeneratorConfig::default(), &[("w.json", UNIGRAM_ONLY)]);
	let mut session = generator.new_session();
	let mut rng = StdRng::seed_from_u64(1);

	let response = generator.reply_with_rng(&mut session, &request("w.json", "Hi", 20), &mut rng).unwrap();
	assert_eq!(response.tokens_generated, 20);
	assert_eq!(response.weights, "w.json");
	assert_eq!(response.n, 3);
	assert!(response.reply.split(' ').all(|word| word == "a" || word == "b"));

	// opening context (12) + "User : hi \n" (4) + reply (20)
	assert_eq!(session.history().len(), 36);
	assert_eq!(session.history().tokens()[..4], ["System", ":", "you", "are"]);
	assert_eq!(session.history().tokens()[12..16], ["User", ":", "hi", "\n"]);
	assert_eq!(session.language(), Language::En);
}

#[test]
fn empty_reply_uses_fallback_phrase() {
	let (_dir, generator) = setup(
		GeneratorConfig::default(),
		&[("latin.json", UNIGRAM_ONLY), ("cyrillic.json", r#"{"unigram": {"да": 1}, "grams": {}}"#)],
	);
	let mut rng = StdRng::seed_from_u64(2);

	let mut session = generator.new_session();
	let response = generator.reply_with_rng(&mut session, &request("cyrillic.json", "hello", 10), &mut rng).unwrap();
	assert_eq!(response.reply, "ok.");
	assert_eq!(response.tokens_generated, 0);

	let mut session = generator.new_session();
	let response = generator.reply_with_rng(&mut session, &request("latin.json", "привет", 10), &mut rng).unwrap();
	assert_eq!(response.reply, "окей.");
	assert_eq!(response.tokens_generated, 0);
}

#[test]
fn request_errors_leave_session_untouched() {
	let (_dir, generator) = setup(GeneratorConfig::default(), &[("w.json", UNIGRAM_ONLY), ("notes.txt", "")]);
	let mut session = generator.new_session();

	let no_message = ChatRequest { model: Some("w.json".to_owned()), ..ChatRequest::default() };
	let err = generator.reply(&mut session, &no_message).unwrap_err();
	assert!(matches!(err, ChatError::MissingParameter("message")));
	assert!(err.is_request_error());

	let err = generator.reply(&mut session, &request("w.json", "   ", 5)).unwrap_err();
	assert!(matches!(err, ChatError::MissingParameter("message")));

	let no_model = ChatRequest { message: Some("hi".to_owned()), ..ChatRequest::default() };
	assert!(matches!(generator.reply(&mut session, &no_model), Err(ChatError::MissingParameter("model"))));

	let err = generator.reply(&mut session, &request("notes.txt", "hi", 5)).unwrap_err();
	assert!(matches!(err, ChatError::InvalidModelName(_)));

	let err = generator.reply(&mut session, &request("missing.json", "hi", 5)).unwrap_err();
	assert!(matches!(err, ChatError::ModelNotFound(_)));
	assert!(!err.is_request_error());

	assert!(session.history().is_empty());
	assert_eq!(session.language(), Language::Ru);
}

#[test]
fn malformed_weights_are_reported() {
	let (_dir, generator) = setup(
		GeneratorConfig::default(),
		&[("broken.json", "{\"unigram\": "), ("partial.json", r#"{"unigram": {"a": 1}}"#)],
	);
	let mut session = generator.new_session();

	assert!(matches!(generator.reply(&mut session, &request("broken.json", "hi", 5)), Err(ChatError::Json(_))));
	assert!(matches!(
		generator.reply(&mut session, &request("partial.json", "hi", 5)),
		Err(ChatError::MissingField("grams"))
	));
}

#[test]
fn path_components_are_stripped_from_model_names() {
	let (_dir, generator) = setup(GeneratorConfig::default(), &[("w.json", UNIGRAM_ONLY)]);
	let mut session = generator.new_session();

	let response = generator.reply(&mut session, &request("../../w.json", "hi", 3)).unwrap();
	assert_eq!(response.weights, "w.json");
}

#[test]
fn fixed_language_policy_filters_tokens() {
	let config = GeneratorConfig { language: LanguagePolicy::Fixed(Language::En), ..GeneratorConfig::default() };
	let (_dir, generator) =
		setup(config, &[("w.json", r#"{"unigram": {"hello": 1, "привет": 1000}, "grams": {}}"#)]);
	let mut session = generator.new_session();
	let mut rng = StdRng::seed_from_u64(3);

	let response = generator.reply_with_rng(&mut session, &request("w.json", "привет", 4), &mut rng).unwrap();
	assert_eq!(response.reply, "hello hello hello hello");
}

#[test]
fn detected_language_is_sticky() {
	let (_dir, generator) = setup(GeneratorConfig::default(), &[("w.json", UNIGRAM_ONLY)]);
	let mut session = generator.new_session();

	generator.reply(&mut session, &request("w.json", "hello", 2)).unwrap();
	assert_eq!(session.language(), Language::En);

	generator.reply(&mut session, &request("w.json", "42 !", 2)).unwrap();
	assert_eq!(session.language(), Language::En);

	generator.reply(&mut session, &request("w.json", "привет", 2)).unwrap();
	assert_eq!(session.language(), Language::Ru);
}

#[test]
fn fixed_model_ignores_requested_name() {
	let config = GeneratorConfig { model: ModelSelection::Fixed("w.json".to_owned()), ..GeneratorConfig::default() };
	let (_dir, generator) = setup(config, &[("w.json", UNIGRAM_ONLY)]);
	let mut session = generator.new_session();

	let no_model = ChatRequest { message: Some("hi".to_owned()), max_tokens: Some(2), ..ChatRequest::default() };
	assert_eq!(generator.reply(&mut session, &no_model).unwrap().weights, "w.json");

	let response = generator.reply(&mut session, &request("other.json", "hi", 2)).unwrap();
	assert_eq!(response.weights, "w.json");
}

#[test]
fn history_is_bounded_and_reset_reprimes() {
	let config = GeneratorConfig { max_history_tokens: 30, ..GeneratorConfig::default() };
	let (_dir, generator) = setup(config, &[("w.json", UNIGRAM_ONLY)]);
	let mut session = generator.new_session();

	for _ in 0..3 {
		generator.reply(&mut session, &request("w.json", "hi", 20)).unwrap();
		assert!(session.history().len() <= 30);
	}
	assert_ne!(session.history().tokens()[0], "System");

	session.reset();
	generator.reply(&mut session, &request("w.json", "hi", 1)).unwrap();
	assert_eq!(session.history().tokens()[0], "System");
	assert_eq!(session.history().len(), 17);
}

#[test]
fn context_predictions_follow_the_conversation() {
	// After "User : hi \n" the model always answers "a b" then a line break
	let weights = r#"{
		"N": 4,
		"unigram": {"a": 1, "b": 1},
		"grams": {
			"1": {"\n": {"a": 1}, "a": {"b": 1}, "b": {"\n": 1}},
			"3": {"hi\t\n\ta": {"b": 1}}
		}
	}"#;
	let config = GeneratorConfig { unigram_lambda: 0.0, min_stop_len: 1, ..GeneratorConfig::default() };
	let (_dir, generator) = setup(config, &[("w.json", weights)]);
	let mut session = generator.new_session();
	let mut rng = StdRng::seed_from_u64(4);

	let response = generator.reply_with_rng(&mut session, &request("w.json", "hi", 50), &mut rng).unwrap();
	assert_eq!(response.reply, "a b");
	assert_eq!(response.tokens_generated, 3);
}

#[test]
fn binary_cache_is_written_next_to_weights() {
	let (dir, generator) = setup(GeneratorConfig::default(), &[("w.json", UNIGRAM_ONLY)]);
	generator.load_model("w.json").unwrap();
	assert!(dir.path().join("w.bin").is_file());

	let models = generator.list_models().unwrap();
	assert_eq!(models.len(), 1);
	assert_eq!(models[0].file, "w.json");
	assert_eq!(models[0].size, UNIGRAM_ONLY.len() as u64);
}

#[test]
fn model_info_summarizes_levels() {
	let weights = r#"{"N": 5, "unigram": {"a": 1, "OK": 3}, "grams": {"1": {"a": {"a": 1}}, "2": {"a\ta": {"OK": 1}}}}"#;
	let (_dir, generator) = setup(GeneratorConfig::default(), &[("w.json", weights)]);

	let info = generator.model_info("w.json").unwrap();
	assert_eq!(info.n, 5);
	assert_eq!(info.unigram, 1);
	assert_eq!(info.levels.len(), 1);
	assert_eq!(info.levels[0].order, 1);
	assert_eq!(info.levels[0].contexts, 1);
}
