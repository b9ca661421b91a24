use serde::{Deserialize, Serialize};

use super::script::ScriptRanges;

/// Conversation language, as far as the model's two scripts can tell.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
	#[default]
	Ru,
	En,
	/// No letters seen (digits, punctuation, emoji only).
	Unknown,
}

impl Language {
	pub fn code(&self) -> &'static str {
		match self {
			Language::Ru => "ru",
			Language::En => "en",
			Language::Unknown => "unknown",
		}
	}
}

/// Detects the language of a user message.
///
/// Any Cyrillic character wins, then any Latin letter. Text without
/// letters of either script is `Unknown`.
pub fn detect_language(text: &str, scripts: &ScriptRanges) -> Language {
	let letters = scripts.letters(text);
	if letters.cyrillic {
		Language::Ru
	} else if letters.latin {
		Language::En
	} else {
		Language::Unknown
	}
}

/// Whether `token` may be emitted in a conversation held in `lang`.
///
/// - tokens without letters are neutral and always accepted
/// - mixed-script tokens (`"OKей"`) are always rejected
/// - otherwise the token's letters must all belong to the target script
///
/// With an `Unknown` target every token is accepted.
pub fn is_token_of_language(token: &str, lang: Language, scripts: &ScriptRanges) -> bool {
	let letters = scripts.letters(token);
	if letters.is_neutral() {
		return true;
	}
	if letters.is_mixed() {
		return false;
	}
	match lang {
		Language::Ru => letters.cyrillic,
		Language::En => letters.latin,
		Language::Unknown => true,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_detect_language() {
		let scripts = ScriptRanges::default();
		assert_eq!(detect_language("hello привет", &scripts), Language::Ru);
		assert_eq!(detect_language("how are you?", &scripts), Language::En);
		assert_eq!(detect_language("123 🙂 !", &scripts), Language::Unknown);
		assert_eq!(detect_language("", &scripts), Language::Unknown);
	}

	#[test]
	fn test_token_of_language() {
		let scripts = ScriptRanges::default();
		assert!(is_token_of_language("привет", Language::Ru, &scripts));
		assert!(!is_token_of_language("hello", Language::Ru, &scripts));
		assert!(is_token_of_language("hello", Language::En, &scripts));
		assert!(!is_token_of_language("привет", Language::En, &scripts));
	}

	#[test]
	fn test_neutral_and_mixed_tokens() {
		let scripts = ScriptRanges::default();
		for lang in [Language::Ru, Language::En, Language::Unknown] {
			assert!(is_token_of_language("\n", lang, &scripts));
			assert!(is_token_of_language("42", lang, &scripts));
			assert!(is_token_of_language("!", lang, &scripts));
			assert!(!is_token_of_language("OKей", lang, &scripts));
		}
	}
}
