use super::script::ScriptRanges;

/// Token used for a line break. It is the only whitespace kept by the tokenizer.
pub const LINE_BREAK: &str = "\n";

/// Punctuation glued to the token on its left.
const NO_SPACE_BEFORE: [&str; 10] = [".", ",", "!", "?", ":", ";", ")", "]", "}", "»"];

/// Punctuation glued to the token on its right.
const NO_SPACE_AFTER: [&str; 4] = ["(", "[", "{", "«"];

/// Word-level tokenizer.
///
/// Splits text into:
/// - `"\n"` line-break tokens
/// - maximal runs of word characters (see [`ScriptRanges::is_word_char`])
/// - single punctuation or symbol characters
///
/// Any other whitespace only separates tokens. Case is preserved.
#[derive(Clone, Debug, Default)]
pub struct Tokenizer {
	scripts: ScriptRanges,
}

impl Tokenizer {
	pub fn new(scripts: ScriptRanges) -> Self {
		Self { scripts }
	}

	/// Splits `text` into tokens, left to right.
	///
	/// Returns an empty vector for empty or whitespace-only input.
	pub fn tokenize(&self, text: &str) -> Vec<String> {
		let mut tokens = Vec::new();
		let mut word = String::new();

		for c in text.chars() {
			if self.scripts.is_word_char(c) {
				word.push(c);
				continue;
			}

			if !word.is_empty() {
				tokens.push(std::mem::take(&mut word));
			}

			if c == '\n' {
				tokens.push(LINE_BREAK.to_owned());
			} else if !c.is_whitespace() {
				tokens.push(c.to_string());
			}
		}

		if !word.is_empty() {
			tokens.push(word);
		}

		tokens
	}
}

/// Joins tokens back into text.
///
/// Tokens are separated by a single space, except around punctuation
/// (`"hi , you"` becomes `"hi, you"`) and after line breaks, which are
/// written as literal newlines. The result never starts or ends with
/// whitespace.
pub fn detokenize<S: AsRef<str>>(tokens: &[S]) -> String {
	let mut out = String::new();
	let mut prev: Option<&str> = None;

	for token in tokens {
		let token = token.as_ref();
		if token == LINE_BREAK {
			out.push('\n');
			prev = None;
			continue;
		}

		if let Some(prev) = prev {
			if !NO_SPACE_BEFORE.contains(&token) && !NO_SPACE_AFTER.contains(&prev) {
				out.push(' ');
			}
		}
		out.push_str(token);
		prev = Some(token);
	}

	out.trim().to_owned()
}
