use serde::{Deserialize, Serialize};

/// Character classes used to recognise Latin and Cyrillic letters.
///
/// Both the tokenizer (what counts as a word character) and the language
/// filter (which script a token belongs to) read from the same table, so
/// a word is never split on a letter that language detection accepts.
///
/// Ranges are inclusive `(first, last)` pairs.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ScriptRanges {
	pub latin: Vec<(char, char)>,
	pub cyrillic: Vec<(char, char)>,
}

impl Default for ScriptRanges {
	fn default() -> Self {
		Self {
			latin: vec![
				('A', 'Z'),
				('a', 'z'),
				('\u{00C0}', '\u{00D6}'),
				('\u{00D8}', '\u{00F6}'),
				('\u{00F8}', '\u{024F}'),
				('\u{1E00}', '\u{1EFF}'),
			],
			cyrillic: vec![
				('\u{0400}', '\u{052F}'),
				('\u{1C80}', '\u{1C8F}'),
				('\u{2DE0}', '\u{2DFF}'),
				('\u{A640}', '\u{A69F}'),
			],
		}
	}
}

/// Letters found in a piece of text, per script.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Letters {
	pub latin: bool,
	pub cyrillic: bool,
}

impl Letters {
	/// No letters of either script (digits, punctuation, emoji, line breaks).
	pub fn is_neutral(&self) -> bool {
		!self.latin && !self.cyrillic
	}

	pub fn is_mixed(&self) -> bool {
		self.latin && self.cyrillic
	}
}

impl ScriptRanges {
	pub fn is_latin(&self, c: char) -> bool {
		in_ranges(&self.latin, c)
	}

	pub fn is_cyrillic(&self, c: char) -> bool {
		in_ranges(&self.cyrillic, c)
	}

	/// Characters that extend a word token: ASCII digits, letters of either
	/// script, and combining diacritical marks.
	pub fn is_word_char(&self, c: char) -> bool {
		c.is_ascii_digit() || self.is_latin(c) || self.is_cyrillic(c) || is_combining_mark(c)
	}

	/// Scans `text` once and reports which scripts appear in it.
	pub fn letters(&self, text: &str) -> Letters {
		let mut letters = Letters::default();
		for c in text.chars() {
			letters.latin |= self.is_latin(c);
			letters.cyrillic |= self.is_cyrillic(c);
			if letters.is_mixed() {
				break;
			}
		}
		letters
	}
}

fn in_ranges(ranges: &[(char, char)], c: char) -> bool {
	ranges.iter().any(|&(first, last)| first <= c && c <= last)
}

fn is_combining_mark(c: char) -> bool {
	('\u{0300}'..='\u{036F}').contains(&c)
}
