//! Text handling shared by the model and the generator.
//!
//! - Word-level tokenization and detokenization (`Tokenizer`, `detokenize`)
//! - Latin/Cyrillic character classes (`ScriptRanges`)
//! - Language detection and per-token language checks

pub mod language;
pub mod script;
pub mod tokenizer;

pub use language::{Language, detect_language, is_token_of_language};
pub use script::{Letters, ScriptRanges};
pub use tokenizer::{LINE_BREAK, Tokenizer, detokenize};
