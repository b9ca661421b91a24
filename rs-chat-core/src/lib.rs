//! Word-level n-gram chat engine.
//!
//! This crate provides:
//! - Loading of pre-trained n-gram weights (JSON, with a binary cache)
//! - Language-aware backoff mixing of context orders
//! - Sampling with repetition penalty, temperature, top-k and top-p
//! - Conversation sessions with bounded history
//!
//! Training and serving are out of scope: the HTTP server and the
//! command line client live in their own crates.

/// Engine configuration, readable from TOML.
pub mod config;

/// Error type shared by every fallible operation.
pub mod error;

/// Models, sampling and generation.
pub mod model;

/// Tokenization and script / language classification.
pub mod text;

/// I/O utilities (file listing, path helpers).
pub mod io;

pub use config::{GeneratorConfig, LanguagePolicy, ModelSelection};
pub use error::{ChatError, ChatResult};
pub use model::generator::Generator;
pub use model::request::{ChatRequest, ChatResponse};
pub use model::session::Session;
pub use text::Language;
