//! Word-level n-gram models and the chat generation engine.
//!
//! This module provides:
//! - Count tables for one context (`State`) and one order (`NGramModel`)
//! - The complete backoff model loaded from a weights file (`MultiGramModel`)
//! - Context mixing, sampling and the token generation loop
//! - Request parameters (`PredictionInput`) and conversations (`Session`)
//! - A high-level chat interface (`Generator`)

/// High-level chat interface over a directory of weights files.
///
/// Resolves model names, caches loaded models and turns user messages into
/// replies within a caller-owned `Session`.
pub mod generator;

/// Token-by-token generation loop and its stop conditions.
pub mod generation;

/// Complete model: unigram counts plus one `NGramModel` per context order.
///
/// Supports loading from JSON weights, reserved token removal and a
/// `postcard` binary cache.
pub mod multigram_model;

/// Context table of a single order.
pub mod ngram_model;

/// Next-token counts observed after one context.
pub mod state;

/// Weighted candidate tokens, with language filters.
pub mod distribution;

/// Backoff mixture of context orders and unigram smoothing.
pub mod mixture;

/// Repetition penalty, temperature, top-k / top-p truncation and the draw.
pub mod sampler;

/// Generation parameters of one request, clamped into their valid ranges.
pub mod prediction_input;

/// Request and response bodies.
pub mod request;

/// Conversation history and target language.
pub mod session;

/// Serde model of the JSON weights file.
///
/// Not exposed
mod weights;
