use serde::{Deserialize, Serialize};

/// Body of an inference request.
///
/// Only `model` and `message` are required; `model` is ignored when the
/// generator is configured with a fixed weights file. Numeric fields are
/// clamped by [`PredictionInput`](super::prediction_input::PredictionInput).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ChatRequest {
	pub model: Option<String>,
	pub message: Option<String>,
	pub max_tokens: Option<i64>,
	pub temperature: Option<f64>,
	pub top_k: Option<i64>,
	pub top_p: Option<f64>,
	pub rep_penalty: Option<f64>,
	pub rep_window: Option<i64>,
}

impl ChatRequest {
	pub fn new(model: &str, message: &str) -> Self {
		Self {
			model: Some(model.to_owned()),
			message: Some(message.to_owned()),
			..Self::default()
		}
	}
}

/// Result of an inference call.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatResponse {
	pub reply: String,
	pub tokens_generated: usize,
	/// File name of the weights used.
	pub weights: String,
	#[serde(rename = "N")]
	pub n: usize,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_request_from_json() {
		let request: ChatRequest =
			serde_json::from_str(r#"{"model": "w.json", "message": "hi", "top_k": 5, "extra": true}"#).unwrap();
		assert_eq!(request.model.as_deref(), Some("w.json"));
		assert_eq!(request.top_k, Some(5));
		assert_eq!(request.temperature, None);
	}

	#[test]
	fn test_response_field_names() {
		let response = ChatResponse { reply: "ok.".to_owned(), tokens_generated: 0, weights: "w.json".to_owned(), n: 12 };
		let json = serde_json::to_value(&response).unwrap();
		assert_eq!(json["N"], 12);
		assert_eq!(json["tokens_generated"], 0);
	}
}
