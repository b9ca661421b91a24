use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use rs_chat_core::ChatError;
use serde_json::json;

/// Error returned by a handler, rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error(transparent)]
	Chat(#[from] ChatError),

	#[error("invalid request body: {0}")]
	Body(String),

	#[error("worker pool unavailable")]
	Blocking(#[from] BlockingError),
}

impl ResponseError for ApiError {
	fn status_code(&self) -> StatusCode {
		match self {
			ApiError::Chat(e) if e.is_request_error() => StatusCode::BAD_REQUEST,
			ApiError::Body(_) => StatusCode::BAD_REQUEST,
			ApiError::Chat(ChatError::ModelNotFound(_)) => StatusCode::NOT_FOUND,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn error_response(&self) -> HttpResponse {
		HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
	}
}
