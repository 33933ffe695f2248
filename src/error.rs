//! Relay error types.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

use crate::web::models::ErrorBody;

pub type RelayResult<T> = Result<T, RelayError>;

/// Every way a relay request can fail, with its HTTP mapping.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Body unreadable, or `messages` missing or not an array.
    #[error("messages[] required")]
    InvalidInput { detail: Option<String> },

    /// `messages` is an array but one entry is not a turn object.
    #[error("invalid message entry")]
    InvalidTurn { detail: String },

    /// Transport failure, timeout or non-success status from the completion API.
    #[error("LLM upstream error")]
    Upstream { status: Option<u16>, detail: String },

    /// Anything else. The message is logged, never returned.
    #[error("Server error")]
    Internal(String),
}

impl RelayError {
    pub fn invalid_input(detail: impl Into<String>) -> Self {
        RelayError::InvalidInput {
            detail: Some(detail.into()),
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            RelayError::InvalidInput { detail } => ErrorBody {
                error: self.to_string(),
                detail: detail.clone(),
                status: None,
            },
            RelayError::InvalidTurn { detail } => ErrorBody {
                error: self.to_string(),
                detail: Some(detail.clone()),
                status: None,
            },
            RelayError::Upstream { status, detail } => ErrorBody {
                error: self.to_string(),
                detail: Some(detail.clone()),
                status: *status,
            },
            RelayError::Internal(_) => ErrorBody {
                error: self.to_string(),
                detail: None,
                status: None,
            },
        }
    }
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidInput { .. } | RelayError::InvalidTurn { .. } => StatusCode::BAD_REQUEST,
            RelayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            RelayError::InvalidInput { detail } => {
                error!("Rejected request: {}", detail.as_deref().unwrap_or("messages missing"))
            }
            RelayError::InvalidTurn { detail } => error!("Rejected request: {}", detail),
            RelayError::Upstream { status, detail } => {
                error!("LLM upstream error: status={:?} detail={}", status, detail)
            }
            RelayError::Internal(msg) => error!("Server error: {}", msg),
        }
        HttpResponse::build(self.status_code()).json(self.body())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::Internal(format!("invalid JSON from upstream: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invalid_input_maps_to_bad_request() {
        let err = RelayError::InvalidInput { detail: None };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(serde_json::to_value(err.body()).unwrap(), json!({ "error": "messages[] required" }));
    }

    #[test]
    fn malformed_entry_has_its_own_heading() {
        let err = RelayError::InvalidTurn {
            detail: "messages[1]: missing field `content`".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            serde_json::to_value(err.body()).unwrap(),
            json!({ "error": "invalid message entry", "detail": "messages[1]: missing field `content`" })
        );
    }

    #[test]
    fn upstream_error_carries_status_and_detail() {
        let err = RelayError::Upstream {
            status: Some(429),
            detail: "rate limited".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            serde_json::to_value(err.body()).unwrap(),
            json!({ "error": "LLM upstream error", "status": 429, "detail": "rate limited" })
        );
    }

    #[test]
    fn internal_error_hides_its_message() {
        let err = RelayError::Internal("connection pool poisoned".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(serde_json::to_value(err.body()).unwrap(), json!({ "error": "Server error" }));
    }
}
