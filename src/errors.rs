// src/errors.rs
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShelfScanError {
    #[error("Redis error: {0}")]
    Redis(String),

    #[error("AI service error: {0}")]
    LLM(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Style '{style_id}' cannot {action} while {from}")]
    InvalidTransition {
        style_id: String,
        from: &'static str,
        action: &'static str,
    },

    #[error("Busy: {0}")]
    Busy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<redis::RedisError> for ShelfScanError {
    fn from(e: redis::RedisError) -> Self {
        ShelfScanError::Redis(e.to_string())
    }
}

impl From<serde_json::Error> for ShelfScanError {
    fn from(e: serde_json::Error) -> Self {
        ShelfScanError::Serialization(e.to_string())
    }
}

impl ShelfScanError {
    fn category(&self) -> &'static str {
        match self {
            ShelfScanError::Redis(_) => "Database error",
            ShelfScanError::LLM(_) => "AI service error",
            ShelfScanError::ImageProcessing(_) => "Image processing error",
            ShelfScanError::Serialization(_) => "Data processing error",
            ShelfScanError::Validation(_) => "Validation error",
            ShelfScanError::Config(_) => "Configuration error",
            ShelfScanError::NotFound(_) => "Not found",
            ShelfScanError::InvalidTransition { .. } => "Invalid transition",
            ShelfScanError::Busy(_) => "Busy",
            ShelfScanError::Io(_) => "IO error",
        }
    }
}

impl ResponseError for ShelfScanError {
    fn error_response(&self) -> HttpResponse {
        let body = serde_json::json!({
            "error": self.category(),
            "message": self.to_string()
        });

        match self {
            ShelfScanError::Redis(_)
            | ShelfScanError::Serialization(_)
            | ShelfScanError::Config(_)
            | ShelfScanError::Io(_) => HttpResponse::InternalServerError().json(body),
            ShelfScanError::LLM(_) => HttpResponse::ServiceUnavailable().json(body),
            ShelfScanError::ImageProcessing(_) | ShelfScanError::Validation(_) => {
                HttpResponse::BadRequest().json(body)
            }
            ShelfScanError::NotFound(_) => HttpResponse::NotFound().json(body),
            ShelfScanError::InvalidTransition { .. } | ShelfScanError::Busy(_) => {
                HttpResponse::Conflict().json(body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn maps_errors_to_status_codes() {
        let cases = [
            (ShelfScanError::Redis("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ShelfScanError::LLM("quota".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ShelfScanError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ShelfScanError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ShelfScanError::Busy("batch".into()), StatusCode::CONFLICT),
            (
                ShelfScanError::InvalidTransition {
                    style_id: "surprise".into(),
                    from: "completed",
                    action: "start",
                },
                StatusCode::CONFLICT,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.error_response().status(), status, "{err}");
        }
    }

    #[test]
    fn transition_error_names_style_and_state() {
        let err = ShelfScanError::InvalidTransition {
            style_id: "high_speed".into(),
            from: "processing",
            action: "start",
        };
        assert_eq!(
            err.to_string(),
            "Style 'high_speed' cannot start while processing"
        );
    }
}
