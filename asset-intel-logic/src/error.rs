use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("quota exceeded: {0}")]
    QuotaRunsExceeded(String),
    #[error("quota exceeded: {0}")]
    QuotaCostExceeded(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Convert(#[from] ParseError),
    #[error("queue error: {0}")]
    Queue(#[from] redis::RedisError),
    #[error("db error: {0}")]
    Db(#[from] DbErr),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("parse error: invalid integer")]
    ParseInt(#[from] std::num::ParseIntError),
    #[error("parse error: invalid uuid")]
    ParseUuid(#[from] uuid::Error),
    #[error("parse error: invalid json")]
    Json(#[from] serde_json::Error),
    #[error("parse error: {0}")]
    Custom(String),
}

impl ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Convert(_) => StatusCode::BAD_REQUEST,
            Self::QuotaRunsExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::QuotaCostExceeded(_) => StatusCode::PAYMENT_REQUIRED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Queue(_) | Self::Db(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        ServiceError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self, Self::Db(_) | Self::Internal(_) | Self::Queue(_)) {
            tracing::error!(err = ?self, "request failed");
        }
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
