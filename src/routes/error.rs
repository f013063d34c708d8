use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::error;

use crate::{error::SessionError, forms::FormError};

/// Body of every failed bridge call; the UI shows `message` in a modal.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

fn kind_tag<T: Serialize>(kind: T) -> String {
    match serde_json::to_value(kind) {
        Ok(serde_json::Value::String(s)) => s,
        _ => "unknown".into(),
    }
}

pub fn form_error(e: FormError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            kind: kind_tag(e),
            message: e.to_string(),
        }),
    )
}

pub fn session_error(e: SessionError) -> ApiError {
    use SessionError::*;
    let status = match &e {
        UserNotFound => StatusCode::NOT_FOUND,
        InvalidCredentials | NoActiveSession => StatusCode::UNAUTHORIZED,
        EmailTaken => StatusCode::CONFLICT,
        InvalidAge(_) | NoImage => StatusCode::BAD_REQUEST,
        UpdateFailed(_) | UploadFailed(_) | Backend(_) => {
            error!(error = %e, "backend call failed");
            StatusCode::BAD_GATEWAY
        }
    };
    (
        status,
        Json(ErrorBody {
            kind: kind_tag(e.kind()),
            message: e.to_string(),
        }),
    )
}
