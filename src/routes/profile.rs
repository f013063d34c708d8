use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap},
    routing::{patch, put},
    Json, Router,
};
use bytes::Bytes;
use tracing::{instrument, warn};

use super::{
    dto::{ImageResponse, SessionView},
    error::{form_error, session_error, ApiError},
};
use crate::{
    error::SessionError,
    forms::ProfileForm,
    session::ImagePayload,
    state::AppState,
};

const SOURCE_URI_HEADER: &str = "x-source-uri";

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", patch(update_profile))
        .route("/profile/image", put(upload_image))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB
}

#[instrument(skip(state, form))]
pub async fn update_profile(
    State(state): State<AppState>,
    Json(form): Json<ProfileForm>,
) -> Result<Json<SessionView>, ApiError> {
    let current = state
        .session
        .current_user()
        .ok_or_else(|| session_error(SessionError::NoActiveSession))?;

    let patch = form.diff(&current).map_err(|e| {
        warn!(error = %e, "profile form rejected");
        form_error(e)
    })?;

    state
        .session
        .update_profile(&patch)
        .await
        .map_err(session_error)?;

    Ok(Json(state.session.snapshot().into()))
}

fn image_payload(headers: &HeaderMap, body: Bytes) -> ImagePayload {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let source_uri = headers
        .get(SOURCE_URI_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    ImagePayload {
        body,
        content_type,
        source_uri,
    }
}

#[instrument(skip(state, headers, body))]
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ImageResponse>, ApiError> {
    let url = state
        .session
        .upload_profile_image(image_payload(&headers, body))
        .await
        .map_err(session_error)?;
    Ok(Json(ImageResponse { url }))
}
