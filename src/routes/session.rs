use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{specialty_options, RegisteredResponse, SessionView, SpecialtyOption},
    error::{form_error, session_error, ApiError},
};
use crate::{
    forms::{LoginForm, RegisterForm},
    state::AppState,
};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/login", post(login))
        .route("/session/register", post(register))
        .route("/session/logout", post(logout))
        .route("/specialties", get(list_specialties))
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.session.snapshot().into())
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> Result<Json<SessionView>, ApiError> {
    let email = form.validate().map_err(|e| {
        warn!(error = %e, "login form rejected");
        form_error(e)
    })?;

    state
        .session
        .login(&email, &form.password)
        .await
        .map_err(session_error)?;

    Ok(Json(state.session.snapshot().into()))
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<Json<RegisteredResponse>, ApiError> {
    let draft = form.into_draft().map_err(|e| {
        warn!(error = %e, "register form rejected");
        form_error(e)
    })?;

    let id = state.session.register(draft).await.map_err(session_error)?;
    info!(user_id = %id, "account created; awaiting login");
    Ok(Json(RegisteredResponse { id }))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    state.session.logout().await.map_err(session_error)?;
    Ok(Json(state.session.snapshot().into()))
}

pub async fn list_specialties() -> Json<Vec<SpecialtyOption>> {
    Json(specialty_options())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn register_form(email: &str) -> RegisterForm {
        RegisterForm {
            name: "Ana".into(),
            email: email.into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            age: "22".into(),
            specialty: "software".into(),
        }
    }

    fn login_form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_login_logout_through_handlers() {
        let state = AppState::fake();

        let Json(created) = register(State(state.clone()), Json(register_form("ana@x.com")))
            .await
            .unwrap();
        assert!(!created.id.is_empty());
        assert!(state.session.current_user().is_none());

        let (status, Json(body)) =
            register(State(state.clone()), Json(register_form("ana@x.com")))
                .await
                .unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.kind, "email_taken");

        let Json(view) = login(State(state.clone()), Json(login_form(" ana@x.com ", "secret1")))
            .await
            .unwrap();
        assert_eq!(view.user.unwrap().id, created.id);

        let Json(view) = logout(State(state)).await.unwrap();
        assert!(view.user.is_none());
    }

    #[tokio::test]
    async fn invalid_login_form_is_rejected_before_lookup() {
        let state = AppState::fake();
        let (status, Json(body)) = login(State(state), Json(login_form("nope", "secret1")))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.kind, "invalid_email");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let state = AppState::fake();
        register(State(state.clone()), Json(register_form("ana@x.com")))
            .await
            .unwrap();
        let (status, Json(body)) = login(State(state.clone()), Json(login_form("ana@x.com", "wrong")))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.kind, "invalid_credentials");
        assert!(state.session.current_user().is_none());
    }
}
