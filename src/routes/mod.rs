//! Local HTTP bridge the UI shell drives.

use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod error;
pub mod profile;
pub mod session;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(session::session_routes())
        .merge(profile::profile_routes())
}
