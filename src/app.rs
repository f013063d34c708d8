use std::net::SocketAddr;

use anyhow::Context;
use axum::{extract::State, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::routes;
use crate::state::AppState;

async fn health(State(state): State<AppState>) -> &'static str {
    if state.session.snapshot().show_splash {
        "starting"
    } else {
        "ok"
    }
}

/// Bridge router: `/api/v1` routes behind CORS and request tracing.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            routes::router().route("/health", get(health)),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "bridge_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        // Upstream store failures surface as 502.
                        if status.is_server_error() {
                            tracing::error!(%status, "bridge response");
                        } else if status.is_client_error() {
                            tracing::warn!(%status, "bridge response");
                        } else {
                            tracing::debug!(%status, "bridge response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(%addr, "bridge listening");
    axum::serve(listener, app).await.context("serve bridge")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_splash_then_ok() {
        let state = AppState::fake();
        assert_eq!(health(State(state.clone())).await, "starting");

        let mut rx = state.session.subscribe();
        rx.wait_for(|s| !s.show_splash).await.unwrap();
        assert_eq!(health(State(state)).await, "ok");
    }
}
