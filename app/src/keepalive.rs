//! Tiny HTTP server so hosting platforms see the process as alive.

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};
use std::time::Instant;
use tracing::info;

const BANNER: &str = "Kai mentor bot is alive";

async fn root() -> &'static str {
    BANNER
}

async fn health(State(started): State<Instant>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime_secs": started.elapsed().as_secs(),
    }))
}

pub fn router(started: Instant) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(started)
}

pub async fn serve(host: &str, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("Keepalive server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(Instant::now())).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_body(path: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let resp = router(Instant::now()).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn root_reports_alive() {
        let (status, body) = get_body("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, BANNER.as_bytes());
    }

    #[tokio::test]
    async fn health_reports_status_and_uptime() {
        let (status, body) = get_body("/health").await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status"], "ok");
        assert!(value["uptime_secs"].is_u64());
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let (status, _) = get_body("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
