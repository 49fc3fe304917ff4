use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use thiserror::Error;

use crate::config::SourceConfig;
use crate::source::{self, TableSource};

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {message}")]
    Serve { message: String },
}

/// Shared, immutable request context: one reqwest client and the resolved
/// source configuration. Requests never share fetch state beyond this.
pub struct AppState {
    pub client: reqwest::Client,
    pub source: SourceConfig,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/zap-records", get(zap_records))
        .with_state(state)
}

// Each request triggers one full paginated fetch; no coalescing, no cache.
// Failure detail stays in the log, the client only sees a generic 500.
async fn zap_records(State(state): State<Arc<AppState>>) -> Response {
    let mut table = TableSource::new(state.client.clone(), state.source.clone());
    match source::fetch_all_records(&mut table).await {
        Ok(records) => {
            tracing::debug!(count = records.len(), "served record set");
            Json(records).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "record fetch failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "server error").into_response()
        }
    }
}

pub async fn serve(state: Arc<AppState>, port: u16) -> Result<(), ServeError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener =
        std::net::TcpListener::bind(addr).map_err(|e| ServeError::Bind { addr, source: e })?;
    listener
        .set_nonblocking(true)
        .map_err(|e| ServeError::Bind { addr, source: e })?;

    tracing::info!(%addr, "listening");
    axum::Server::from_tcp(listener)
        .map_err(|e| ServeError::Serve {
            message: e.to_string(),
        })?
        .serve(router(state).into_make_service())
        .await
        .map_err(|e| ServeError::Serve {
            message: e.to_string(),
        })?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Serves the router on an ephemeral loopback port and returns its base
    /// URL. The task runs until the test process exits.
    pub fn spawn(state: Arc<AppState>) -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        listener.set_nonblocking(true).unwrap();
        let server = axum::Server::from_tcp(listener)
            .unwrap()
            .serve(router(state).into_make_service());
        tokio::spawn(server);
        format!("http://{addr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_state() -> Arc<AppState> {
        Arc::new(AppState {
            client: source::build_client(2).unwrap(),
            source: SourceConfig {
                // port 1 is never listening on loopback
                api_url: "http://127.0.0.1:1".to_string(),
                api_key: "key".to_string(),
                base_id: "appBase".to_string(),
                table: "Membres ZAP".to_string(),
                view: "Membres cotisants".to_string(),
                timeout_seconds: 2,
            },
        })
    }

    #[tokio::test]
    async fn endpoint_maps_fetch_failure_to_generic_500() {
        let base = testing::spawn(unreachable_state());
        let response = reqwest::get(format!("{base}/api/zap-records"))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 500);
        let body = response.text().await.unwrap();
        assert_eq!(body, "server error");
    }
}
