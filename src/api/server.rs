//! API Server Module
//!
//! This module implements the HTTP server that accepts stamp requests.
//! It validates each submission, turns it into a `StampRequest` and hands it
//! to the aggregator, which places it into a batch.

use crate::{
    aggregator::RequestAggregator,
    config::ApiConfig,
    validation::Validator,
    StampRequest,
};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Placeholder signature attached to every request; signatures are not verified
const MOCK_SIGNATURE: &str = "mock_signature";

/// Shared application state that is accessible across all request handlers
///
/// - `validator`: Rejects malformed submissions at the boundary
/// - `aggregator`: Places accepted requests into batches
#[derive(Clone)]
pub struct AppState {
    validator: Validator,
    aggregator: Arc<RequestAggregator>,
}

/// The main API server struct
///
/// Encapsulates the server configuration and application state.
pub struct Server {
    config: ApiConfig,
    state: AppState,
}

impl Server {
    /// Creates a new API server instance
    ///
    /// # Arguments
    /// * `config` - Listening address (host, port)
    /// * `aggregator` - The aggregator that accepted requests are handed to
    pub fn new(config: ApiConfig, aggregator: Arc<RequestAggregator>) -> Self {
        let state = AppState {
            validator: Validator::new(),
            aggregator,
        };

        Self { config, state }
    }

    /// Build the router with all routes and middleware attached
    pub fn router(&self) -> Router {
        Router::new()
            .route("/create_stamp", post(handle_create_stamp))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Starts the API server and serves until Ctrl-C is received
    ///
    /// # Returns
    /// `Ok(())` after a graceful shutdown, or an error if binding fails
    pub async fn start(self) -> anyhow::Result<()> {
        let app = self.router();

        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Body of a `POST /create_stamp` request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStampRequest {
    pub object_cid: String,
    /// Seconds the caller is willing to wait for the stamp
    pub time_tolerance: f64,
}

/// Successful response to `POST /create_stamp`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStampResponse {
    pub message: String,
    /// Deadline of the batch the request was placed in, epoch milliseconds
    pub deadline: u64,
}

/// Handles `POST /create_stamp`
///
/// 1. Validates the submission (non-empty CID, sane tolerance)
/// 2. Builds a `StampRequest` stamped with the current time
/// 3. Adds it to the aggregator and reports the batch deadline
async fn handle_create_stamp(
    State(state): State<AppState>,
    Json(body): Json<CreateStampRequest>,
) -> Result<Json<CreateStampResponse>, (StatusCode, Json<Value>)> {
    info!("Received a stamp request for {}", body.object_cid);

    if let Err(e) = state.validator.validate(&body) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        ));
    }

    let request = StampRequest {
        object_cid: body.object_cid,
        time_tolerance: body.time_tolerance,
        timestamp: state.aggregator.now_millis(),
        signature: MOCK_SIGNATURE.to_string(),
    };

    let placement = state.aggregator.add_request(request).await;

    Ok(Json(CreateStampResponse {
        message: "Batch stamp request added".to_string(),
        deadline: placement.deadline(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        batch::LoggingProcessor,
        clock::ManualClock,
        config::AggregatorConfig,
    };
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const T0: u64 = 1_700_000_000_000;

    fn create_server() -> (Server, Arc<RequestAggregator>) {
        let aggregator = Arc::new(RequestAggregator::new(
            AggregatorConfig {
                flush_interval_ms: 3_600_000,
                ..AggregatorConfig::default()
            },
            Arc::new(LoggingProcessor),
            Arc::new(ManualClock::new(T0)),
        ));
        let config = ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        (Server::new(config, aggregator.clone()), aggregator)
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/create_stamp")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_stamp_adds_request() {
        let (server, aggregator) = create_server();

        let response = server
            .router()
            .oneshot(post_json(r#"{"objectCid": "bafy123", "timeTolerance": 10}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: CreateStampResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.message, "Batch stamp request added");
        assert_eq!(body.deadline, T0 + 10_000);

        let open = aggregator.open_batches().await;
        assert_eq!(open.len(), 1);
        let request = &open[0].requests[0];
        assert_eq!(request.object_cid, "bafy123");
        assert_eq!(request.timestamp, T0);
        assert_eq!(request.signature, "mock_signature");

        aggregator.stop_processing();
    }

    #[tokio::test]
    async fn test_create_stamp_rejects_negative_tolerance() {
        let (server, aggregator) = create_server();

        let response = server
            .router()
            .oneshot(post_json(r#"{"objectCid": "bafy123", "timeTolerance": -3}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().contains("timeTolerance"));
        assert!(aggregator.open_batches().await.is_empty());

        aggregator.stop_processing();
    }

    #[tokio::test]
    async fn test_create_stamp_rejects_empty_cid() {
        let (server, aggregator) = create_server();

        let response = server
            .router()
            .oneshot(post_json(r#"{"objectCid": "", "timeTolerance": 5}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(aggregator.open_batches().await.is_empty());

        aggregator.stop_processing();
    }

    #[tokio::test]
    async fn test_create_stamp_rejects_missing_fields() {
        let (server, aggregator) = create_server();

        let response = server
            .router()
            .oneshot(post_json(r#"{"objectCid": "bafy123"}"#))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        assert!(aggregator.open_batches().await.is_empty());

        aggregator.stop_processing();
    }
}
