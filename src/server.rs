use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::aggregator::Aggregator;
use crate::config::AggregatorConfig;
use crate::types::AggregateVerdict;

pub struct AppState {
    pub aggregator: Aggregator,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EvaluateRequest {
    pub subject: String,
}

pub async fn evaluate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<AggregateVerdict>, StatusCode> {
    if request.subject.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    info!(subject = %request.subject, "received evaluate request");

    let verdict = state.aggregator.evaluate(&request.subject).await;
    Ok(Json(verdict))
}

pub async fn run_server(port: u16, config: AggregatorConfig) {
    let state = Arc::new(AppState {
        aggregator: Aggregator::new(config),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/v1/evaluate", post(evaluate_handler))
        .layer(cors)
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(%addr, "reputation aggregator listening");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    axum::serve(listener, app).await.unwrap();
}
