use crate::collectors::{CollectError, Collector};
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

#[derive(Clone)]
pub struct HttpAppState {
    pub collector: Arc<Collector>,
}

pub fn build_router(collector: Arc<Collector>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/stats", get(stats_handler))
        .layer(cors)
        .with_state(HttpAppState { collector })
}

async fn stats_handler(State(state): State<HttpAppState>) -> Result<Response, CollectError> {
    let snapshot = state.collector.collect().await?;
    Ok(Json(snapshot).into_response())
}

impl IntoResponse for CollectError {
    fn into_response(self) -> Response {
        error!(error = %self, "collection failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("collection failed: {self}"),
        )
            .into_response()
    }
}
