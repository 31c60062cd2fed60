use crate::error::error_response;
use crate::handlers;
use crate::storage::Storage;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{header, Method, Request};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::{Extension, Router};
use hyper::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "trivia-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Rewrites error responses the framework produced on its own (405 on a
/// method mismatch, extractor rejections) into the uniform JSON envelope.
/// Handler-produced errors are already JSON and pass through untouched.
async fn error_envelope<B>(req: Request<B>, next: Next<B>) -> Response {
    let response = next.run(req).await;
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.as_bytes().starts_with(b"application/json"))
            .unwrap_or(false);
        if !is_json {
            return error_response(status);
        }
    }
    response
}

/// Create the HTTP server with all routes
pub fn create_router(storage: Arc<dyn Storage>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::PUT,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        .route("/health", get(health))
        .route("/categories", get(handlers::get_categories))
        .route(
            "/categories/:category_id/questions",
            get(handlers::get_questions_by_category),
        )
        .route(
            "/questions",
            get(handlers::get_questions).post(handlers::post_questions),
        )
        .route("/questions/:question_id", delete(handlers::delete_question))
        .route("/quizzes", post(handlers::post_quizzes))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(error_envelope))
        .layer(Extension(storage))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(storage: Arc<dyn Storage>, port: u16) -> anyhow::Result<()> {
    let app = create_router(storage);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Trivia API listening on http://localhost:{port}");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
