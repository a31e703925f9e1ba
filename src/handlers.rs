//! Route handlers for the demo tracing service.
use crate::TRACE_TARGET;
use axum::{
    body::{to_bytes, Body},
    extract::Request,
    response::{IntoResponse, Response},
    Json,
};
use futures::stream;
use http::StatusCode;
use hyper::body::Bytes;
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{debug, event, Level};

type HandlerResult<T> = Result<T, HandlerError>;

/// Common error type for handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Failed to read request body: {0}")]
    BodyRead(#[from] axum::Error),
    #[error("Http response error: {0}")]
    Http(#[from] http::Error),
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let error_message = format!("{self}");

        event!(target: TRACE_TARGET, Level::ERROR, "Server error: {error_message}");

        let body = json!({
          "label": "server.error",
          "message": error_message
        });

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Service health payload.
#[derive(Serialize)]
pub struct Health {
    status: &'static str,
}

/// Health probe handler.
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Echo the request body back to the caller.
pub async fn echo(request: Request) -> HandlerResult<Response> {
    let bytes = to_bytes(request.into_body(), usize::MAX).await?;
    debug!("echoing {} bytes", bytes.len());

    Ok(Response::builder()
        .status(StatusCode::OK)
        .body(Body::from(bytes))?)
}

/// Respond with a chunked body.
pub async fn stream() -> Response {
    let chunks = ["chunk-one\n", "chunk-two\n", "chunk-three\n"]
        .into_iter()
        .map(|chunk| Ok::<_, Infallible>(Bytes::from(chunk)));

    Body::from_stream(stream::iter(chunks)).into_response()
}
