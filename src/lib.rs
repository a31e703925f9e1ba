use axum::{
    http::header::HeaderName,
    routing::{get, post},
    Router,
};
use middleware::request_trace::RequestTrace;
use tower::ServiceBuilder;
use tower_http::propagate_header::PropagateHeaderLayer;

pub mod arguments;
pub mod handlers;
pub mod middleware;

pub use middleware::request_trace::TraceId;

/// Tracing target for middleware lifecycle events.
pub const TRACE_TARGET: &str = "opc-trace";
/// Header name for the caller-supplied correlation identifier.
pub const OPC_REQUEST_ID: &str = "opc-request-id";

/// Demo routes that give the middleware realistic traffic shapes.
fn trace_routes() -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/echo", post(handlers::echo))
        .route("/stream", post(handlers::stream))
}

/// Builds the routes and the layered middleware.
pub fn build_app() -> Router {
    let tower_middleware = ServiceBuilder::new()
        .layer(PropagateHeaderLayer::new(HeaderName::from_static(
            OPC_REQUEST_ID,
        )))
        .layer(RequestTrace::layer());

    Router::new()
        .nest("/api/v1", trace_routes())
        .layer(tower_middleware)
}
