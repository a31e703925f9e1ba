//! Correlation-id request tracing.
//!
//! [`RequestTrace`] sits between the transport and the application router.
//! For POST requests it captures the caller-supplied `opc-request-id` header
//! once at entry and logs lifecycle events as the exchange progresses:
//! request received, client disconnected, response started, response
//! finished. Every message is forwarded unmodified in content and order;
//! non-POST requests pass through untouched and unlogged.

use crate::{OPC_REQUEST_ID, TRACE_TARGET};
use axum::{body::Body, response::Response};
use futures::future::BoxFuture;
use http::{HeaderMap, Method, Request};
use http_body::{Body as HttpBody, Frame, SizeHint};
use hyper::body::Bytes;
use std::{
    fmt::{self, Display},
    pin::Pin,
    task::{Context, Poll},
};
use tower::Service;
use tower_layer::{layer_fn, LayerFn};
use tracing::{error, info};

/// Correlation identifier captured once at request entry.
///
/// The id is an opaque string trusted from the caller. An absent header is a
/// first-class state, rendered as `none` in log output rather than an empty
/// string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceId(Option<String>);

impl TraceId {
    /// Case-insensitive lookup of the correlation header.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self(
            headers
                .get(OPC_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
        )
    }

    /// The raw id, if the caller supplied one.
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(id) => f.write_str(id),
            None => f.write_str("none"),
        }
    }
}

/// Middleware for logging exchange lifecycle events keyed by the
/// caller-supplied correlation id.
#[derive(Clone, Debug)]
pub struct RequestTrace<S> {
    inner: S,
}

impl<S> RequestTrace<S> {
    /// Create the request tracing layer.
    pub fn layer() -> LayerFn<impl Fn(S) -> RequestTrace<S> + Clone + 'static> {
        layer_fn(|inner| RequestTrace { inner })
    }
}

impl<S> Service<Request<Body>> for RequestTrace<S>
where
    S: Service<Request<Body>, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Display,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Only mutating requests are traced. Everything else goes to the
        // inner service with the original channels untouched.
        if req.method() != Method::POST {
            return Box::pin(self.inner.call(req));
        }

        // Headers are read once; the id stays fixed for the whole exchange.
        let trace_id = TraceId::from_headers(req.headers());
        info!(target: TRACE_TARGET, %trace_id, "request received");

        let (parts, body) = req.into_parts();
        let receive = ReceiveTap {
            inner: body,
            trace_id: trace_id.clone(),
            disconnected: false,
        };
        let req = Request::from_parts(parts, Body::new(receive));

        let fut = self.inner.call(req);

        Box::pin(async move {
            match fut.await {
                Ok(response) => {
                    info!(
                        target: TRACE_TARGET,
                        %trace_id,
                        status = response.status().as_u16(),
                        "response started"
                    );
                    let (parts, body) = response.into_parts();
                    let send = SendTap {
                        inner: body,
                        trace_id,
                        finished: false,
                    };
                    Ok(Response::from_parts(parts, Body::new(send)))
                }
                Err(e) => {
                    error!(target: TRACE_TARGET, %trace_id, "request failed: {e}");
                    Err(e)
                }
            }
        })
    }
}

/// Decorator over the request body, the client-to-server channel.
struct ReceiveTap {
    inner: Body,
    trace_id: TraceId,
    disconnected: bool,
}

impl HttpBody for ReceiveTap {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        // hyper surfaces a client disconnect as a read error on the request
        // body. Log it once and hand the handler the original result.
        if let Poll::Ready(Some(Err(_))) = &polled {
            if !this.disconnected {
                this.disconnected = true;
                info!(
                    target: TRACE_TARGET,
                    trace_id = %this.trace_id,
                    "client disconnected"
                );
            }
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Decorator over the response body, the server-to-client channel.
struct SendTap {
    inner: Body,
    trace_id: TraceId,
    finished: bool,
}

impl SendTap {
    fn mark_finished(&mut self) {
        if !self.finished {
            self.finished = true;
            info!(
                target: TRACE_TARGET,
                trace_id = %self.trace_id,
                "response finished"
            );
        }
    }
}

impl HttpBody for SendTap {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            // The chunk just handed out exhausted the body.
            Poll::Ready(Some(Ok(_))) if this.inner.is_end_stream() => this.mark_finished(),
            Poll::Ready(None) => this.mark_finished(),
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod test {
    use super::TraceId;
    use http::Request;

    #[test]
    fn trace_id_lookup_is_case_insensitive() {
        let request = Request::builder()
            .header("OPC-Request-Id", "req-42")
            .body(())
            .unwrap();

        let id = TraceId::from_headers(request.headers());
        assert_eq!(id.as_deref(), Some("req-42"));
        assert_eq!(id.to_string(), "req-42");
    }

    #[test]
    fn missing_header_renders_none() {
        let request = Request::builder().body(()).unwrap();

        let id = TraceId::from_headers(request.headers());
        assert_eq!(id.as_deref(), None);
        assert_eq!(id.to_string(), "none");
    }
}
