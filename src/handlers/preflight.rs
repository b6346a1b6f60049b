//! Preflight middleware
//!
//! Sits outside the CORS layer. The CORS layer answers every `OPTIONS`
//! request with the negotiated `Access-Control-*` headers and an empty body;
//! this keeps those headers and turns the reply into `200 {}`.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};

pub async fn handle(req: Request, next: Next) -> Response {
    if req.method() != Method::OPTIONS {
        return next.run(req).await;
    }

    tracing::debug!("Received preflight for: {}", req.uri().path());

    let (mut parts, _) = next.run(req).await.into_parts();
    parts.status = StatusCode::OK;
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from("{}"))
}
