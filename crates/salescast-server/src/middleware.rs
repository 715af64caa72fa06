use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The authenticated principal for this request. Authentication itself
/// happens upstream; the core receives already-authorized calls carrying
/// the owner's id in the `x-owner-id` header.
#[derive(Debug, Clone, Copy)]
pub struct OwnerId(pub Uuid);

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for MiddlewareErrorBody {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is
/// used. Otherwise a new `UUIDv4` is generated. The ID is inserted into
/// request extensions as [`RequestId`] and set on the response as the
/// `x-request-id` header.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);

    request.extensions_mut().insert(RequestId(id.clone()));
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Axum middleware that requires a valid `x-owner-id` header and exposes
/// it as an [`OwnerId`] extension.
pub async fn require_owner(mut request: Request, next: Next) -> Response {
    let owner = request
        .headers()
        .get("x-owner-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Uuid>().ok());

    let Some(owner) = owner else {
        return MiddlewareErrorBody {
            error: MiddlewareError {
                code: "unauthorized",
                message: "missing or invalid x-owner-id header",
            },
        }
        .into_response();
    };

    request.extensions_mut().insert(OwnerId(owner));
    next.run(request).await
}
