//! HTTP error responses and request extractors

use std::net::SocketAddr;

use axum::extract::connect_info::ConnectInfo;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::DeckError;

/// Header carrying the session credential
pub const SESSION_HEADER: &str = "X-Session-ID";

/// API error response: `{"error": message}` with a status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<DeckError> for ApiError {
    fn from(err: DeckError) -> Self {
        let status = match &err {
            DeckError::NotFound { .. }
            | DeckError::NoDefaultConfigured
            | DeckError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            DeckError::MissingParameter(_)
            | DeckError::InvalidParameterType { .. }
            | DeckError::UnknownAction(_)
            | DeckError::MissingSessionHeader
            | DeckError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DeckError::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
            DeckError::Upstream(_) | DeckError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", err);
        } else {
            debug!("Request rejected: {}", err);
        }

        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Bad request body: {}", rejection.body_text());
        Self::new(StatusCode::BAD_REQUEST, "invalid request body")
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: &self.message })).into_response()
    }
}

/// Value of the `X-Session-ID` header
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| SessionId(v.to_string()))
            .ok_or_else(|| DeckError::MissingSessionHeader.into())
    }
}

/// Caller address: `X-Forwarded-For` (first hop), `X-Real-IP`, then the peer
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl ClientIp {
    fn from_headers(headers: &HeaderMap) -> Option<String> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        if let Some(forwarded) = header("x-forwarded-for") {
            let first = forwarded.split(',').next().unwrap_or(forwarded).trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
        header("x-real-ip").map(str::to_string)
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = Self::from_headers(&parts.headers)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ClientIp(ip))
    }
}
