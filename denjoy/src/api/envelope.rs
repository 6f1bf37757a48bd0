//! The JSON envelope every endpoint answers with.
//!
//! Success: `{ "success": true, "request_id": "...", ...payload }`.
//! Failure: `{ "success": false, "error_code": "...", "error": "...", "request_id": "..." }`.
//!
//! The request id is whatever the request-id layer put in `x-request-id`, so the body and the
//! response header always agree.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use std::convert::Infallible;
use utoipa::ToSchema;

use crate::errors::Error;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id of the current request, read from `x-request-id`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestId(pub Option<String>);

impl RequestId {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self(
            headers
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        )
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn error(&self, error: Error) -> ApiError {
        ApiError {
            error,
            request_id: self.0.clone(),
        }
    }

    /// Wrap a handler result into a 200 envelope
    pub fn wrap<T>(self, result: Result<T, Error>) -> ApiResult<T> {
        self.wrap_with(StatusCode::OK, result)
    }

    pub fn wrap_with<T>(self, status: StatusCode, result: Result<T, Error>) -> ApiResult<T> {
        match result {
            Ok(payload) => Ok(Envelope {
                status,
                request_id: self.0,
                payload,
            }),
            Err(error) => Err(ApiError {
                error,
                request_id: self.0,
            }),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Successful response: payload fields flattened next to `success` and `request_id`
#[derive(Debug)]
pub struct Envelope<T> {
    pub status: StatusCode,
    pub request_id: Option<String>,
    pub payload: T,
}

#[derive(Serialize)]
struct SuccessBody<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<&'a str>,
    #[serde(flatten)]
    payload: &'a T,
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let body = SuccessBody {
            success: true,
            request_id: self.request_id.as_deref(),
            payload: &self.payload,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Failed response carrying the request id
#[derive(Debug)]
pub struct ApiError {
    pub error: Error,
    pub request_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.error.into_response_with(self.request_id)
    }
}

pub type ApiResult<T> = Result<Envelope<T>, ApiError>;

/// Payload of endpoints that only acknowledge
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct Acknowledged {}

/// `Json` extractor whose rejections use the error envelope
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

fn json_rejection(rejection: JsonRejection) -> Error {
    match rejection {
        JsonRejection::JsonSyntaxError(e) => Error::InvalidJson { message: e.body_text() },
        JsonRejection::MissingJsonContentType(_) => Error::InvalidJson {
            message: "Expected request with `Content-Type: application/json`".to_string(),
        },
        JsonRejection::JsonDataError(e) => Error::InvalidInput { message: e.body_text() },
        other => Error::InvalidInput { message: other.body_text() },
    }
}

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = RequestId::from_headers(req.headers());
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(request_id.error(json_rejection(rejection))),
        }
    }
}

/// `Query` extractor whose rejections use the error envelope
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => {
                let rejection: QueryRejection = rejection;
                Err(RequestId::from_headers(&parts.headers).error(Error::InvalidInput {
                    message: rejection.body_text(),
                }))
            }
        }
    }
}

/// `Path` extractor whose rejections use the error envelope
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => {
                let rejection: PathRejection = rejection;
                Err(RequestId::from_headers(&parts.headers).error(Error::InvalidInput {
                    message: rejection.body_text(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{Value, json};

    #[derive(Serialize)]
    struct Payload {
        inquiry_id: &'static str,
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_success_envelope_flattens_payload() {
        let request_id = RequestId(Some("req-1".to_string()));
        let response = request_id
            .wrap_with(StatusCode::CREATED, Ok(Payload { inquiry_id: "abc" }))
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(response).await,
            json!({ "success": true, "request_id": "req-1", "inquiry_id": "abc" })
        );
    }

    #[tokio::test]
    async fn test_error_envelope_carries_request_id() {
        let request_id = RequestId(Some("req-2".to_string()));
        let response = request_id.wrap::<Acknowledged>(Err(Error::InvalidEmail)).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({
                "success": false,
                "error_code": "invalid_email",
                "error": "Invalid email address",
                "request_id": "req-2"
            })
        );
    }

    #[test]
    fn test_request_id_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(RequestId::from_headers(&headers), RequestId(None));
        headers.insert(REQUEST_ID_HEADER, "abc".parse().unwrap());
        assert_eq!(RequestId::from_headers(&headers).as_deref(), Some("abc"));
    }
}
