//! HTTP helpers for Lambda functions.

use lambda_http::http::response::Builder;
use lambda_http::{Body, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Cross-origin and caching headers attached to every response of an endpoint.
#[derive(Debug, Clone, Copy)]
pub struct CorsPolicy {
    pub allow_methods: &'static str,
    pub allow_headers: Option<&'static str>,
    pub cache_control: Option<&'static str>,
}

impl CorsPolicy {
    /// Read/write endpoints (the practice log).
    pub const READ_WRITE: CorsPolicy = CorsPolicy {
        allow_methods: "GET, POST, OPTIONS",
        allow_headers: Some("Content-Type, Authorization"),
        cache_control: None,
    };

    /// Read-only feed endpoints, cached at the edge for `s-maxage`.
    pub const fn read_only(cache_control: &'static str) -> Self {
        CorsPolicy {
            allow_methods: "GET, OPTIONS",
            allow_headers: None,
            cache_control: Some(cache_control),
        }
    }

    /// Start a response builder with this policy's headers applied.
    pub fn builder(&self, status: u16) -> Builder {
        let mut builder = Response::builder()
            .status(status)
            .header("access-control-allow-origin", "*")
            .header("access-control-allow-methods", self.allow_methods);
        if let Some(headers) = self.allow_headers {
            builder = builder.header("access-control-allow-headers", headers);
        }
        if let Some(cache) = self.cache_control {
            builder = builder.header("cache-control", cache);
        }
        builder
    }
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(
    cors: &CorsPolicy,
    status: u16,
    data: &T,
) -> Result<Response<Body>, lambda_http::Error> {
    Ok(cors
        .builder(status)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(data)?))
        .map_err(Box::new)?)
}

/// Create an error response with the given status code and message.
pub fn error_response(
    cors: &CorsPolicy,
    status: u16,
    message: impl Into<String>,
) -> Result<Response<Body>, lambda_http::Error> {
    json_response(cors, status, &ApiResponse::<()>::error(message))
}

/// Empty-bodied response, used for CORS preflight.
pub fn empty_response(cors: &CorsPolicy, status: u16) -> Result<Response<Body>, lambda_http::Error> {
    Ok(cors.builder(status).body(Body::Empty).map_err(Box::new)?)
}

/// Parse request body as JSON, returning a 400 response on failure.
///
/// Returns `Ok(Ok(T))` on successful parse, `Ok(Err(Response))` on parse error (400),
/// or `Err(lambda_http::Error)` on serialization failure.
pub fn parse_json_body<T: DeserializeOwned>(
    cors: &CorsPolicy,
    body: &Body,
) -> Result<Result<T, Response<Body>>, lambda_http::Error> {
    match serde_json::from_slice(body.as_ref()) {
        Ok(parsed) => Ok(Ok(parsed)),
        Err(e) => {
            let response = error_response(cors, 400, format!("Invalid request body: {}", e))?;
            Ok(Err(response))
        }
    }
}

/// Macro to parse request body, returning early with 400 on parse error.
///
/// Usage:
/// ```ignore
/// let request: MyRequest = parse_body!(&CORS, event.body());
/// ```
#[macro_export]
macro_rules! parse_body {
    ($cors:expr, $body:expr) => {
        match shared::http::parse_json_body($cors, $body)? {
            Ok(parsed) => parsed,
            Err(response) => return Ok(response),
        }
    };
}
