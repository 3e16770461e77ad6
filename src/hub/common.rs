//! Common types for HTTP responses and errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// API error response
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        ApiError {
            error: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiError::new(message)))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// Resolution request parameters, from the query string or a JSON body
#[derive(Debug, Default, Deserialize)]
pub struct ResolveParams {
    /// GitHub owner of the gateway list
    pub owner: Option<String>,
    /// GitHub repository of the gateway list
    pub repo: Option<String>,
    /// Response format (json, ips, azure)
    pub format: Option<String>,
}

impl ResolveParams {
    /// Body values win over query values; an unparsable body is ignored
    pub fn overridden_by_body(self, body: &[u8]) -> Self {
        match serde_json::from_slice::<ResolveParams>(body) {
            Ok(from_body) => ResolveParams {
                owner: from_body.owner.or(self.owner),
                repo: from_body.repo.or(self.repo),
                format: from_body.format.or(self.format),
            },
            Err(_) => self,
        }
    }
}

/// Shape of a resolution response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Full JSON report
    Json,
    /// Plain-text IP list
    Ips,
    /// Azure IP group body
    Azure,
}

impl ResponseFormat {
    /// Unknown names fall back to the full report
    pub fn parse(name: Option<&str>) -> Self {
        match name {
            Some("ips") => ResponseFormat::Ips,
            Some("azure") => ResponseFormat::Azure,
            _ => ResponseFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error() {
        let err = ApiError::new("test error");
        assert_eq!(err.error, "test error");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"error": "test error"})
        );
    }

    #[test]
    fn test_body_overrides_query() {
        let query = ResolveParams {
            owner: Some("query-owner".to_string()),
            repo: Some("query-repo".to_string()),
            format: None,
        };
        let params = query.overridden_by_body(br#"{"owner": "body-owner", "format": "ips"}"#);
        assert_eq!(params.owner.as_deref(), Some("body-owner"));
        assert_eq!(params.repo.as_deref(), Some("query-repo"));
        assert_eq!(params.format.as_deref(), Some("ips"));
    }

    #[test]
    fn test_invalid_body_ignored() {
        let query = ResolveParams {
            owner: Some("query-owner".to_string()),
            ..Default::default()
        };
        let params = query.overridden_by_body(b"not json");
        assert_eq!(params.owner.as_deref(), Some("query-owner"));

        let params = ResolveParams::default().overridden_by_body(b"");
        assert!(params.owner.is_none());
    }

    #[test]
    fn test_response_format() {
        assert_eq!(ResponseFormat::parse(Some("ips")), ResponseFormat::Ips);
        assert_eq!(ResponseFormat::parse(Some("azure")), ResponseFormat::Azure);
        assert_eq!(ResponseFormat::parse(Some("bicep")), ResponseFormat::Json);
        assert_eq!(ResponseFormat::parse(None), ResponseFormat::Json);
    }
}
