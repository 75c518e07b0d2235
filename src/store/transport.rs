use crate::core::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Status and decoded body of one completed request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: JsonValue,
}

impl TransportResponse {
    pub fn new(status: u16, body: JsonValue) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Best-effort human message for a failed response.
    pub fn error_message(&self) -> String {
        match &self.body {
            JsonValue::Object(map) => map
                .get("error")
                .and_then(JsonValue::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", self.status)),
            JsonValue::String(text) if !text.is_empty() => text.clone(),
            _ => format!("HTTP {}", self.status),
        }
    }
}

/// Request/response seam between the store and a REST-like collection.
///
/// An `Err` means the request itself failed (connection, timeout, unreadable
/// body). Completed requests return `Ok` whatever their status; deciding what
/// a status means is the store's job.
#[async_trait]
pub trait CollectionTransport: Send + Sync {
    /// Endpoint this transport talks to, for logging.
    fn endpoint(&self) -> &str;

    /// `GET /{endpoint}`
    async fn list(&self) -> Result<TransportResponse>;

    /// `POST /{endpoint}`
    async fn create(&self, body: JsonValue) -> Result<TransportResponse>;

    /// `PUT /{endpoint}/{id}`
    async fn update(&self, id: i64, body: JsonValue) -> Result<TransportResponse>;

    /// `DELETE /{endpoint}/{id}`
    async fn delete(&self, id: i64) -> Result<TransportResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_prefers_error_field() {
        let res = TransportResponse::new(404, json!({"error": "record 9 not found", "code": "not_found"}));
        assert!(!res.is_success());
        assert_eq!(res.error_message(), "record 9 not found");

        let bare = TransportResponse::new(502, JsonValue::Null);
        assert_eq!(bare.error_message(), "HTTP 502");
    }

    #[test]
    fn test_success_range() {
        assert!(TransportResponse::new(201, JsonValue::Null).is_success());
        assert!(TransportResponse::new(204, JsonValue::Null).is_success());
        assert!(!TransportResponse::new(302, JsonValue::Null).is_success());
    }
}
