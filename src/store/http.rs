use super::transport::{CollectionTransport, TransportResponse};
use crate::config::ClientConfig;
use crate::core::{GridError, Result};
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// reqwest-backed transport for one collection endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    collection_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig, endpoint: &str) -> Result<Self> {
        config.validate().map_err(GridError::Config)?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_matches('/').to_string(),
            collection_url: config.collection_url(endpoint),
        })
    }

    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/{}", self.collection_url, id)
    }

    async fn finish(response: reqwest::Response) -> Result<TransportResponse> {
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            // Error pages are often plain text; keep them readable instead of failing.
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Ok(TransportResponse::new(status, body))
    }
}

#[async_trait]
impl CollectionTransport for HttpTransport {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list(&self) -> Result<TransportResponse> {
        let response = self.client.get(&self.collection_url).send().await?;
        Self::finish(response).await
    }

    async fn create(&self, body: JsonValue) -> Result<TransportResponse> {
        let response = self
            .client
            .post(&self.collection_url)
            .json(&body)
            .send()
            .await?;
        Self::finish(response).await
    }

    async fn update(&self, id: i64, body: JsonValue) -> Result<TransportResponse> {
        let response = self.client.put(self.item_url(id)).json(&body).send().await?;
        Self::finish(response).await
    }

    async fn delete(&self, id: i64) -> Result<TransportResponse> {
        let response = self.client.delete(self.item_url(id)).send().await?;
        Self::finish(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_follow_rest_layout() {
        let config = ClientConfig::new("http://localhost:3000/api");
        let transport = HttpTransport::new(&config, "/users").unwrap();
        assert_eq!(transport.collection_url(), "http://localhost:3000/api/users");
        assert_eq!(transport.item_url(7), "http://localhost:3000/api/users/7");
        assert_eq!(transport.endpoint(), "users");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ClientConfig::new("localhost:3000");
        assert!(matches!(
            HttpTransport::new(&config, "users"),
            Err(GridError::Config(_))
        ));
    }
}
