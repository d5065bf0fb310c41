//! HTTP transport seam for the Graph API.
//!
//! The core only ever talks to the API through the [`Transport`] trait, so
//! tests (and alternative tenants) can swap in their own implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// One logical sub-request inside a batched call.
///
/// The `id` is echoed back by the server on the matching sub-response, which
/// is what lets the resolver correlate results without relying on ordering.
#[derive(Debug, Clone, Serialize)]
pub struct SubRequest {
    pub id: String,
    pub method: &'static str,
    pub url: String,
}

impl SubRequest {
    pub fn get(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: "GET",
            url: url.into(),
        }
    }
}

/// One sub-response from a batched call, correlated by `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubResponse {
    pub id: String,
    pub status: u16,
    #[serde(default)]
    pub body: Value,
}

impl SubResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Authenticated read access to the management API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a resource path relative to the API base URL.
    async fn get(&self, path: &str) -> Result<Value>;

    /// Execute one batched call carrying the given sub-requests.
    ///
    /// Implementations must not split or merge the slice; chunking to the
    /// server's batch-size limit is the caller's job.
    async fn batch(&self, requests: &[SubRequest]) -> Result<Vec<SubResponse>>;
}

/// reqwest-backed [`Transport`] for Microsoft Graph.
///
/// The bearer token is installed as a default header at construction; the
/// client never mutates it afterwards. No retries at this layer - callers
/// decide whether a failed run is worth repeating.
pub struct GraphTransport {
    client: reqwest::Client,
    base_url: String,
}

impl GraphTransport {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        // Malformed base URLs fail at construction, not mid-run.
        url::Url::parse(base_url)?;

        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth: reqwest::header::HeaderValue = format!("Bearer {}", token).parse()?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_body(endpoint: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Auth {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UnexpectedResponse {
                endpoint: endpoint.to_string(),
                reason: format!("HTTP {}: {}", status, body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::UnexpectedResponse {
                endpoint: endpoint.to_string(),
                reason: format!("invalid JSON body: {}", e),
            })
    }
}

#[async_trait]
impl Transport for GraphTransport {
    async fn get(&self, path: &str) -> Result<Value> {
        let response = self.client.get(self.url_for(path)).send().await?;
        Self::read_body(path, response).await
    }

    async fn batch(&self, requests: &[SubRequest]) -> Result<Vec<SubResponse>> {
        let body = serde_json::json!({ "requests": requests });
        let response = self
            .client
            .post(self.url_for("$batch"))
            .json(&body)
            .send()
            .await?;

        let envelope = Self::read_body("$batch", response).await?;
        parse_batch_envelope(envelope)
    }
}

/// Pull the correlated sub-responses out of a batch envelope.
fn parse_batch_envelope(envelope: Value) -> Result<Vec<SubResponse>> {
    let responses = envelope
        .get("responses")
        .cloned()
        .ok_or_else(|| Error::UnexpectedResponse {
            endpoint: "$batch".to_string(),
            reason: "missing top-level `responses` array".to_string(),
        })?;

    serde_json::from_value(responses).map_err(|e| Error::UnexpectedResponse {
        endpoint: "$batch".to_string(),
        reason: format!("malformed sub-response: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sub_request_wire_shape() {
        let req = SubRequest::get("42", "/deviceAppManagement/managedAppPolicies/42/assignments");
        let wire = serde_json::to_value(&req).unwrap();

        assert_eq!(wire["id"], "42");
        assert_eq!(wire["method"], "GET");
        assert_eq!(
            wire["url"],
            "/deviceAppManagement/managedAppPolicies/42/assignments"
        );
    }

    #[test]
    fn test_parse_batch_envelope() {
        let envelope = json!({
            "responses": [
                { "id": "1", "status": 200, "body": { "value": [] } },
                { "id": "2", "status": 404, "body": { "error": { "code": "NotFound" } } }
            ]
        });

        let responses = parse_batch_envelope(envelope).unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, "1");
        assert!(responses[0].is_success());
        assert_eq!(responses[1].id, "2");
        assert!(!responses[1].is_success());
    }

    #[test]
    fn test_parse_batch_envelope_missing_responses() {
        let result = parse_batch_envelope(json!({ "value": [] }));
        assert!(matches!(
            result,
            Err(Error::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn test_sub_response_body_defaults_to_null() {
        let resp: SubResponse = serde_json::from_value(json!({ "id": "7", "status": 204 })).unwrap();
        assert_eq!(resp.body, Value::Null);
    }

    #[test]
    fn test_transport_url_join() {
        let transport = GraphTransport::new("https://graph.microsoft.com/beta/", "token").unwrap();
        assert_eq!(
            transport.url_for("/deviceAppManagement/managedAppPolicies"),
            "https://graph.microsoft.com/beta/deviceAppManagement/managedAppPolicies"
        );
        assert_eq!(
            transport.url_for("$batch"),
            "https://graph.microsoft.com/beta/$batch"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(GraphTransport::new("not a url", "token").is_err());
    }
}
