// Reference HTTP backend speaking the JSON config-gateway protocol.
//
// Wraps `reqwest::Client` with gateway URL construction, envelope
// unwrapping, and connectivity/semantic classification. Every config
// operation is a POST to `/api/config` carrying an action verb, the
// resolved xpath, and (for mutations) the element payload.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::backend::{ConfigBackend, RawPayload};
use crate::error::ApiError;
use crate::transport::TransportConfig;

/// HTTP client for an appliance's JSON config gateway.
///
/// Handles the `{ status, result, code, message }` envelope; the envelope
/// is stripped before callers see the payload. Authentication is a static
/// `X-API-KEY` header; session negotiation is out of scope.
pub struct HttpBackend {
    http: reqwest::Client,
    endpoint: Url,
}

#[derive(Serialize)]
struct GatewayRequest<'a> {
    action: &'a str,
    xpath: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    element: Option<&'a RawPayload>,
}

#[derive(Deserialize)]
struct GatewayResponse {
    status: String,
    #[serde(default)]
    result: Option<RawPayload>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl HttpBackend {
    /// Create a backend from a base URL and API key.
    pub fn new(
        base_url: &Url,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|_| ApiError::Authentication {
                message: "API key contains non-header characters".into(),
            })?;
        key.set_sensitive(true);
        headers.insert("X-API-KEY", key);

        let http = transport.build_client(headers)?;
        let endpoint = base_url.join("api/config")?;
        Ok(Self { http, endpoint })
    }

    /// Create a backend with a pre-built `reqwest::Client` (tests).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, ApiError> {
        let endpoint = Url::parse(base_url)?.join("api/config")?;
        Ok(Self { http, endpoint })
    }

    /// Issue one gateway request and unwrap the envelope.
    async fn request(
        &self,
        action: &str,
        xpath: &str,
        element: Option<&RawPayload>,
    ) -> Result<Option<RawPayload>, ApiError> {
        debug!(action, xpath, "config gateway request");

        let body = GatewayRequest {
            action,
            xpath,
            element,
        };

        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(ApiError::Transport)?;

        let status = resp.status();
        let text = resp.text().await.map_err(ApiError::Transport)?;

        // Gateway-level failures before any envelope exists.
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ApiError::Authentication {
                    message: format!("gateway returned {status}"),
                });
            }
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                return Err(ApiError::Connectivity {
                    message: format!("gateway returned {status}"),
                });
            }
            _ => {}
        }

        let envelope: GatewayResponse =
            serde_json::from_str(&text).map_err(|e| ApiError::Deserialization {
                message: e.to_string(),
                body: text.clone(),
            })?;

        match envelope.status.as_str() {
            "success" => Ok(envelope.result),
            _ => Err(ApiError::Semantic {
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("gateway status={}", envelope.status)),
                code: envelope.code,
            }),
        }
    }
}

#[async_trait]
impl ConfigBackend for HttpBackend {
    async fn get(&self, path: &str) -> Result<Option<RawPayload>, ApiError> {
        match self.request("get", path, None).await {
            Ok(result) => Ok(result),
            // Appliance code 7: no object at this xpath.
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set(&self, path: &str, payload: &RawPayload) -> Result<(), ApiError> {
        self.request("set", path, Some(payload)).await.map(|_| ())
    }

    async fn edit(&self, path: &str, payload: &RawPayload) -> Result<(), ApiError> {
        self.request("edit", path, Some(payload)).await.map(|_| ())
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request("delete", path, None).await.map(|_| ())
    }
}
