//! HTTP implementation of [`TargetClient`] over the POS REST API.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;

use crate::{OrderSpec, TargetClient, TargetError};

/// POS API client authenticating with basic auth (api key + secret).
///
/// This is the only place in the workspace holding a write-capable
/// credential.
pub struct HttpTargetClient {
    http: reqwest::Client,
    base_url: String,
    auth_header: String,
}

#[derive(Deserialize)]
struct OrderListResponse {
    objects: Vec<OrderRef>,
}

#[derive(Deserialize)]
struct OrderRef {
    #[allow(dead_code)]
    id: serde_json::Value,
}

#[derive(Deserialize)]
struct CreatedOrder {
    id: serde_json::Value,
}

impl HttpTargetClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: &str,
        api_secret: &str,
    ) -> Self {
        let token = BASE64.encode(format!("{api_key}:{api_secret}"));
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_header: format!("Basic {token}"),
        }
    }

    fn classify_transport(err: reqwest::Error) -> TargetError {
        if err.is_decode() {
            TargetError::Decode(err.to_string())
        } else {
            TargetError::Transport(err.to_string())
        }
    }

    async fn error_from(resp: reqwest::Response) -> TargetError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        TargetError::Api {
            status,
            message: body.chars().take(200).collect(),
        }
    }
}

#[async_trait::async_trait]
impl TargetClient for HttpTargetClient {
    fn name(&self) -> &'static str {
        "target-http"
    }

    async fn find_by_external_ref(
        &self,
        establishment: &str,
        external_ref: &str,
    ) -> Result<bool, TargetError> {
        let url = format!("{}/api/orders/", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("Authorization", &self.auth_header)
            .query(&[
                ("establishment", establishment),
                ("external_order_id", external_ref),
            ])
            .send()
            .await
            .map_err(Self::classify_transport)?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        let list: OrderListResponse = resp.json().await.map_err(Self::classify_transport)?;
        Ok(!list.objects.is_empty())
    }

    async fn create_order(&self, spec: &OrderSpec) -> Result<String, TargetError> {
        let url = format!("{}/api/orders/", self.base_url);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", &self.auth_header)
            .json(spec)
            .send()
            .await
            .map_err(Self::classify_transport)?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        let created: CreatedOrder = resp.json().await.map_err(Self::classify_transport)?;
        let order_ref = match created.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(order_ref)
    }
}
