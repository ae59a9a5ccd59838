use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    config::ClientConfig,
    dto::orders::OrderRequest,
    models::{OrderStatus, PaymentStatus},
};

use super::error::SubmitError;

/// Header carrying the per-attempt idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// What the order API hands back for a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_number: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
}

#[automock]
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// Issue exactly one order write. Never retries.
    async fn submit_order(
        &self,
        request: &OrderRequest,
        idempotency_key: Uuid,
    ) -> Result<OrderConfirmation, SubmitError>;
}

/// `OrderApi` over HTTP: `POST {base}/api/orders`.
#[derive(Debug, Clone)]
pub struct HttpOrderApi {
    base_url: String,
    http: Client,
}

impl HttpOrderApi {
    pub fn new(config: &ClientConfig) -> Result<Self, SubmitError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| SubmitError::Network(err.to_string()))?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn orders_url(&self) -> String {
        format!("{}/api/orders", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[async_trait]
impl OrderApi for HttpOrderApi {
    async fn submit_order(
        &self,
        request: &OrderRequest,
        idempotency_key: Uuid,
    ) -> Result<OrderConfirmation, SubmitError> {
        let response = self
            .http
            .post(self.orders_url())
            .header(IDEMPOTENCY_KEY_HEADER, idempotency_key.to_string())
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        let envelope = serde_json::from_str::<Envelope<OrderConfirmation>>(&body);

        if !status.is_success() {
            let message = envelope
                .ok()
                .and_then(|e| e.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback_message(status));
            return Err(SubmitError::ServerRejection {
                status: status.as_u16(),
                message,
            });
        }

        let envelope = envelope.map_err(|err| SubmitError::UnexpectedResponse(err.to_string()))?;
        if !envelope.success {
            return Err(SubmitError::ServerRejection {
                status: status.as_u16(),
                message: envelope.message.unwrap_or_else(|| fallback_message(status)),
            });
        }

        envelope
            .data
            .ok_or_else(|| SubmitError::UnexpectedResponse("response carried no order".into()))
    }
}

fn transport_error(err: reqwest::Error) -> SubmitError {
    if err.is_timeout() {
        SubmitError::Timeout
    } else {
        SubmitError::Network(err.to_string())
    }
}

fn fallback_message(status: StatusCode) -> String {
    format!("order request failed with status {status}")
}
