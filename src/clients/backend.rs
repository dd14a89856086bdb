//! HTTP client for the order backend.
//!
//! Both endpoints are plain GETs: order creation carries the JSON-encoded
//! payload in a query parameter alongside the fixed credentials, and the
//! payment-status query returns a body of uncertain shape that is normalized
//! downstream.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, instrument};
use url::Url;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::models::{CreateOrderResponse, OrderRequest};

/// Seam between the checkout engine and the remote order system. Tests
/// substitute a scripted implementation; production uses [`HttpOrderBackend`].
#[async_trait]
pub trait OrderBackend: Send + Sync {
    /// Submits one order and returns the backend's raw creation response.
    /// Validation of the returned identifier is the orchestrator's job.
    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<CreateOrderResponse, ServiceError>;

    /// Fetches the raw payment-status body for one order. The body is not
    /// guaranteed to be valid JSON.
    async fn payment_status(&self, order_id: i64) -> Result<String, ServiceError>;
}

pub struct HttpOrderBackend {
    client: Client,
    base_url: Url,
    connection_token: String,
    access_key: String,
    provider_id: i64,
    user_id: i64,
}

impl HttpOrderBackend {
    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| {
                ServiceError::ConfigError(format!("Failed to build HTTP client: {}", e))
            })?;
        let base_url = Url::parse(&config.backend_base_url)
            .map_err(|e| ServiceError::ConfigError(format!("Invalid backend base URL: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            connection_token: config.connection_token.clone(),
            access_key: config.access_key.clone(),
            provider_id: config.provider_id,
            user_id: config.user_id,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::InternalError(format!("Invalid endpoint path: {}", e)))
    }
}

#[async_trait]
impl OrderBackend for HttpOrderBackend {
    #[instrument(skip(self, request), fields(service_id = request.service_id))]
    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<CreateOrderResponse, ServiceError> {
        let payload = serde_json::to_string(request)?;
        let mut url = self.endpoint("orders/create")?;
        url.query_pairs_mut()
            .append_pair("connection_token", &self.connection_token)
            .append_pair("access_key", &self.access_key)
            .append_pair("provider_id", &self.provider_id.to_string())
            .append_pair("user_id", &self.user_id.to_string())
            .append_pair("order", &payload);

        let response = self.client.get(url).send().await.map_err(|e| {
            error!(error = %e, service_id = request.service_id, "Order creation request failed");
            ServiceError::ExternalServiceError(format!("Order creation request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, service_id = request.service_id, "Order creation returned error status");
            return Err(ServiceError::OrderError(format!(
                "Order creation returned status {}",
                status
            )));
        }

        response.json::<CreateOrderResponse>().await.map_err(|e| {
            error!(error = %e, "Failed to parse order creation response");
            ServiceError::OrderError(format!("Unreadable order creation response: {}", e))
        })
    }

    #[instrument(skip(self), fields(order_id = order_id))]
    async fn payment_status(&self, order_id: i64) -> Result<String, ServiceError> {
        let mut url = self.endpoint("orders/payment-status")?;
        url.query_pairs_mut()
            .append_pair("order_id", &order_id.to_string());

        let response = self.client.get(url).send().await.map_err(|e| {
            ServiceError::ExternalApiError(format!("Payment status request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::ExternalApiError(format!(
                "Payment status query returned status {}",
                status
            )));
        }

        response.text().await.map_err(|e| {
            ServiceError::ExternalApiError(format!("Unreadable payment status body: {}", e))
        })
    }
}
