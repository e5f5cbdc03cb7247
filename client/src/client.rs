//! Marketplace admin REST client implementation

use crate::config::ClientConfig;
use crate::error::ClientError;
use order_lifecycle::{
    AdminBackend, BackendResult, OrderId, OrderPage, OrderQuery, OrderStatus, Payment, PaymentId,
    PaymentPage, PaymentQuery, StatusEcho,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// `PUT /status` answers with the updated order, bare or wrapped
#[derive(Deserialize)]
#[serde(untagged)]
enum StatusEnvelope {
    Wrapped { order: StatusEcho },
    Bare(StatusEcho),
}

/// `GET /payments/{id}` answers with the payment, bare or wrapped
#[derive(Deserialize)]
#[serde(untagged)]
enum PaymentEnvelope {
    Wrapped { payment: Payment },
    Bare(Payment),
}

/// Error body shapes the backend uses
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: String,
}

/// Admin API client
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct AdminClient {
    client: Client,
    config: ClientConfig,
}

impl AdminClient {
    /// Create a client from the `MARKETPLACE_API_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns the configuration error, or `ClientError::InvalidConfig` if
    /// the HTTP client cannot be built
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client with explicit configuration
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidConfig` if the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            status => ClientError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::ResponseParseFailed(e.to_string()))
    }

    /// List one page of orders
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    #[tracing::instrument(skip(self, query), fields(page = query.page))]
    pub async fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage, ClientError> {
        let request = self
            .client
            .get(self.url("/api/admin/orders"))
            .query(&query.to_query_pairs());
        Self::json(self.send(request).await?).await
    }

    /// Request an order status change; returns the status the backend stored
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors (including invalid
    /// transitions), or parsing failures
    #[tracing::instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<StatusEcho, ClientError> {
        let request = self
            .client
            .put(self.url(&format!("/api/admin/orders/{order_id}/status")))
            .json(&StatusEcho { status });

        let envelope: StatusEnvelope = Self::json(self.send(request).await?).await?;
        let echo = match envelope {
            StatusEnvelope::Wrapped { order } => order,
            StatusEnvelope::Bare(echo) => echo,
        };
        if echo.status != status {
            tracing::info!(requested = %status, stored = %echo.status, "Backend stored a different status");
        }
        Ok(echo)
    }

    /// List one page of payments
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    #[tracing::instrument(skip(self, query), fields(page = query.page))]
    pub async fn list_payments(&self, query: &PaymentQuery) -> Result<PaymentPage, ClientError> {
        let request = self
            .client
            .get(self.url("/api/admin/payments"))
            .query(&query.to_query_pairs());
        Self::json(self.send(request).await?).await
    }

    /// Fetch the current snapshot of one payment
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    #[tracing::instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn fetch_payment(&self, payment_id: &PaymentId) -> Result<Payment, ClientError> {
        let request = self
            .client
            .get(self.url(&format!("/api/admin/payments/{payment_id}")));

        let envelope: PaymentEnvelope = Self::json(self.send(request).await?).await?;
        Ok(match envelope {
            PaymentEnvelope::Wrapped { payment } | PaymentEnvelope::Bare(payment) => payment,
        })
    }

    /// Release the held funds of a payment to its freelancer
    ///
    /// Irreversible. Any 2xx response counts as acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or API errors
    #[tracing::instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn release_payment(&self, payment_id: &PaymentId) -> Result<(), ClientError> {
        let request = self
            .client
            .post(self.url(&format!("/api/payments/release/{payment_id}")))
            .json(&serde_json::json!({}));

        self.send(request).await?;
        tracing::info!("Payment released");
        Ok(())
    }
}

impl AdminBackend for AdminClient {
    async fn list_orders(&self, query: &OrderQuery) -> BackendResult<OrderPage> {
        Ok(Self::list_orders(self, query).await?)
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> BackendResult<StatusEcho> {
        Ok(Self::update_order_status(self, order_id, status).await?)
    }

    async fn list_payments(&self, query: &PaymentQuery) -> BackendResult<PaymentPage> {
        Ok(Self::list_payments(self, query).await?)
    }

    async fn fetch_payment(&self, payment_id: &PaymentId) -> BackendResult<Payment> {
        Ok(Self::fetch_payment(self, payment_id).await?)
    }

    async fn release_payment(&self, payment_id: &PaymentId) -> BackendResult<()> {
        Ok(Self::release_payment(self, payment_id).await?)
    }
}
