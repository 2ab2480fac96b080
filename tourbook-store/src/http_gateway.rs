//! HTTP client for the activity supplier, voucher and payment endpoints.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tourbook_core::payment::{CheckoutData, PaymentGateway, PaymentIntentRequest};
use tourbook_core::supplier::{
    ApiEnvelope, AvailabilityRequest, CreateOrderRequest, CreatedOrder, ExtraInfoData,
    OrderRecord, SupplierGateway,
};
use tourbook_core::voucher::{VoucherData, VoucherGateway, VoucherRequest};
use tourbook_core::{GatewayError, NetworkError};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct SupplierHttpClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl SupplierHttpClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and reads the supplier envelope.
    ///
    /// Failure envelopes come back with 4xx statuses too, so the body is parsed
    /// before the status is considered.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiEnvelope<T>, GatewayError> {
        let request = match &self.api_key {
            Some(key) => request.header("X-Api-Key", key),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Network(NetworkError::Timeout)
            } else {
                GatewayError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        match serde_json::from_str::<ApiEnvelope<T>>(&body) {
            Ok(envelope) => {
                debug!(status = status.as_u16(), success = envelope.success, "Supplier response");
                Ok(envelope)
            }
            Err(e) if status.is_success() => Err(GatewayError::Decode(e.to_string())),
            Err(_) => {
                warn!(status = status.as_u16(), "Supplier returned a non-envelope error");
                Err(GatewayError::Transport(format!("status {}: {}", status.as_u16(), body)))
            }
        }
    }
}

#[async_trait]
impl SupplierGateway for SupplierHttpClient {
    async fn check_availability(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<ApiEnvelope<Value>, GatewayError> {
        self.send(self.client.post(self.url("/availability")).json(request))
            .await
    }

    async fn fetch_extra_info(
        &self,
        package_id: u64,
    ) -> Result<ApiEnvelope<ExtraInfoData>, GatewayError> {
        self.send(self.client.get(self.url(&format!("/otherinfo/{}", package_id))))
            .await
    }

    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<ApiEnvelope<CreatedOrder>, GatewayError> {
        self.send(self.client.post(self.url("/orders")).json(request))
            .await
    }

    async fn fetch_order(&self, order_no: &str) -> Result<ApiEnvelope<OrderRecord>, GatewayError> {
        self.send(self.client.get(self.url(&format!("/orders/{}", order_no))))
            .await
    }
}

#[async_trait]
impl VoucherGateway for SupplierHttpClient {
    async fn apply_voucher(
        &self,
        request: &VoucherRequest,
    ) -> Result<ApiEnvelope<VoucherData>, GatewayError> {
        self.send(self.client.post(self.url("/vouchers/apply")).json(request))
            .await
    }
}

#[async_trait]
impl PaymentGateway for SupplierHttpClient {
    async fn create_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<ApiEnvelope<CheckoutData>, GatewayError> {
        self.send(self.client.post(self.url("/payments/intents")).json(request))
            .await
    }
}
