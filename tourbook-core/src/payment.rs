use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;
use crate::supplier::ApiEnvelope;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentIntentRequest {
    /// Supplier order number
    pub order_id: String,
    pub agent_order_id: String,
    /// Amount charged to the customer, markup and discount applied
    pub amount: f64,
    pub currency: String,
    pub customer_email: String,
    pub customer_name: String,
    pub booking_data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutData {
    pub checkout_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout for a confirmed order
    async fn create_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<ApiEnvelope<CheckoutData>, GatewayError>;
}
