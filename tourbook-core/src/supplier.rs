use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tourbook_shared::Order;

use crate::error::GatewayError;

/// Response wrapper used by every supplier endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(deserialize_with = "code_as_string")]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

// Supplier error codes arrive as either "1103" or 1103.
fn code_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected error code {other}"))),
    }
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn failure(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
            error: Some(ApiErrorBody {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }

    /// Best human-readable failure text: the error body first, then the top-level message
    pub fn error_message(&self) -> String {
        self.error
            .as_ref()
            .map(|e| e.message.clone())
            .filter(|m| !m.is_empty())
            .or_else(|| self.message.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkuLine {
    pub sku_id: u64,
    pub count: u32,
    /// Supplier base price per unit, before markup
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityRequest {
    pub package_id: u64,
    /// `YYYY-MM-DD HH:MM:SS`
    pub start_time: String,
    pub sku_list: Vec<SkuLine>,
}

/// A booking field the package asks for (pickup location, hotel name, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtraInfoField {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub input_type: String,
    #[serde(default)]
    pub options: Option<Vec<Value>>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtraInfoItem {
    #[serde(default)]
    pub booking_extra_info: Vec<ExtraInfoField>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtraInfoData {
    #[serde(default)]
    pub items: Vec<ExtraInfoItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtraInfoEntry {
    pub key: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub country: String,
    pub passport_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemRequest {
    pub package_id: u64,
    pub start_time: String,
    pub sku_list: Vec<SkuLine>,
    pub booking_extra_info: Vec<ExtraInfoEntry>,
    #[serde(default)]
    pub unit_extra_info: Vec<ExtraInfoEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateOrderRequest {
    pub agent_order_id: String,
    pub contact_info: OrderContact,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedOrder {
    pub klook_order_no: String,
}

/// Order lookup payload as the supplier sends it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRecord {
    pub klktech_order_id: String,
    pub agent_order_id: String,
    #[serde(default)]
    pub confirm_status: String,
    #[serde(default)]
    pub transaction_status: String,
    pub total_amount: f64,
    pub currency: String,
    #[serde(default)]
    pub bookings: Vec<Value>,
    #[serde(default)]
    pub skus: Vec<Value>,
}

impl From<OrderRecord> for Order {
    fn from(record: OrderRecord) -> Self {
        Order {
            agent_order_id: record.agent_order_id,
            klook_order_no: record.klktech_order_id,
            confirm_status: record.confirm_status,
            transaction_status: record.transaction_status,
            total_amount: record.total_amount,
            currency: record.currency,
            bookings: record.bookings,
            skus: record.skus,
        }
    }
}

/// Activity supplier endpoints used by the booking flow
#[async_trait]
pub trait SupplierGateway: Send + Sync {
    async fn check_availability(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<ApiEnvelope<Value>, GatewayError>;

    async fn fetch_extra_info(
        &self,
        package_id: u64,
    ) -> Result<ApiEnvelope<ExtraInfoData>, GatewayError>;

    /// Must be idempotent per `agent_order_id`
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<ApiEnvelope<CreatedOrder>, GatewayError>;

    async fn fetch_order(&self, order_no: &str) -> Result<ApiEnvelope<OrderRecord>, GatewayError>;
}
