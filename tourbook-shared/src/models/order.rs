use serde::{Deserialize, Serialize};

/// A supplier order as returned by the order lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Client-generated idempotency key
    pub agent_order_id: String,
    /// Supplier-assigned order number, canonical once known
    pub klook_order_no: String,
    pub confirm_status: String,
    pub transaction_status: String,
    /// Supplier total, before markup
    pub total_amount: f64,
    pub currency: String,
    #[serde(default)]
    pub bookings: Vec<serde_json::Value>,
    #[serde(default)]
    pub skus: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentIntent {
    pub order_id: String,
    pub agent_order_id: String,
    pub amount: f64,
    pub currency: String,
    pub checkout_url: String,
}
