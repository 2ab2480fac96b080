use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::supplier::ApiEnvelope;

pub const ACTIVITY_SERVICE_TYPE: &str = "activity";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoucherRequest {
    /// Trimmed and upper-cased
    pub code: String,
    pub service_type: String,
    pub service_id: u64,
    /// Pre-discount total the voucher is checked against
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoucherData {
    pub amount: f64,
}

#[async_trait]
pub trait VoucherGateway: Send + Sync {
    async fn apply_voucher(
        &self,
        request: &VoucherRequest,
    ) -> Result<ApiEnvelope<VoucherData>, GatewayError>;
}
