use std::sync::Arc;
use std::time::Duration;

use tourbook_catalog::PricingEngine;
use tourbook_core::repository::{save_record, BOOKING_SUMMARY, PENDING_BOOKING};
use tourbook_core::voucher::{VoucherGateway, VoucherRequest, ACTIVITY_SERVICE_TYPE};
use tourbook_core::{CallContext, DraftStore, StoreError, VoucherError};
use tourbook_shared::BookingDraft;
use tracing::{debug, info};

use crate::models::VOUCHER_DEADLINE;

/// Applies discount codes to the pending draft.
///
/// `voucher_applied` on the draft is the idempotency guard: once set, `apply`
/// returns the stored discount without calling the voucher endpoint again.
#[derive(Clone)]
pub struct VoucherService {
    gateway: Arc<dyn VoucherGateway>,
    store: Arc<dyn DraftStore>,
    engine: PricingEngine,
    deadline: Duration,
}

impl VoucherService {
    pub fn new(
        gateway: Arc<dyn VoucherGateway>,
        store: Arc<dyn DraftStore>,
        engine: PricingEngine,
    ) -> Self {
        Self {
            gateway,
            store,
            engine,
            deadline: VOUCHER_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub async fn apply(
        &self,
        ctx: &CallContext,
        code: &str,
        draft: &mut BookingDraft,
    ) -> Result<f64, VoucherError> {
        if draft.voucher_applied {
            debug!(code = ?draft.voucher_code, "Voucher already applied");
            return Ok(draft.discount);
        }

        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(VoucherError::InvalidCode(
                "Please enter a voucher code.".to_string(),
            ));
        }

        let request = VoucherRequest {
            code: code.clone(),
            service_type: ACTIVITY_SERVICE_TYPE.to_string(),
            service_id: draft.activity_id,
            total: self.engine.subtotal(
                draft.schedule.price,
                draft.adult_quantity,
                draft.child_quantity,
            ),
        };
        let envelope = ctx
            .run(self.deadline, async {
                self.gateway
                    .apply_voucher(&request)
                    .await
                    .map_err(VoucherError::from)
            })
            .await?;

        let amount = match envelope.data.as_ref().map(|d| d.amount) {
            Some(amount) if envelope.success && amount > 0.0 => amount,
            _ => return Err(VoucherError::InvalidCode(envelope.error_message())),
        };

        ctx.ensure_live()?;
        let mut updated = draft.clone();
        updated.discount = amount;
        updated.voucher_code = Some(code);
        updated.voucher_applied = true;
        self.engine.recompute(&mut updated);
        self.persist(&updated).await?;

        info!(
            activity_id = updated.activity_id,
            discount = amount,
            total_price = updated.total_price,
            "Voucher applied"
        );
        *draft = updated;
        Ok(amount)
    }

    /// Drop the voucher and restore the undiscounted total
    pub async fn remove(&self, draft: &mut BookingDraft) -> Result<(), StoreError> {
        if !draft.voucher_applied && draft.voucher_code.is_none() && draft.discount == 0.0 {
            return Ok(());
        }
        let mut updated = draft.clone();
        updated.discount = 0.0;
        updated.voucher_code = None;
        updated.voucher_applied = false;
        self.engine.recompute(&mut updated);
        self.persist(&updated).await?;

        info!(activity_id = updated.activity_id, "Voucher removed");
        *draft = updated;
        Ok(())
    }

    async fn persist(&self, draft: &BookingDraft) -> Result<(), StoreError> {
        save_record(self.store.as_ref(), PENDING_BOOKING, draft).await?;
        save_record(self.store.as_ref(), BOOKING_SUMMARY, &draft.summary()).await
    }
}
