//! Availability confirmation with price-drift correction.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tourbook_catalog::PricingEngine;
use tourbook_core::repository::{save_record, BOOKING_SUMMARY, PENDING_BOOKING};
use tourbook_core::supplier::{AvailabilityRequest, SkuLine, SupplierGateway};
use tourbook_core::{AvailabilityError, CallContext, DraftStore};
use tourbook_shared::BookingDraft;
use tracing::{info, warn};

use crate::models::SUPPLIER_DEADLINE;

/// Supplier code for a slot that can no longer be booked
pub const SLOT_UNAVAILABLE_CODE: &str = "1103";

pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// The supplier only reports drift in free text, e.g.
// "Price had changed, new price: 42.00".
static PRICE_CHANGED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)price\s+ha[sd]\s+changed.*?new\s+price\D*?(\d+(?:\.\d+)?)")
        .expect("price change pattern")
});

/// New supplier base price announced in a failure message, if any
pub fn parse_price_change(message: &str) -> Option<f64> {
    PRICE_CHANGED
        .captures(message)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn availability_request(draft: &BookingDraft) -> AvailabilityRequest {
    AvailabilityRequest {
        package_id: draft.package_id,
        start_time: draft.schedule.start_time.format(START_TIME_FORMAT).to_string(),
        sku_list: vec![SkuLine {
            sku_id: draft.schedule.sku_id,
            count: draft.participants(),
            price: draft.schedule.original_price,
        }],
    }
}

#[derive(Clone)]
pub struct AvailabilityClient {
    gateway: Arc<dyn SupplierGateway>,
    store: Arc<dyn DraftStore>,
    engine: PricingEngine,
    deadline: Duration,
}

impl AvailabilityClient {
    pub fn new(
        gateway: Arc<dyn SupplierGateway>,
        store: Arc<dyn DraftStore>,
        engine: PricingEngine,
    ) -> Self {
        Self {
            gateway,
            store,
            engine,
            deadline: SUPPLIER_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Confirm the draft's slot is bookable at the recorded price.
    ///
    /// Returns the supplier's availability payload. On price drift the draft is
    /// re-priced and persisted before `PriceChanged` is returned; the caller must
    /// check again before creating an order.
    pub async fn check(
        &self,
        ctx: &CallContext,
        draft: &mut BookingDraft,
    ) -> Result<Option<Value>, AvailabilityError> {
        let request = availability_request(draft);
        let envelope = ctx
            .run(self.deadline, async {
                self.gateway
                    .check_availability(&request)
                    .await
                    .map_err(AvailabilityError::from)
            })
            .await?;

        if envelope.success {
            return Ok(envelope.data);
        }

        let message = envelope.error_message();
        let announced = envelope
            .message
            .as_deref()
            .and_then(parse_price_change)
            .or_else(|| parse_price_change(&message));
        if let Some(new_price) = announced {
            ctx.ensure_live()?;
            let mut corrected = draft.clone();
            self.engine.reprice(&mut corrected, new_price);
            save_record(self.store.as_ref(), PENDING_BOOKING, &corrected).await?;
            save_record(self.store.as_ref(), BOOKING_SUMMARY, &corrected.summary()).await?;
            info!(
                package_id = draft.package_id,
                old_price = draft.schedule.original_price,
                new_price,
                total_price = corrected.total_price,
                "Price drift corrected"
            );
            *draft = corrected;
            return Err(AvailabilityError::PriceChanged { new_price });
        }

        let code = envelope.error_code().unwrap_or_default().to_string();
        warn!(package_id = draft.package_id, code = %code, "Availability rejected");
        if code == SLOT_UNAVAILABLE_CODE {
            Err(AvailabilityError::SlotUnavailable)
        } else {
            Err(AvailabilityError::Other { code, message })
        }
    }
}
