//! Order resolution and payment handoff for the confirmation step.
//!
//! At most one supplier order exists per draft. The `agent_order_id` is written
//! to `currentBooking` before the first create call, so a reload or a retry
//! after a lost response resolves the same order instead of creating another.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde_json::json;
use tourbook_catalog::PricingEngine;
use tourbook_core::payment::{PaymentGateway, PaymentIntentRequest};
use tourbook_core::repository::{
    load_record, require_record, save_record, BOOKER_INFO, BOOKING_SUMMARY, CURRENT_BOOKING,
    PENDING_BOOKING,
};
use tourbook_core::supplier::SupplierGateway;
use tourbook_core::{CallContext, DraftStore, OrderError, PaymentError, ValidationErrors};
use tourbook_shared::{
    BookingDraft, BookingSummary, ContactInfo, CurrentBooking, Order, PassengerRecord,
    PaymentIntent,
};
use tracing::{debug, info, warn};

use crate::models::{BookingStep, ConfirmError, SubmitError, SUPPLIER_DEADLINE};
use crate::orchestrator::OrderOrchestrator;
use crate::passenger::PassengerValidator;

/// `TB` + UTC timestamp to the millisecond + 4 random digits
pub fn generate_agent_order_id() -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("TB{}{:04}", Utc::now().format("%Y%m%d%H%M%S%3f"), suffix)
}

pub struct ConfirmationCoordinator {
    supplier: Arc<dyn SupplierGateway>,
    payments: Arc<dyn PaymentGateway>,
    store: Arc<dyn DraftStore>,
    orchestrator: OrderOrchestrator,
    engine: PricingEngine,
    deadline: Duration,
    order: Option<Order>,
}

impl ConfirmationCoordinator {
    pub fn new(
        supplier: Arc<dyn SupplierGateway>,
        payments: Arc<dyn PaymentGateway>,
        store: Arc<dyn DraftStore>,
        engine: PricingEngine,
        default_pickup: impl Into<String>,
    ) -> Self {
        let orchestrator = OrderOrchestrator::new(
            supplier.clone(),
            store.clone(),
            engine.clone(),
            default_pickup,
        );
        Self {
            supplier,
            payments,
            store,
            orchestrator,
            engine,
            deadline: SUPPLIER_DEADLINE,
            order: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.orchestrator = self.orchestrator.with_deadline(deadline);
        self.deadline = deadline;
        self
    }

    pub fn orchestrator(&self) -> &OrderOrchestrator {
        &self.orchestrator
    }

    pub fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    pub fn retry(&mut self) -> Result<(), SubmitError> {
        self.orchestrator.retry()
    }

    /// Find or create the order for the pending draft.
    ///
    /// A persisted supplier order number is looked up directly. Otherwise the
    /// orchestrator runs under the persisted (or freshly generated and
    /// persisted) `agent_order_id`.
    pub async fn resolve(&mut self, ctx: &CallContext) -> Result<Order, ConfirmError> {
        let mut current = self.current_booking().await?;
        if let Some(order_no) = current.klook_order_no.clone() {
            debug!(klook_order_no = %order_no, "Resolving persisted order");
            return self.load_order(ctx, &order_no).await;
        }

        let agent_order_id = match current.agent_order_id.clone() {
            Some(id) => {
                info!(agent_order_id = %id, "Reusing agent order id");
                id
            }
            None => {
                let id = generate_agent_order_id();
                ctx.ensure_live().map_err(OrderError::from)?;
                current.agent_order_id = Some(id.clone());
                save_record(self.store.as_ref(), CURRENT_BOOKING, &current).await?;
                info!(agent_order_id = %id, "Agent order id assigned");
                id
            }
        };

        // A previous call on this coordinator may have created the order and
        // then been cancelled before persisting its number
        let created = match self.orchestrator.step() {
            BookingStep::OrderCreated { klook_order_no } => Some(klook_order_no.clone()),
            _ => None,
        };
        let order_no = match created {
            Some(order_no) => order_no,
            None => self.orchestrator.submit(ctx, &agent_order_id).await?,
        };

        // Reload: the orchestrator stored the availability payload meanwhile.
        // A new selection in between clears the id; that draft gets its own order.
        let mut current = self.current_booking().await?;
        if current.agent_order_id.as_deref() != Some(agent_order_id.as_str()) {
            warn!(
                agent_order_id = %agent_order_id,
                klook_order_no = %order_no,
                "Draft replaced during order creation, order not attached"
            );
            return Err(ConfirmError::DraftReplaced);
        }
        current.klook_order_no = Some(order_no.clone());
        ctx.ensure_live().map_err(OrderError::from)?;
        save_record(self.store.as_ref(), CURRENT_BOOKING, &current).await?;

        self.load_order(ctx, &order_no).await
    }

    /// Look up an order created by an earlier confirmation without creating one
    pub async fn resume(&mut self, ctx: &CallContext) -> Result<Order, ConfirmError> {
        let current = self.current_booking().await?;
        match current.klook_order_no {
            Some(order_no) => self.load_order(ctx, &order_no).await,
            None => Err(ConfirmError::OrderNotResolved),
        }
    }

    /// Validate the additional passengers and hand off to payment.
    ///
    /// Returns the already-created intent when one exists for this draft. On
    /// success `pendingBooking` is cleared; the summary keeps the checkout URL.
    pub async fn pay(
        &mut self,
        ctx: &CallContext,
        passengers: &[PassengerRecord],
    ) -> Result<PaymentIntent, ConfirmError> {
        let mut current = self.current_booking().await?;
        if let Some(intent) = current.payment_intent.clone() {
            debug!(order_id = %intent.order_id, "Payment intent already created");
            return Ok(intent);
        }
        let order = self.order.clone().ok_or(ConfirmError::OrderNotResolved)?;

        let draft: BookingDraft = require_record(self.store.as_ref(), PENDING_BOOKING).await?;
        let contact: ContactInfo = require_record(self.store.as_ref(), BOOKER_INFO).await?;
        check_passengers(&draft, passengers).map_err(ConfirmError::Validation)?;

        let amount = self
            .engine
            .final_total(self.engine.apply_markup(order.total_amount), draft.discount);
        let request = PaymentIntentRequest {
            order_id: order.klook_order_no.clone(),
            agent_order_id: order.agent_order_id.clone(),
            amount,
            currency: order.currency.clone(),
            customer_email: contact.email.expose().trim().to_string(),
            customer_name: contact.full_name(),
            booking_data: json!({
                "summary": draft.summary(),
                "passengers": passengers,
            }),
        };

        let envelope = ctx
            .run(self.deadline, async {
                self.payments
                    .create_intent(&request)
                    .await
                    .map_err(PaymentError::from)
            })
            .await?;
        let checkout_url = match envelope.data.as_ref() {
            Some(data) if envelope.success => data.checkout_url.clone(),
            _ => {
                return Err(PaymentError::Rejected {
                    code: envelope.error_code().unwrap_or_default().to_string(),
                    message: envelope.error_message(),
                }
                .into())
            }
        };

        ctx.ensure_live().map_err(PaymentError::from)?;
        let intent = PaymentIntent {
            order_id: request.order_id,
            agent_order_id: request.agent_order_id,
            amount,
            currency: request.currency,
            checkout_url: checkout_url.clone(),
        };
        current.payment_intent = Some(intent.clone());
        save_record(self.store.as_ref(), CURRENT_BOOKING, &current).await?;

        let mut summary: BookingSummary = load_record(self.store.as_ref(), BOOKING_SUMMARY)
            .await?
            .unwrap_or_else(|| draft.summary());
        summary.checkout_url = Some(checkout_url);
        save_record(self.store.as_ref(), BOOKING_SUMMARY, &summary).await?;
        self.store.clear(PENDING_BOOKING).await?;

        info!(
            order_id = %intent.order_id,
            agent_order_id = %intent.agent_order_id,
            amount = intent.amount,
            "Payment intent created"
        );
        Ok(intent)
    }

    async fn current_booking(&self) -> Result<CurrentBooking, ConfirmError> {
        Ok(load_record(self.store.as_ref(), CURRENT_BOOKING)
            .await?
            .unwrap_or_default())
    }

    async fn load_order(&mut self, ctx: &CallContext, order_no: &str) -> Result<Order, ConfirmError> {
        let envelope = ctx
            .run(self.deadline, async {
                self.supplier
                    .fetch_order(order_no)
                    .await
                    .map_err(OrderError::from)
            })
            .await?;
        let code = envelope.error_code().unwrap_or("order_lookup").to_string();
        let message = envelope.error_message();
        let order: Order = match envelope.data {
            Some(record) if envelope.success => record.into(),
            _ => return Err(OrderError::Other { code, message }.into()),
        };
        self.order = Some(order.clone());
        Ok(order)
    }
}

/// Exactly one record per passenger slot, each passing validation
fn check_passengers(
    draft: &BookingDraft,
    passengers: &[PassengerRecord],
) -> Result<(), ValidationErrors> {
    let expected = (draft.adult_quantity.saturating_sub(1) + draft.child_quantity) as usize;
    let mut errors = ValidationErrors::new();
    if passengers.len() != expected {
        errors.push(
            "passengers",
            format!(
                "Expected details for {} additional passenger(s), got {}",
                expected,
                passengers.len()
            ),
        );
    }
    if let Err(record_errors) = PassengerValidator::validate(passengers) {
        errors.extend(record_errors);
    }
    errors.into_result()
}
