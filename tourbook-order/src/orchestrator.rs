use std::sync::Arc;
use std::time::Duration;

use tourbook_catalog::PricingEngine;
use tourbook_core::repository::{
    load_record, require_record, save_record, BOOKER_INFO, CURRENT_BOOKING, PENDING_BOOKING,
};
use tourbook_core::supplier::{
    ApiEnvelope, CreateOrderRequest, CreatedOrder, ExtraInfoEntry, ExtraInfoField, OrderContact,
    OrderItemRequest, SupplierGateway,
};
use tourbook_core::{
    AvailabilityError, CallContext, DraftStore, GatewayError, NetworkError, OrderError,
    ValidationErrors,
};
use tourbook_shared::{BookingDraft, ContactInfo, CurrentBooking};
use tracing::{info, warn};

use crate::availability::{availability_request, AvailabilityClient, START_TIME_FORMAT};
use crate::extra_info::{format_extra_info, package_fields};
use crate::models::{BookingStep, SubmitError, SUPPLIER_DEADLINE};
use crate::passenger::PassengerValidator;

/// Supplier code for an order missing required booking information
pub const MISSING_INFO_CODE: &str = "1401";
/// Supplier code for an order placed after the slot's cut-off time
pub const CUTOFF_PASSED_CODE: &str = "1103";

/// Runs one booking attempt: availability, extra info, formatting and order
/// submission, strictly in that order.
pub struct OrderOrchestrator {
    supplier: Arc<dyn SupplierGateway>,
    store: Arc<dyn DraftStore>,
    availability: AvailabilityClient,
    default_pickup: String,
    deadline: Duration,
    step: BookingStep,
}

impl OrderOrchestrator {
    pub fn new(
        supplier: Arc<dyn SupplierGateway>,
        store: Arc<dyn DraftStore>,
        engine: PricingEngine,
        default_pickup: impl Into<String>,
    ) -> Self {
        let availability = AvailabilityClient::new(supplier.clone(), store.clone(), engine);
        Self {
            supplier,
            store,
            availability,
            default_pickup: default_pickup.into(),
            deadline: SUPPLIER_DEADLINE,
            step: BookingStep::Draft,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.availability = self.availability.with_deadline(deadline);
        self.deadline = deadline;
        self
    }

    pub fn step(&self) -> &BookingStep {
        &self.step
    }

    pub fn is_submitting(&self) -> bool {
        self.step.is_in_flight()
    }

    /// Explicit user retry after a failure that did not rule the slot out
    pub fn retry(&mut self) -> Result<(), SubmitError> {
        if !self.step.is_retryable() {
            return Err(SubmitError::NotSubmittable(self.step.name()));
        }
        self.transition(BookingStep::Draft);
        Ok(())
    }

    /// Submit the pending draft as an order under `agent_order_id`.
    ///
    /// Returns the supplier order number. A price change puts the attempt back
    /// in `Draft` with the corrected draft persisted; nothing is retried
    /// automatically.
    pub async fn submit(
        &mut self,
        ctx: &CallContext,
        agent_order_id: &str,
    ) -> Result<String, SubmitError> {
        if self.step.is_in_flight() {
            return Err(SubmitError::AlreadySubmitting);
        }
        if self.step != BookingStep::Draft {
            return Err(SubmitError::NotSubmittable(self.step.name()));
        }

        let mut draft: BookingDraft = require_record(self.store.as_ref(), PENDING_BOOKING).await?;
        let contact: ContactInfo = require_record(self.store.as_ref(), BOOKER_INFO).await?;
        validate_locally(&draft, &contact).map_err(SubmitError::Validation)?;

        self.transition(BookingStep::AvailabilityChecking);
        let validation = match self.availability.check(ctx, &mut draft).await {
            Ok(validation) => validation,
            Err(err) => {
                match err {
                    AvailabilityError::PriceChanged { .. } | AvailabilityError::Aborted => {
                        self.transition(BookingStep::Draft)
                    }
                    ref reason => self.transition(BookingStep::AvailabilityFailed {
                        reason: reason.clone(),
                    }),
                }
                return Err(err.into());
            }
        };
        if let Err(err) = self.record_validation(ctx, validation).await {
            self.transition(BookingStep::Draft);
            return Err(err);
        }

        self.transition(BookingStep::ExtraInfoFetching);
        let fields = match self.fetch_fields(ctx, draft.package_id).await {
            Ok(fields) => fields,
            Err(err) => {
                self.transition(BookingStep::Draft);
                return Err(err.into());
            }
        };

        self.transition(BookingStep::Formatting);
        let extra = format_extra_info(&draft.extra_info, &fields, &self.default_pickup);
        let request = order_request(agent_order_id, &draft, &contact, extra);

        self.transition(BookingStep::OrderSubmitting);
        let result = ctx
            .run(self.deadline, async {
                self.supplier
                    .create_order(&request)
                    .await
                    .map_err(OrderError::from)
            })
            .await
            .and_then(created_order_no);

        match result {
            Ok(klook_order_no) => {
                info!(
                    agent_order_id,
                    klook_order_no = %klook_order_no,
                    "Supplier order created"
                );
                self.transition(BookingStep::OrderCreated {
                    klook_order_no: klook_order_no.clone(),
                });
                Ok(klook_order_no)
            }
            Err(OrderError::Network(NetworkError::Aborted)) => {
                self.transition(BookingStep::Draft);
                Err(OrderError::Network(NetworkError::Aborted).into())
            }
            Err(reason) => {
                warn!(agent_order_id, error = %reason, "Order submission failed");
                self.transition(BookingStep::OrderFailed {
                    reason: reason.clone(),
                });
                Err(reason.into())
            }
        }
    }

    async fn record_validation(
        &self,
        ctx: &CallContext,
        validation: Option<serde_json::Value>,
    ) -> Result<(), SubmitError> {
        let mut current: CurrentBooking = load_record(self.store.as_ref(), CURRENT_BOOKING)
            .await?
            .unwrap_or_default();
        current.validation = validation;
        ctx.ensure_live()?;
        save_record(self.store.as_ref(), CURRENT_BOOKING, &current).await?;
        Ok(())
    }

    /// Package field definitions. Only cancellation is fatal: on any other
    /// failure the order goes out with the user's fields and the pickup default.
    async fn fetch_fields(
        &self,
        ctx: &CallContext,
        package_id: u64,
    ) -> Result<Vec<ExtraInfoField>, NetworkError> {
        let result = ctx
            .run(self.deadline, async {
                self.supplier.fetch_extra_info(package_id).await
            })
            .await;

        match result {
            Ok(envelope) if envelope.success => {
                Ok(package_fields(&envelope.data.unwrap_or_default()))
            }
            Ok(envelope) => {
                warn!(
                    package_id,
                    code = ?envelope.error_code(),
                    "Extra info lookup rejected, using defaults"
                );
                Ok(Vec::new())
            }
            Err(GatewayError::Network(NetworkError::Aborted)) => Err(NetworkError::Aborted),
            Err(err) => {
                warn!(package_id, error = %err, "Extra info lookup failed, using defaults");
                Ok(Vec::new())
            }
        }
    }

    fn transition(&mut self, next: BookingStep) {
        info!(from = self.step.name(), to = next.name(), "Booking step");
        self.step = next;
    }
}

/// Checks that need no network: the lead contact and the terms checkbox
fn validate_locally(draft: &BookingDraft, contact: &ContactInfo) -> Result<(), ValidationErrors> {
    let mut errors = match PassengerValidator::validate_contact(contact) {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };
    if !draft.terms_accepted {
        errors.push("terms_accepted", "Please accept the terms and conditions");
    }
    errors.into_result()
}

fn created_order_no(envelope: ApiEnvelope<CreatedOrder>) -> Result<String, OrderError> {
    if envelope.success {
        if let Some(created) = envelope.data {
            return Ok(created.klook_order_no);
        }
    }
    let code = envelope.error_code().unwrap_or_default().to_string();
    let message = envelope.error_message();
    Err(match code.as_str() {
        MISSING_INFO_CODE => OrderError::MissingRequiredInfo,
        CUTOFF_PASSED_CODE => OrderError::CutoffPassed,
        _ => OrderError::Other { code, message },
    })
}

pub fn order_request(
    agent_order_id: &str,
    draft: &BookingDraft,
    contact: &ContactInfo,
    booking_extra_info: Vec<ExtraInfoEntry>,
) -> CreateOrderRequest {
    CreateOrderRequest {
        agent_order_id: agent_order_id.to_string(),
        contact_info: OrderContact {
            first_name: contact.first_name.trim().to_string(),
            last_name: contact.last_name.trim().to_string(),
            email: contact.email.expose().trim().to_string(),
            mobile: contact.phone.expose().trim().to_string(),
            country: contact.country.trim().to_string(),
            passport_id: contact.passport_id.expose().trim().to_string(),
        },
        items: vec![OrderItemRequest {
            package_id: draft.package_id,
            start_time: draft.schedule.start_time.format(START_TIME_FORMAT).to_string(),
            sku_list: availability_request(draft).sku_list,
            booking_extra_info,
            unit_extra_info: Vec::new(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_codes_are_classified() {
        let missing: ApiEnvelope<CreatedOrder> = ApiEnvelope::failure("1401", "missing info");
        assert_eq!(created_order_no(missing), Err(OrderError::MissingRequiredInfo));

        let cutoff: ApiEnvelope<CreatedOrder> = ApiEnvelope::failure("1103", "cut-off");
        assert_eq!(created_order_no(cutoff), Err(OrderError::CutoffPassed));

        let other: ApiEnvelope<CreatedOrder> = ApiEnvelope::failure("5000", "Sold out upstream");
        assert_eq!(
            created_order_no(other),
            Err(OrderError::Other {
                code: "5000".to_string(),
                message: "Sold out upstream".to_string(),
            })
        );

        let ok = ApiEnvelope::ok(CreatedOrder {
            klook_order_no: "KLK-1".to_string(),
        });
        assert_eq!(created_order_no(ok), Ok("KLK-1".to_string()));
    }
}
