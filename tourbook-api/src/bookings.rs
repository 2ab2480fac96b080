//! Draft-scoped booking endpoints. The `{key}` path segment is the client-held
//! draft key; every record of the flow is stored under it.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tourbook_catalog::{ActivityPackage, ScheduleSelection};
use tourbook_core::repository::{
    load_record, require_record, BOOKING_SUMMARY, CURRENT_BOOKING, PENDING_BOOKING,
};
use tourbook_core::{cancel_pair, CallContext, CancelHandle};
use tourbook_order::{amend_details, passenger_slots, start_booking, SubmitError};
use tourbook_shared::{
    BookingDraft, BookingSummary, ContactInfo, CurrentBooking, Order, PassengerRecord,
    PaymentIntent,
};
use tracing::info;

use crate::error::AppError;
use crate::state::{AppState, SubmissionGuard};

const MAX_KEY_LEN: usize = 64;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/drafts/{key}", get(get_draft))
        .route("/v1/drafts/{key}/selection", post(select_schedule))
        .route("/v1/drafts/{key}/details", post(update_details))
        .route("/v1/drafts/{key}/voucher", post(apply_voucher).delete(remove_voucher))
        .route("/v1/drafts/{key}/confirmation", post(confirm_booking))
        .route("/v1/drafts/{key}/payment", post(start_payment))
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub package: ActivityPackage,
    pub selection: ScheduleSelection,
    pub contact: ContactInfo,
}

#[derive(Debug, Deserialize)]
pub struct DetailsRequest {
    #[serde(default)]
    pub contact: Option<ContactInfo>,
    #[serde(default)]
    pub extra_info: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub terms_accepted: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct VoucherRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub passengers: Vec<PassengerRecord>,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub draft: BookingDraft,
    pub summary: BookingSummary,
    /// Blank records for the passenger form
    pub passenger_slots: Vec<PassengerRecord>,
}

impl From<BookingDraft> for DraftResponse {
    fn from(draft: BookingDraft) -> Self {
        Self {
            summary: draft.summary(),
            passenger_slots: passenger_slots(draft.adult_quantity, draft.child_quantity),
            draft,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DraftView {
    pub draft: Option<BookingDraft>,
    pub summary: Option<BookingSummary>,
    pub current: CurrentBooking,
}

#[derive(Debug, Serialize)]
pub struct VoucherResponse {
    pub discount: f64,
    pub draft: BookingDraft,
}

#[derive(Debug, Serialize)]
pub struct ConfirmationResponse {
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub checkout_url: String,
    pub intent: PaymentIntent,
}

fn check_key(key: &str) -> Result<(), AppError> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Draft key must be 1-{} characters of letters, digits, '-' or '_'",
            MAX_KEY_LEN
        )))
    }
}

/// Held for the whole request by every handler that writes the draft.
fn hold_draft(state: &AppState, key: &str) -> Result<SubmissionGuard, AppError> {
    state
        .begin_submission(key)
        .ok_or_else(|| SubmitError::AlreadySubmitting.into())
}

// Dropping the handle (the request future going away) cancels the calls
fn request_context() -> (CancelHandle, CallContext) {
    let (handle, token) = cancel_pair();
    (handle, CallContext::new(token))
}

async fn get_draft(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DraftView>, AppError> {
    check_key(&key)?;
    let store = state.draft_store(&key);
    let draft: Option<BookingDraft> = load_record(store.as_ref(), PENDING_BOOKING).await?;
    let summary: Option<BookingSummary> = load_record(store.as_ref(), BOOKING_SUMMARY).await?;
    if draft.is_none() && summary.is_none() {
        return Err(AppError::NotFoundError("No booking draft for this key".to_string()));
    }
    let current: CurrentBooking = load_record(store.as_ref(), CURRENT_BOOKING)
        .await?
        .unwrap_or_default();
    Ok(Json(DraftView {
        draft,
        summary,
        current,
    }))
}

async fn select_schedule(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SelectionRequest>,
) -> Result<Json<DraftResponse>, AppError> {
    check_key(&key)?;
    let _held = hold_draft(&state, &key)?;
    let store = state.draft_store(&key);
    let draft = start_booking(
        store.as_ref(),
        &state.engine,
        &req.package,
        &req.selection,
        &req.contact,
    )
    .await?;
    Ok(Json(draft.into()))
}

async fn update_details(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<DetailsRequest>,
) -> Result<Json<DraftResponse>, AppError> {
    check_key(&key)?;
    let _held = hold_draft(&state, &key)?;
    let store = state.draft_store(&key);
    let draft = amend_details(
        store.as_ref(),
        req.contact.as_ref(),
        req.extra_info.as_ref(),
        req.terms_accepted,
    )
    .await?;
    Ok(Json(draft.into()))
}

async fn apply_voucher(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<VoucherRequest>,
) -> Result<Json<VoucherResponse>, AppError> {
    check_key(&key)?;
    let _held = hold_draft(&state, &key)?;
    let store = state.draft_store(&key);
    let mut draft: BookingDraft = require_record(store.as_ref(), PENDING_BOOKING).await?;

    let (_handle, ctx) = request_context();
    let discount = state
        .voucher_service(&key)
        .apply(&ctx, &req.code, &mut draft)
        .await?;
    Ok(Json(VoucherResponse { discount, draft }))
}

async fn remove_voucher(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DraftResponse>, AppError> {
    check_key(&key)?;
    let _held = hold_draft(&state, &key)?;
    let store = state.draft_store(&key);
    let mut draft: BookingDraft = require_record(store.as_ref(), PENDING_BOOKING).await?;
    state.voucher_service(&key).remove(&mut draft).await?;
    Ok(Json(draft.into()))
}

async fn confirm_booking(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ConfirmationResponse>, AppError> {
    check_key(&key)?;
    let _held = hold_draft(&state, &key)?;

    let (_handle, ctx) = request_context();
    let mut coordinator = state.coordinator(&key);
    let order = coordinator.resolve(&ctx).await?;
    info!(
        draft = %key,
        klook_order_no = %order.klook_order_no,
        "Booking confirmed"
    );
    Ok(Json(ConfirmationResponse { order }))
}

async fn start_payment(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    check_key(&key)?;
    let _held = hold_draft(&state, &key)?;

    let (_handle, ctx) = request_context();
    let mut coordinator = state.coordinator(&key);
    coordinator.resume(&ctx).await?;
    let intent = coordinator.pay(&ctx, &req.passengers).await?;
    Ok(Json(PaymentResponse {
        checkout_url: intent.checkout_url.clone(),
        intent,
    }))
}
