use std::collections::BTreeMap;

use tourbook_catalog::{select_schedule, ActivityPackage, PricingEngine, ScheduleSelection};
use tourbook_core::repository::{
    require_record, save_record, BOOKER_INFO, BOOKING_SUMMARY, CURRENT_BOOKING, PENDING_BOOKING,
};
use tourbook_core::DraftStore;
use tourbook_shared::{BookingDraft, ContactInfo};
use tracing::info;

use crate::models::StartError;
use crate::passenger::PassengerValidator;

/// Start a fresh draft for the chosen slot and persist it right away.
///
/// Any order identifiers left over from a previous draft are discarded, so the
/// next confirmation creates a new order.
pub async fn start_booking(
    store: &dyn DraftStore,
    engine: &PricingEngine,
    package: &ActivityPackage,
    selection: &ScheduleSelection,
    contact: &ContactInfo,
) -> Result<BookingDraft, StartError> {
    let draft = select_schedule(engine, package, selection)?;

    store.clear(CURRENT_BOOKING).await?;
    save_record(store, PENDING_BOOKING, &draft).await?;
    save_record(store, BOOKER_INFO, contact).await?;
    save_record(store, BOOKING_SUMMARY, &draft.summary()).await?;

    info!(
        activity_id = draft.activity_id,
        package_id = draft.package_id,
        sku_id = draft.schedule.sku_id,
        participants = draft.participants(),
        total_price = draft.total_price,
        "Booking draft started"
    );
    Ok(draft)
}

/// Update the contact, extra fields and terms flag of the pending draft.
/// Prices are not touched. A contact that fails validation is not saved.
/// An extra field sent with a blank value is removed.
pub async fn amend_details(
    store: &dyn DraftStore,
    contact: Option<&ContactInfo>,
    extra_info: Option<&BTreeMap<String, String>>,
    terms_accepted: Option<bool>,
) -> Result<BookingDraft, StartError> {
    if let Some(contact) = contact {
        PassengerValidator::validate_contact(contact).map_err(StartError::Validation)?;
    }
    let mut draft: BookingDraft = require_record(store, PENDING_BOOKING).await?;
    if let Some(extra) = extra_info {
        for (key, value) in extra {
            if value.trim().is_empty() {
                draft.extra_info.remove(key);
            } else {
                draft.extra_info.insert(key.clone(), value.clone());
            }
        }
    }
    if let Some(accepted) = terms_accepted {
        draft.terms_accepted = accepted;
    }
    save_record(store, PENDING_BOOKING, &draft).await?;
    if let Some(contact) = contact {
        save_record(store, BOOKER_INFO, contact).await?;
    }
    Ok(draft)
}
