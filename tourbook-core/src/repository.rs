use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::StoreError;

/// In-progress `BookingDraft`
pub const PENDING_BOOKING: &str = "pendingBooking";
/// Lead booker `ContactInfo`
pub const BOOKER_INFO: &str = "bookerInfo";
/// `BookingSummary` for the confirmation step
pub const BOOKING_SUMMARY: &str = "bookingSummary";
/// `CurrentBooking` order identifiers and payment intent
pub const CURRENT_BOOKING: &str = "currentBooking";

/// Client-held record storage for one booking draft.
///
/// `save` replaces the whole named record; there are no field patches, so two
/// writers racing on the same record can never interleave partial updates.
#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn save(&self, name: &str, record: Value) -> Result<(), StoreError>;

    async fn load(&self, name: &str) -> Result<Option<Value>, StoreError>;

    async fn clear(&self, name: &str) -> Result<(), StoreError>;

    /// Same backend, records isolated under another draft namespace
    fn scoped(&self, namespace: &str) -> Arc<dyn DraftStore>;
}

pub async fn save_record<T: Serialize + ?Sized>(
    store: &dyn DraftStore,
    name: &str,
    record: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(record).map_err(|e| StoreError::Malformed {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    store.save(name, value).await
}

pub async fn load_record<T: DeserializeOwned>(
    store: &dyn DraftStore,
    name: &str,
) -> Result<Option<T>, StoreError> {
    match store.load(name).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Malformed {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Like `load_record` but the record must exist
pub async fn require_record<T: DeserializeOwned>(
    store: &dyn DraftStore,
    name: &str,
) -> Result<T, StoreError> {
    load_record(store, name)
        .await?
        .ok_or_else(|| StoreError::Missing(name.to_string()))
}
