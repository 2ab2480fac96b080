use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::order::PaymentIntent;

/// A bookable SKU slot as recorded when the user picked it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub sku_id: u64,
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    /// Per-person price shown to the user (markup included)
    pub price: f64,
    /// Supplier's per-person base price
    pub original_price: f64,
    pub currency: String,
}

/// The in-progress booking held in client storage (`pendingBooking`).
///
/// `discount` and the prices are separate fields; `total_price` is always
/// rederived from them and never adjusted incrementally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingDraft {
    pub activity_id: u64,
    pub activity_name: String,
    pub package_id: u64,
    pub package_name: String,
    pub schedule: Schedule,
    pub adult_quantity: u32,
    pub child_quantity: u32,
    #[serde(default)]
    pub extra_info: BTreeMap<String, String>,
    pub total_price: f64,
    pub original_total_price: f64,
    #[serde(default)]
    pub voucher_code: Option<String>,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub voucher_applied: bool,
    #[serde(default)]
    pub terms_accepted: bool,
}

impl BookingDraft {
    /// Number of seats requested (adults and children)
    pub fn participants(&self) -> u32 {
        self.adult_quantity + self.child_quantity
    }

    /// Denormalized view for the confirmation step
    pub fn summary(&self) -> BookingSummary {
        BookingSummary {
            activity_id: self.activity_id,
            activity_name: self.activity_name.clone(),
            package_name: self.package_name.clone(),
            adult_quantity: self.adult_quantity,
            child_quantity: self.child_quantity,
            total_price: self.total_price,
            original_total_price: self.original_total_price,
            discount: self.discount,
            voucher_code: self.voucher_code.clone(),
            schedule: self.schedule.clone(),
            checkout_url: None,
        }
    }
}

/// `bookingSummary` record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingSummary {
    pub activity_id: u64,
    pub activity_name: String,
    pub package_name: String,
    pub adult_quantity: u32,
    pub child_quantity: u32,
    pub total_price: f64,
    pub original_total_price: f64,
    pub discount: f64,
    pub voucher_code: Option<String>,
    pub schedule: Schedule,
    #[serde(default)]
    pub checkout_url: Option<String>,
}

/// `currentBooking` record: identifiers of the order attempt for this draft
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CurrentBooking {
    #[serde(default)]
    pub agent_order_id: Option<String>,
    #[serde(default)]
    pub klook_order_no: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<PaymentIntent>,
    /// Payload of the last successful availability check
    #[serde(default)]
    pub validation: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_draft() -> BookingDraft {
        BookingDraft {
            activity_id: 7,
            activity_name: "Night Safari".to_string(),
            package_id: 42,
            package_name: "Tram + Walk".to_string(),
            schedule: Schedule {
                sku_id: 9001,
                start_time: NaiveDateTime::parse_from_str("2026-11-02 19:30:00", "%Y-%m-%d %H:%M:%S")
                    .unwrap(),
                end_time: None,
                price: 115.0,
                original_price: 100.0,
                currency: "USD".to_string(),
            },
            adult_quantity: 2,
            child_quantity: 1,
            extra_info: BTreeMap::new(),
            total_price: 345.0,
            original_total_price: 300.0,
            voucher_code: None,
            discount: 0.0,
            voucher_applied: false,
            terms_accepted: false,
        }
    }

    #[test]
    fn test_summary_copies_pricing() {
        let draft = sample_draft();
        let summary = draft.summary();
        assert_eq!(summary.total_price, 345.0);
        assert_eq!(summary.schedule.sku_id, 9001);
        assert!(summary.checkout_url.is_none());
        assert_eq!(draft.participants(), 3);
    }

    #[test]
    fn test_draft_defaults_missing_flags() {
        let mut json = serde_json::to_value(sample_draft()).unwrap();
        let obj = json.as_object_mut().unwrap();
        obj.remove("voucher_applied");
        obj.remove("discount");
        obj.remove("extra_info");

        let draft: BookingDraft = serde_json::from_value(json).unwrap();
        assert!(!draft.voucher_applied);
        assert_eq!(draft.discount, 0.0);
        assert!(draft.extra_info.is_empty());
    }
}
