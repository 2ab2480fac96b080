use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tourbook_shared::{BookingDraft, Schedule};

use crate::pricing::PricingEngine;

/// A bookable slot of a package, priced in supplier terms
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkuSlot {
    pub sku_id: u64,
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    /// Supplier base price per person
    pub price: f64,
}

/// The package the user is looking at, with the slots it offers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityPackage {
    pub activity_id: u64,
    pub activity_name: String,
    pub package_id: u64,
    pub package_name: String,
    pub currency: String,
    pub skus: Vec<SkuSlot>,
}

impl ActivityPackage {
    pub fn find_sku(&self, sku_id: u64) -> Option<&SkuSlot> {
        self.skus.iter().find(|s| s.sku_id == sku_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleSelection {
    pub sku_id: u64,
    pub adult_quantity: u32,
    #[serde(default)]
    pub child_quantity: u32,
    #[serde(default)]
    pub extra_info: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error("SKU {sku_id} does not belong to package {package_id}")]
    SkuNotInPackage { sku_id: u64, package_id: u64 },

    #[error("At least one adult is required")]
    NoAdult,
}

/// Build a fresh draft for the chosen slot, prices marked up.
pub fn select_schedule(
    engine: &PricingEngine,
    package: &ActivityPackage,
    selection: &ScheduleSelection,
) -> Result<BookingDraft, SelectionError> {
    let slot = package
        .find_sku(selection.sku_id)
        .ok_or(SelectionError::SkuNotInPackage {
            sku_id: selection.sku_id,
            package_id: package.package_id,
        })?;

    // The lead booker is always an adult passenger
    if selection.adult_quantity == 0 {
        return Err(SelectionError::NoAdult);
    }

    let mut draft = BookingDraft {
        activity_id: package.activity_id,
        activity_name: package.activity_name.clone(),
        package_id: package.package_id,
        package_name: package.package_name.clone(),
        schedule: Schedule {
            sku_id: slot.sku_id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            price: engine.apply_markup(slot.price),
            original_price: slot.price,
            currency: package.currency.clone(),
        },
        adult_quantity: selection.adult_quantity,
        child_quantity: selection.child_quantity,
        extra_info: selection.extra_info.clone(),
        total_price: 0.0,
        original_total_price: 0.0,
        voucher_code: None,
        discount: 0.0,
        voucher_applied: false,
        terms_accepted: false,
    };
    engine.recompute(&mut draft);
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn package() -> ActivityPackage {
        let start = NaiveDate::from_ymd_opt(2026, 11, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        ActivityPackage {
            activity_id: 5,
            activity_name: "Temple Walk".to_string(),
            package_id: 55,
            package_name: "Morning group".to_string(),
            currency: "USD".to_string(),
            skus: vec![SkuSlot {
                sku_id: 501,
                start_time: start,
                end_time: None,
                price: 100.0,
            }],
        }
    }

    #[test]
    fn test_selection_marks_up_prices() {
        let engine = PricingEngine::default();
        let selection = ScheduleSelection {
            sku_id: 501,
            adult_quantity: 2,
            child_quantity: 1,
            extra_info: BTreeMap::new(),
        };
        let draft = select_schedule(&engine, &package(), &selection).unwrap();

        assert_eq!(draft.schedule.price, 115.0);
        assert_eq!(draft.schedule.original_price, 100.0);
        assert_eq!(draft.total_price, 345.0);
        assert_eq!(draft.original_total_price, 300.0);
        assert!(!draft.voucher_applied);
    }

    #[test]
    fn test_foreign_sku_rejected() {
        let engine = PricingEngine::default();
        let selection = ScheduleSelection {
            sku_id: 999,
            adult_quantity: 1,
            child_quantity: 0,
            extra_info: BTreeMap::new(),
        };
        let err = select_schedule(&engine, &package(), &selection).unwrap_err();
        assert_eq!(
            err,
            SelectionError::SkuNotInPackage {
                sku_id: 999,
                package_id: 55
            }
        );
    }

    #[test]
    fn test_children_only_rejected() {
        let engine = PricingEngine::default();
        let selection = ScheduleSelection {
            sku_id: 501,
            adult_quantity: 0,
            child_quantity: 2,
            extra_info: BTreeMap::new(),
        };
        assert_eq!(
            select_schedule(&engine, &package(), &selection),
            Err(SelectionError::NoAdult)
        );
    }
}
