use serde::{Deserialize, Serialize};
use tourbook_shared::BookingDraft;

/// Margin applied to every supplier base price before it is shown to the user
pub const MARKUP_RATE: f64 = 0.15;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Fraction added on top of the supplier price (0.15 = 15%)
    pub markup_rate: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            markup_rate: MARKUP_RATE,
        }
    }
}

/// Markup and total calculations.
///
/// Selection, price-drift correction and the payment amount all price through
/// one engine so the markup cannot drift between call sites.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn markup_rate(&self) -> f64 {
        self.config.markup_rate
    }

    /// `base * (1 + markup)`
    pub fn apply_markup(&self, base: f64) -> f64 {
        round_cents(base * (1.0 + self.config.markup_rate))
    }

    pub fn subtotal(&self, price: f64, adult_quantity: u32, child_quantity: u32) -> f64 {
        round_cents(price * f64::from(adult_quantity + child_quantity))
    }

    /// Discounted total, floored at zero
    pub fn final_total(&self, subtotal: f64, discount: f64) -> f64 {
        round_cents((subtotal - discount).max(0.0))
    }

    /// Rederive `total_price` and `original_total_price` from the draft's
    /// per-person prices, quantities and discount.
    pub fn recompute(&self, draft: &mut BookingDraft) {
        let subtotal = self.subtotal(
            draft.schedule.price,
            draft.adult_quantity,
            draft.child_quantity,
        );
        draft.total_price = self.final_total(subtotal, draft.discount);
        draft.original_total_price = self.subtotal(
            draft.schedule.original_price,
            draft.adult_quantity,
            draft.child_quantity,
        );
    }

    /// Re-price a draft after the supplier reports a new base price
    pub fn reprice(&self, draft: &mut BookingDraft, new_base_price: f64) {
        draft.schedule.original_price = round_cents(new_base_price);
        draft.schedule.price = self.apply_markup(new_base_price);
        self.recompute(draft);
    }
}

/// Round to the nearest cent
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
