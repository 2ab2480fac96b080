pub mod package;
pub mod pricing;

pub use package::{select_schedule, ActivityPackage, ScheduleSelection, SelectionError, SkuSlot};
pub use pricing::{round_cents, PricingConfig, PricingEngine, MARKUP_RATE};
