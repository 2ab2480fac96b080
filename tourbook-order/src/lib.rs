pub mod availability;
pub mod confirmation;
pub mod extra_info;
pub mod mock;
pub mod models;
pub mod orchestrator;
pub mod passenger;
pub mod selection;
pub mod voucher;

pub use availability::{parse_price_change, AvailabilityClient};
pub use confirmation::{generate_agent_order_id, ConfirmationCoordinator};
pub use extra_info::{format_extra_info, PICKUP_LOCATION_KEY};
pub use mock::{MockCalls, MockSupplier};
pub use models::{BookingStep, ConfirmError, StartError, SubmitError};
pub use orchestrator::OrderOrchestrator;
pub use passenger::{passenger_slots, PassengerValidator};
pub use selection::{amend_details, start_booking};
pub use voucher::VoucherService;
