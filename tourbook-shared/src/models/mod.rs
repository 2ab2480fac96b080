pub mod booking;
pub mod order;
pub mod passenger;

pub use booking::{BookingDraft, BookingSummary, CurrentBooking, Schedule};
pub use order::{Order, PaymentIntent};
pub use passenger::{ContactInfo, PassengerRecord, PassengerType};
