pub mod models;
pub mod pii;

pub use models::{
    BookingDraft, BookingSummary, ContactInfo, CurrentBooking, Order, PassengerRecord,
    PassengerType, PaymentIntent, Schedule,
};
pub use pii::Masked;
