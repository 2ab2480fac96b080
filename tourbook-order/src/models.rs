use std::time::Duration;

use tourbook_catalog::SelectionError;
use tourbook_core::{
    AvailabilityError, NetworkError, OrderError, PaymentError, StoreError, ValidationErrors,
};

/// Deadline for voucher validation
pub const VOUCHER_DEADLINE: Duration = Duration::from_secs(10);
/// Deadline for availability, order and payment calls
pub const SUPPLIER_DEADLINE: Duration = Duration::from_secs(15);

/// Where a booking attempt currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum BookingStep {
    Draft,
    AvailabilityChecking,
    AvailabilityFailed { reason: AvailabilityError },
    ExtraInfoFetching,
    Formatting,
    OrderSubmitting,
    OrderCreated { klook_order_no: String },
    OrderFailed { reason: OrderError },
}

impl BookingStep {
    pub fn name(&self) -> &'static str {
        match self {
            BookingStep::Draft => "DRAFT",
            BookingStep::AvailabilityChecking => "AVAILABILITY_CHECKING",
            BookingStep::AvailabilityFailed { .. } => "AVAILABILITY_FAILED",
            BookingStep::ExtraInfoFetching => "EXTRA_INFO_FETCHING",
            BookingStep::Formatting => "FORMATTING",
            BookingStep::OrderSubmitting => "ORDER_SUBMITTING",
            BookingStep::OrderCreated { .. } => "ORDER_CREATED",
            BookingStep::OrderFailed { .. } => "ORDER_FAILED",
        }
    }

    /// A step of the attempt is running
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            BookingStep::AvailabilityChecking
                | BookingStep::ExtraInfoFetching
                | BookingStep::Formatting
                | BookingStep::OrderSubmitting
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStep::OrderCreated { .. }
                | BookingStep::OrderFailed { .. }
                | BookingStep::AvailabilityFailed {
                    reason: AvailabilityError::SlotUnavailable
                }
        )
    }

    /// Failures the user may retry without choosing a new schedule
    pub fn is_retryable(&self) -> bool {
        match self {
            BookingStep::AvailabilityFailed { reason } => {
                !matches!(reason, AvailabilityError::SlotUnavailable)
            }
            BookingStep::OrderFailed { reason } => !matches!(reason, OrderError::CutoffPassed),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
    #[error("booking details are invalid: {0}")]
    Validation(ValidationErrors),

    #[error("a submission is already in progress")]
    AlreadySubmitting,

    #[error("booking cannot be submitted from step {0}")]
    NotSubmittable(&'static str),

    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SubmitError {
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Validation(_) => "Please correct the highlighted fields.".to_string(),
            SubmitError::AlreadySubmitting => {
                "Your booking is already being processed.".to_string()
            }
            SubmitError::NotSubmittable(_) => {
                "This booking can no longer be submitted. Please start a new selection."
                    .to_string()
            }
            SubmitError::Availability(e) => e.user_message(),
            SubmitError::Order(e) => e.user_message(),
            SubmitError::Store(_) => {
                "Your booking details could not be loaded. Please select the activity again."
                    .to_string()
            }
        }
    }
}

impl From<NetworkError> for SubmitError {
    fn from(err: NetworkError) -> Self {
        SubmitError::Order(OrderError::Network(err))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StartError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("booking details are invalid: {0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfirmError {
    #[error("no order has been resolved for this booking")]
    OrderNotResolved,

    #[error("the draft was replaced while its order was being placed")]
    DraftReplaced,

    #[error("passenger details are invalid: {0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ConfirmError {
    pub fn user_message(&self) -> String {
        match self {
            ConfirmError::OrderNotResolved => {
                "Your order is not ready yet. Please confirm the booking first.".to_string()
            }
            ConfirmError::DraftReplaced => {
                "Your booking changed while the order was being placed. Please review it and confirm again."
                    .to_string()
            }
            ConfirmError::Validation(_) => "Please correct the passenger details.".to_string(),
            ConfirmError::Submit(e) => e.user_message(),
            ConfirmError::Order(e) => e.user_message(),
            ConfirmError::Payment(e) => e.user_message(),
            ConfirmError::Store(_) => {
                "Your booking details could not be loaded. Please select the activity again."
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_steps() {
        assert!(BookingStep::OrderCreated {
            klook_order_no: "KLK-1".into()
        }
        .is_terminal());
        assert!(BookingStep::AvailabilityFailed {
            reason: AvailabilityError::SlotUnavailable
        }
        .is_terminal());
        assert!(!BookingStep::AvailabilityFailed {
            reason: AvailabilityError::PriceChanged { new_price: 42.0 }
        }
        .is_terminal());
        assert!(!BookingStep::Draft.is_terminal());
    }

    #[test]
    fn test_in_flight_steps() {
        assert!(BookingStep::OrderSubmitting.is_in_flight());
        assert!(BookingStep::AvailabilityChecking.is_in_flight());
        assert!(!BookingStep::Draft.is_in_flight());
    }

    #[test]
    fn test_retryable_failures() {
        assert!(BookingStep::AvailabilityFailed {
            reason: AvailabilityError::Timeout
        }
        .is_retryable());
        assert!(!BookingStep::AvailabilityFailed {
            reason: AvailabilityError::SlotUnavailable
        }
        .is_retryable());
        assert!(BookingStep::OrderFailed {
            reason: OrderError::MissingRequiredInfo
        }
        .is_retryable());
        assert!(!BookingStep::OrderFailed {
            reason: OrderError::CutoffPassed
        }
        .is_retryable());
    }
}
