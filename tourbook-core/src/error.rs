//! Error taxonomy for the booking flow.
//!
//! Every error class carries a `user_message()` for the presentation layer; raw
//! supplier text is only surfaced when no mapped message exists.

use std::fmt;

use serde::Serialize;

/// Cancellation outcomes of an external call
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("request timed out")]
    Timeout,
    #[error("request aborted")]
    Aborted,
}

/// Failure of a gateway call before a supplier envelope could be read
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("draft store unavailable: {0}")]
    Backend(String),
    #[error("record {name} is malformed: {reason}")]
    Malformed { name: String, reason: String },
    #[error("record {0} is missing")]
    Missing(String),
}

/// A single invalid form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All invalid fields of a validation pass, in record then field order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    /// Field the presentation layer should focus
    pub fn first_invalid(&self) -> Option<&str> {
        self.0.first().map(|e| e.field.as_str())
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Errors whose key starts with `prefix` (e.g. one passenger record)
    pub fn for_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.0.iter().filter(move |e| e.field.starts_with(prefix))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid field(s)", self.0.len())?;
        if let Some(first) = self.0.first() {
            write!(f, ", first: {} ({})", first.field, first.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AvailabilityError {
    #[error("price changed, new base price {new_price}")]
    PriceChanged { new_price: f64 },
    #[error("slot no longer available")]
    SlotUnavailable,
    #[error("availability check failed [{code}]: {message}")]
    Other { code: String, message: String },
    #[error("availability check timed out")]
    Timeout,
    #[error("availability check aborted")]
    Aborted,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AvailabilityError {
    pub fn user_message(&self) -> String {
        match self {
            AvailabilityError::PriceChanged { .. } => {
                "The price for this date has changed. Please review the new total and confirm again."
                    .to_string()
            }
            AvailabilityError::SlotUnavailable => {
                "This time slot can no longer be booked. Please choose a different date.".to_string()
            }
            AvailabilityError::Timeout | AvailabilityError::Aborted => {
                "We could not confirm availability in time. Please try again.".to_string()
            }
            AvailabilityError::Other { message, .. } if !message.is_empty() => message.clone(),
            AvailabilityError::Other { .. } | AvailabilityError::Store(_) => {
                "We could not confirm availability. Please try again.".to_string()
            }
        }
    }
}

impl From<GatewayError> for AvailabilityError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Network(NetworkError::Timeout) => AvailabilityError::Timeout,
            GatewayError::Network(NetworkError::Aborted) => AvailabilityError::Aborted,
            other => AvailabilityError::Other {
                code: "gateway".to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl From<NetworkError> for AvailabilityError {
    fn from(err: NetworkError) -> Self {
        GatewayError::Network(err).into()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("order rejected: missing required booking information")]
    MissingRequiredInfo,
    #[error("order rejected: cut-off time passed")]
    CutoffPassed,
    #[error("order failed [{code}]: {message}")]
    Other { code: String, message: String },
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrderError {
    pub fn user_message(&self) -> String {
        match self {
            OrderError::MissingRequiredInfo => {
                "Some required booking details are missing. Please recheck the required fields."
                    .to_string()
            }
            OrderError::CutoffPassed => {
                "The booking cut-off time for this slot has passed. Please choose another date."
                    .to_string()
            }
            OrderError::Network(_) => {
                "The order request did not complete. Please try again.".to_string()
            }
            OrderError::Other { message, .. } if !message.is_empty() => message.clone(),
            OrderError::Other { .. } | OrderError::Store(_) => {
                "We could not create your order. Please try again.".to_string()
            }
        }
    }
}

impl From<GatewayError> for OrderError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Network(network) => OrderError::Network(network),
            other => OrderError::Other {
                code: "gateway".to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VoucherError {
    #[error("invalid voucher: {0}")]
    InvalidCode(String),
    #[error("voucher validation timed out")]
    Timeout,
    #[error("voucher validation aborted")]
    Aborted,
    #[error("voucher service error: {0}")]
    ServiceError(String),
}

impl VoucherError {
    pub fn user_message(&self) -> String {
        match self {
            VoucherError::InvalidCode(msg) if !msg.is_empty() => msg.clone(),
            VoucherError::InvalidCode(_) => "This voucher code is not valid.".to_string(),
            VoucherError::Timeout => {
                "The voucher check took too long. Please try again.".to_string()
            }
            VoucherError::Aborted => "The voucher check was cancelled.".to_string(),
            VoucherError::ServiceError(_) => {
                "We could not apply the voucher right now. Please try again later.".to_string()
            }
        }
    }
}

impl From<GatewayError> for VoucherError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Network(NetworkError::Timeout) => VoucherError::Timeout,
            GatewayError::Network(NetworkError::Aborted) => VoucherError::Aborted,
            other => VoucherError::ServiceError(other.to_string()),
        }
    }
}

impl From<NetworkError> for VoucherError {
    fn from(err: NetworkError) -> Self {
        GatewayError::Network(err).into()
    }
}

impl From<StoreError> for VoucherError {
    fn from(err: StoreError) -> Self {
        VoucherError::ServiceError(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaymentError {
    #[error("payment intent rejected [{code}]: {message}")]
    Rejected { code: String, message: String },
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl PaymentError {
    pub fn user_message(&self) -> String {
        match self {
            PaymentError::Rejected { message, .. } if !message.is_empty() => message.clone(),
            PaymentError::Rejected { .. } => {
                "We could not start the payment. Please try again.".to_string()
            }
            PaymentError::Network(_) => {
                "The payment service did not respond. Please try again.".to_string()
            }
        }
    }
}

impl From<GatewayError> for PaymentError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Network(network) => PaymentError::Network(network),
            other => PaymentError::Rejected {
                code: "gateway".to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_keep_order() {
        let mut errors = ValidationErrors::new();
        errors.push("adult_1_first_name", "required");
        errors.push("child_0_age", "required");

        assert_eq!(errors.first_invalid(), Some("adult_1_first_name"));
        assert_eq!(errors.get("child_0_age"), Some("required"));
        assert_eq!(errors.for_prefix("child_0_").count(), 1);
        assert!(errors.into_result().is_err());
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_gateway_timeout_is_distinct_from_other() {
        let timeout: AvailabilityError = GatewayError::Network(NetworkError::Timeout).into();
        assert_eq!(timeout, AvailabilityError::Timeout);

        let other: AvailabilityError = GatewayError::Transport("connection reset".into()).into();
        assert!(matches!(other, AvailabilityError::Other { .. }));
    }

    #[test]
    fn test_cancelled_voucher_check_is_not_a_service_fault() {
        let aborted: VoucherError = NetworkError::Aborted.into();
        assert_eq!(aborted, VoucherError::Aborted);

        let refused: VoucherError = GatewayError::Transport("connection refused".into()).into();
        assert!(matches!(refused, VoucherError::ServiceError(_)));
    }

    #[test]
    fn test_mapped_messages_hide_raw_payloads() {
        let err = OrderError::MissingRequiredInfo;
        assert!(err.user_message().contains("required"));

        let raw = OrderError::Other {
            code: "9999".into(),
            message: "Upstream said no".into(),
        };
        assert_eq!(raw.user_message(), "Upstream said no");
    }
}
