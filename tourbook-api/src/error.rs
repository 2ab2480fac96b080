use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tourbook_core::{AvailabilityError, OrderError, StoreError, ValidationErrors, VoucherError};
use tourbook_order::{ConfirmError, StartError, SubmitError};

#[derive(Debug)]
pub enum AppError {
    ValidationError {
        message: String,
        fields: ValidationErrors,
    },
    BadRequest(String),
    NotFoundError(String),
    ConflictError {
        code: &'static str,
        message: String,
    },
    UpstreamError {
        code: &'static str,
        message: String,
    },
    GatewayTimeout(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::ValidationError { message, fields } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": message,
                    "code": "validation",
                    "first_invalid": fields.first_invalid(),
                    "fields": fields,
                }),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg, "code": "bad_request" }),
            ),
            AppError::NotFoundError(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "error": msg, "code": "not_found" }),
            ),
            AppError::ConflictError { code, message } => {
                (StatusCode::CONFLICT, json!({ "error": message, "code": code }))
            }
            AppError::UpstreamError { code, message } => {
                (StatusCode::BAD_GATEWAY, json!({ "error": message, "code": code }))
            }
            AppError::GatewayTimeout(msg) => (
                StatusCode::GATEWAY_TIMEOUT,
                json!({ "error": msg, "code": "timeout" }),
            ),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error", "code": "internal" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing(name) => {
                AppError::NotFoundError(format!("No {} record for this draft", name))
            }
            other => AppError::Anyhow(other.into()),
        }
    }
}

impl From<StartError> for AppError {
    fn from(err: StartError) -> Self {
        match err {
            StartError::Selection(e) => AppError::BadRequest(e.to_string()),
            StartError::Validation(fields) => AppError::ValidationError {
                message: "Please correct the highlighted fields.".to_string(),
                fields,
            },
            StartError::Store(e) => e.into(),
        }
    }
}

impl From<VoucherError> for AppError {
    fn from(err: VoucherError) -> Self {
        let message = err.user_message();
        match err {
            VoucherError::InvalidCode(_) => AppError::ConflictError {
                code: "invalid_voucher",
                message,
            },
            VoucherError::Timeout | VoucherError::Aborted => AppError::GatewayTimeout(message),
            VoucherError::ServiceError(_) => AppError::UpstreamError {
                code: "voucher_service",
                message,
            },
        }
    }
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        let message = err.user_message();
        match err {
            AvailabilityError::PriceChanged { .. } => AppError::ConflictError {
                code: "price_changed",
                message,
            },
            AvailabilityError::SlotUnavailable => AppError::ConflictError {
                code: "slot_unavailable",
                message,
            },
            AvailabilityError::Timeout | AvailabilityError::Aborted => {
                AppError::GatewayTimeout(message)
            }
            AvailabilityError::Other { .. } => AppError::UpstreamError {
                code: "availability",
                message,
            },
            AvailabilityError::Store(e) => e.into(),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.user_message();
        match err {
            OrderError::MissingRequiredInfo => AppError::ConflictError {
                code: "missing_required_info",
                message,
            },
            OrderError::CutoffPassed => AppError::ConflictError {
                code: "cutoff_passed",
                message,
            },
            OrderError::Network(_) => AppError::GatewayTimeout(message),
            OrderError::Other { .. } => AppError::UpstreamError {
                code: "order",
                message,
            },
            OrderError::Store(e) => e.into(),
        }
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        let message = err.user_message();
        match err {
            SubmitError::Validation(fields) => AppError::ValidationError { message, fields },
            SubmitError::AlreadySubmitting => AppError::ConflictError {
                code: "already_submitting",
                message,
            },
            SubmitError::NotSubmittable(_) => AppError::ConflictError {
                code: "not_submittable",
                message,
            },
            SubmitError::Availability(e) => e.into(),
            SubmitError::Order(e) => e.into(),
            SubmitError::Store(e) => e.into(),
        }
    }
}

impl From<ConfirmError> for AppError {
    fn from(err: ConfirmError) -> Self {
        let message = err.user_message();
        match err {
            ConfirmError::OrderNotResolved => AppError::ConflictError {
                code: "order_not_resolved",
                message,
            },
            ConfirmError::DraftReplaced => AppError::ConflictError {
                code: "draft_replaced",
                message,
            },
            ConfirmError::Validation(fields) => AppError::ValidationError { message, fields },
            ConfirmError::Submit(e) => e.into(),
            ConfirmError::Order(e) => e.into(),
            ConfirmError::Payment(tourbook_core::PaymentError::Network(_)) => {
                AppError::GatewayTimeout(message)
            }
            ConfirmError::Payment(_) => AppError::UpstreamError {
                code: "payment",
                message,
            },
            ConfirmError::Store(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let price: AppError = SubmitError::Availability(AvailabilityError::PriceChanged {
            new_price: 42.0,
        })
        .into();
        assert_eq!(price.into_response().status(), StatusCode::CONFLICT);

        let timeout: AppError = VoucherError::Timeout.into();
        assert_eq!(timeout.into_response().status(), StatusCode::GATEWAY_TIMEOUT);

        let aborted: AppError = VoucherError::Aborted.into();
        assert_eq!(aborted.into_response().status(), StatusCode::GATEWAY_TIMEOUT);

        let missing: AppError = StoreError::Missing("pendingBooking".into()).into();
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let backend: AppError = StoreError::Backend("down".into()).into();
        assert_eq!(
            backend.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
