pub mod cancel;
pub mod error;
pub mod payment;
pub mod repository;
pub mod supplier;
pub mod voucher;

pub use cancel::{cancel_pair, CallContext, CancelHandle, CancelToken};
pub use error::{
    AvailabilityError, FieldError, GatewayError, NetworkError, OrderError, PaymentError,
    StoreError, ValidationErrors, VoucherError,
};
pub use repository::DraftStore;
