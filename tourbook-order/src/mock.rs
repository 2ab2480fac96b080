//! In-process supplier used for local runs and tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tourbook_core::payment::{CheckoutData, PaymentGateway, PaymentIntentRequest};
use tourbook_core::supplier::{
    ApiEnvelope, AvailabilityRequest, CreateOrderRequest, CreatedOrder, ExtraInfoData,
    ExtraInfoField, ExtraInfoItem, OrderRecord, SupplierGateway,
};
use tourbook_core::voucher::{VoucherData, VoucherGateway, VoucherRequest};
use tourbook_core::GatewayError;

use crate::extra_info::PICKUP_LOCATION_KEY;

/// Number of calls each endpoint received
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockCalls {
    pub availability: usize,
    pub extra_info: usize,
    pub create_order: usize,
    pub fetch_order: usize,
    pub voucher: usize,
    pub payment: usize,
}

struct MockState {
    availability: VecDeque<Result<ApiEnvelope<Value>, GatewayError>>,
    extra_info: Result<ApiEnvelope<ExtraInfoData>, GatewayError>,
    order_failures: VecDeque<Result<ApiEnvelope<CreatedOrder>, GatewayError>>,
    vouchers: HashMap<String, f64>,
    payment_failure: Option<ApiEnvelope<CheckoutData>>,
    orders: HashMap<String, OrderRecord>,
    order_requests: Vec<CreateOrderRequest>,
    payment_requests: Vec<PaymentIntentRequest>,
    calls: MockCalls,
    delay: Option<Duration>,
}

/// Scriptable supplier, voucher and payment endpoints.
///
/// Availability succeeds unless a response was queued. Orders are keyed by
/// `agent_order_id`, so creating twice under one id returns the same order
/// number like the real supplier. The voucher code `SAVE10` is worth 10.00.
pub struct MockSupplier {
    state: Mutex<MockState>,
}

impl Default for MockSupplier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSupplier {
    pub fn new() -> Self {
        let pickup = ExtraInfoField {
            key: PICKUP_LOCATION_KEY.to_string(),
            name: "Pickup location".to_string(),
            input_type: "select".to_string(),
            options: Some(vec![json!("MEETING_POINT"), json!("HOTEL_LOBBY")]),
            required: true,
        };
        Self {
            state: Mutex::new(MockState {
                availability: VecDeque::new(),
                extra_info: Ok(ApiEnvelope::ok(ExtraInfoData {
                    items: vec![ExtraInfoItem {
                        booking_extra_info: vec![pickup],
                    }],
                })),
                order_failures: VecDeque::new(),
                vouchers: HashMap::from([("SAVE10".to_string(), 10.0)]),
                payment_failure: None,
                orders: HashMap::new(),
                order_requests: Vec::new(),
                payment_requests: Vec::new(),
                calls: MockCalls::default(),
                delay: None,
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue the next availability response
    pub fn push_availability(&self, response: Result<ApiEnvelope<Value>, GatewayError>) {
        self.state().availability.push_back(response);
    }

    pub fn set_extra_info(&self, response: Result<ApiEnvelope<ExtraInfoData>, GatewayError>) {
        self.state().extra_info = response;
    }

    /// Queue a failure for the next create call
    pub fn push_order_failure(&self, response: Result<ApiEnvelope<CreatedOrder>, GatewayError>) {
        self.state().order_failures.push_back(response);
    }

    pub fn add_voucher(&self, code: &str, amount: f64) {
        self.state().vouchers.insert(code.to_string(), amount);
    }

    pub fn fail_payments(&self, code: &str, message: &str) {
        self.state().payment_failure = Some(ApiEnvelope::failure(code, message));
    }

    /// Every call sleeps this long first
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    pub fn calls(&self) -> MockCalls {
        self.state().calls
    }

    pub fn order_requests(&self) -> Vec<CreateOrderRequest> {
        self.state().order_requests.clone()
    }

    pub fn payment_requests(&self) -> Vec<PaymentIntentRequest> {
        self.state().payment_requests.clone()
    }

    async fn pause(&self) {
        let delay = self.state().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SupplierGateway for MockSupplier {
    async fn check_availability(
        &self,
        _request: &AvailabilityRequest,
    ) -> Result<ApiEnvelope<Value>, GatewayError> {
        self.pause().await;
        let mut state = self.state();
        state.calls.availability += 1;
        state
            .availability
            .pop_front()
            .unwrap_or_else(|| Ok(ApiEnvelope::ok(json!({ "available": true }))))
    }

    async fn fetch_extra_info(
        &self,
        _package_id: u64,
    ) -> Result<ApiEnvelope<ExtraInfoData>, GatewayError> {
        self.pause().await;
        let mut state = self.state();
        state.calls.extra_info += 1;
        state.extra_info.clone()
    }

    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<ApiEnvelope<CreatedOrder>, GatewayError> {
        self.pause().await;
        let mut state = self.state();
        state.calls.create_order += 1;
        state.order_requests.push(request.clone());
        if let Some(failure) = state.order_failures.pop_front() {
            return failure;
        }

        if let Some(existing) = state.orders.get(&request.agent_order_id) {
            return Ok(ApiEnvelope::ok(CreatedOrder {
                klook_order_no: existing.klktech_order_id.clone(),
            }));
        }

        let klook_order_no = format!("KLK-{}", state.orders.len() + 1);
        let total_amount: f64 = request
            .items
            .iter()
            .flat_map(|item| item.sku_list.iter())
            .map(|sku| sku.price * f64::from(sku.count))
            .sum();
        let skus: Vec<Value> = request
            .items
            .iter()
            .flat_map(|item| item.sku_list.iter())
            .map(|sku| json!({ "sku_id": sku.sku_id, "count": sku.count, "price": sku.price }))
            .collect();
        state.orders.insert(
            request.agent_order_id.clone(),
            OrderRecord {
                klktech_order_id: klook_order_no.clone(),
                agent_order_id: request.agent_order_id.clone(),
                confirm_status: "confirmed".to_string(),
                transaction_status: "unpaid".to_string(),
                total_amount,
                currency: "USD".to_string(),
                bookings: request
                    .items
                    .iter()
                    .map(|item| json!({ "package_id": item.package_id, "start_time": item.start_time }))
                    .collect(),
                skus,
            },
        );
        Ok(ApiEnvelope::ok(CreatedOrder { klook_order_no }))
    }

    async fn fetch_order(&self, order_no: &str) -> Result<ApiEnvelope<OrderRecord>, GatewayError> {
        self.pause().await;
        let mut state = self.state();
        state.calls.fetch_order += 1;
        Ok(state
            .orders
            .values()
            .find(|o| o.klktech_order_id == order_no)
            .cloned()
            .map(ApiEnvelope::ok)
            .unwrap_or_else(|| ApiEnvelope::failure("1404", "Order not found")))
    }
}

#[async_trait]
impl VoucherGateway for MockSupplier {
    async fn apply_voucher(
        &self,
        request: &VoucherRequest,
    ) -> Result<ApiEnvelope<VoucherData>, GatewayError> {
        self.pause().await;
        let mut state = self.state();
        state.calls.voucher += 1;
        Ok(match state.vouchers.get(&request.code) {
            Some(&amount) => ApiEnvelope::ok(VoucherData { amount }),
            None => ApiEnvelope::failure("4001", "Voucher code is invalid or expired"),
        })
    }
}

#[async_trait]
impl PaymentGateway for MockSupplier {
    async fn create_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<ApiEnvelope<CheckoutData>, GatewayError> {
        self.pause().await;
        let mut state = self.state();
        state.calls.payment += 1;
        state.payment_requests.push(request.clone());
        if let Some(failure) = state.payment_failure.clone() {
            return Ok(failure);
        }
        Ok(ApiEnvelope::ok(CheckoutData {
            checkout_url: format!("https://checkout.mock/{}", request.order_id),
        }))
    }
}
