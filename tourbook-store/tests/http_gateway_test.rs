use serde_json::json;
use tourbook_core::payment::{PaymentGateway, PaymentIntentRequest};
use tourbook_core::supplier::{AvailabilityRequest, SkuLine, SupplierGateway};
use tourbook_core::voucher::{VoucherGateway, VoucherRequest};
use tourbook_core::GatewayError;
use tourbook_store::SupplierHttpClient;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn availability_request() -> AvailabilityRequest {
    AvailabilityRequest {
        package_id: 42,
        start_time: "2026-11-02 09:00:00".to_string(),
        sku_list: vec![SkuLine {
            sku_id: 7,
            count: 3,
            price: 100.0,
        }],
    }
}

#[tokio::test]
async fn test_availability_posts_request_with_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/availability"))
        .and(header("X-Api-Key", "secret"))
        .and(body_json(json!({
            "package_id": 42,
            "start_time": "2026-11-02 09:00:00",
            "sku_list": [{ "sku_id": 7, "count": 3, "price": 100.0 }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "available": true }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SupplierHttpClient::new(&server.uri(), Some("secret".to_string()));
    let env = client
        .check_availability(&availability_request())
        .await
        .unwrap();
    assert!(env.success);
    assert_eq!(env.data, Some(json!({ "available": true })));
}

#[tokio::test]
async fn test_failure_envelope_on_4xx_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/availability"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "error": { "code": "1103", "message": "Cut-off time passed" }
        })))
        .mount(&server)
        .await;

    let client = SupplierHttpClient::new(&server.uri(), None);
    let env = client
        .check_availability(&availability_request())
        .await
        .unwrap();
    assert!(!env.success);
    assert_eq!(env.error_code(), Some("1103"));
}

#[tokio::test]
async fn test_non_envelope_error_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/KLK-1"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = SupplierHttpClient::new(&server.uri(), None);
    let err = client.fetch_order("KLK-1").await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(msg) if msg.contains("502")));
}

#[tokio::test]
async fn test_extra_info_and_order_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/otherinfo/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "items": [{ "booking_extra_info": [
                { "key": "pickup_location", "name": "Pickup", "input_type": "select",
                  "options": ["HOTEL"], "required": true }
            ]}]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders/KLK-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "klktech_order_id": "KLK-9",
                "agent_order_id": "TB-1",
                "confirm_status": "confirmed",
                "transaction_status": "unpaid",
                "total_amount": 300.0,
                "currency": "USD",
                "bookings": [],
                "skus": []
            }
        })))
        .mount(&server)
        .await;

    let client = SupplierHttpClient::new(&format!("{}/", server.uri()), None);

    let info = client.fetch_extra_info(42).await.unwrap();
    let fields = &info.data.unwrap().items[0].booking_extra_info;
    assert_eq!(fields[0].key, "pickup_location");
    assert!(fields[0].required);

    let order = client.fetch_order("KLK-9").await.unwrap().data.unwrap();
    assert_eq!(order.klktech_order_id, "KLK-9");
    assert_eq!(order.total_amount, 300.0);
}

#[tokio::test]
async fn test_voucher_and_payment_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vouchers/apply"))
        .and(body_json(json!({
            "code": "SAVE10",
            "service_type": "activity",
            "service_id": 5,
            "total": 345.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "amount": 10.0 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/payments/intents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "checkout_url": "https://pay.test/c/abc" }
        })))
        .mount(&server)
        .await;

    let client = SupplierHttpClient::new(&server.uri(), None);

    let voucher = client
        .apply_voucher(&VoucherRequest {
            code: "SAVE10".to_string(),
            service_type: "activity".to_string(),
            service_id: 5,
            total: 345.0,
        })
        .await
        .unwrap();
    assert_eq!(voucher.data.unwrap().amount, 10.0);

    let intent = client
        .create_intent(&PaymentIntentRequest {
            order_id: "KLK-9".to_string(),
            agent_order_id: "TB-1".to_string(),
            amount: 335.0,
            currency: "USD".to_string(),
            customer_email: "ana@example.com".to_string(),
            customer_name: "Ana Silva".to_string(),
            booking_data: json!({}),
        })
        .await
        .unwrap();
    assert_eq!(intent.data.unwrap().checkout_url, "https://pay.test/c/abc");
}
