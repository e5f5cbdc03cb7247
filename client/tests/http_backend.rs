//! Wire-level tests of the admin client against a mock REST backend.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use marketplace_admin_client::{AdminClient, ClientConfig, ClientError};
use order_lifecycle::{
    AdminBackend, BackendError, OrderFilters, OrderId, OrderQuery, OrderStatus, PaymentFilters,
    PaymentId, PaymentQuery, PaymentStatus, PayoutStatus, QueryChange, SortDirection,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> AdminClient {
    AdminClient::new(ClientConfig::new("admin-token").with_base_url(server.uri())).unwrap()
}

fn payment_json(status: &str, payout: &str) -> serde_json::Value {
    json!({
        "_id": "p-1",
        "status": status,
        "payoutStatus": payout,
        "amount": 150.0,
        "freelancerAmount": 135.0,
        "platformFees": 15.0,
        "order": {
            "_id": "o-1",
            "freelancer": {"_id": "f-1", "name": "Bo", "payoutDestinationConfigured": true}
        }
    })
}

#[tokio::test]
async fn status_update_sends_bit_exact_status_and_reads_the_echo() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/orders/o-1/status"))
        .and(header("authorization", "Bearer admin-token"))
        .and(body_json(json!({"status": "in_progress"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Order status updated",
            "order": {"_id": "o-1", "status": "accepted"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let echo = client_for(&server)
        .update_order_status(&OrderId::new("o-1"), OrderStatus::InProgress)
        .await
        .unwrap();

    assert_eq!(echo.status, OrderStatus::Accepted);
}

#[tokio::test]
async fn rejected_transition_maps_to_backend_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/orders/o-1/status"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid status transition"})),
        )
        .mount(&server)
        .await;

    let error = AdminBackend::update_order_status(
        &client_for(&server),
        &OrderId::new("o-1"),
        OrderStatus::Pending,
    )
    .await
    .unwrap_err();

    assert_eq!(
        error,
        BackendError::Rejected {
            status: 400,
            message: "Invalid status transition".to_string(),
        }
    );
}

#[tokio::test]
async fn unauthorized_and_not_found_are_distinguished() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/payments/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Payment not found"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/payments/release/p-1"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Admin access required"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(matches!(
        client.fetch_payment(&PaymentId::new("missing")).await,
        Err(ClientError::NotFound(message)) if message == "Payment not found"
    ));
    assert!(matches!(
        client.release_payment(&PaymentId::new("p-1")).await,
        Err(ClientError::Unauthorized(message)) if message == "Admin access required"
    ));
}

#[tokio::test]
async fn malformed_body_is_a_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let error = AdminBackend::list_orders(&client_for(&server), &OrderQuery::default())
        .await
        .unwrap_err();

    assert!(matches!(error, BackendError::InvalidResponse(_)));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_failure() {
    let client = AdminClient::new(
        ClientConfig::new("admin-token")
            .with_base_url("http://127.0.0.1:1")
            .with_timeout(std::time::Duration::from_secs(2)),
    )
    .unwrap();

    let error = AdminBackend::fetch_payment(&client, &PaymentId::new("p-1"))
        .await
        .unwrap_err();

    assert!(matches!(error, BackendError::Transport(_)));
}

#[tokio::test]
async fn order_list_query_omits_empty_search_and_unset_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/orders"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .and(query_param("sortBy", "createdAt"))
        .and(query_param("order", "desc"))
        .and(query_param_is_missing("search"))
        .and(query_param_is_missing("status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orders": [{
                "_id": "o-1",
                "status": "pending",
                "paymentStatus": "unpaid",
                "price": 49.99,
                "client": {"_id": "c-1", "name": "Ana"},
                "freelancer": "f-1"
            }],
            "pagination": {"page": 1, "pages": 3, "total": 21}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server)
        .list_orders(&OrderQuery::default())
        .await
        .unwrap();

    assert_eq!(page.orders.len(), 1);
    assert_eq!(page.orders[0].price.cents(), 4999);
    assert_eq!(page.pagination.pages, 3);
}

#[tokio::test]
async fn filtered_queries_carry_filters_and_sort() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/orders"))
        .and(query_param("search", "logo"))
        .and(query_param("status", "in_progress"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"orders": [], "pagination": {"page": 1, "pages": 1, "total": 0}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/payments"))
        .and(query_param("status", "succeeded"))
        .and(query_param("payoutStatus", "pending"))
        .and(query_param("sortBy", "amount"))
        .and(query_param("order", "asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payments": [payment_json("succeeded", "pending")],
            "pagination": {"page": 1, "pages": 1, "total": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let orders = OrderQuery::default()
        .apply(QueryChange::Search("logo".to_string()))
        .apply(QueryChange::Filters(OrderFilters {
            status: Some(OrderStatus::InProgress),
        }));
    client.list_orders(&orders).await.unwrap();

    let payments = PaymentQuery::default()
        .apply(QueryChange::Filters(PaymentFilters {
            status: Some(PaymentStatus::Succeeded),
            payout_status: Some(PayoutStatus::Pending),
        }))
        .apply(QueryChange::Sort {
            by: "amount".to_string(),
            order: SortDirection::Asc,
        });
    let page = client.list_payments(&payments).await.unwrap();
    assert!(page.payments[0].order.freelancer.payout_destination_configured);
}

#[tokio::test]
async fn release_posts_an_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/payments/p-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"payment": payment_json("succeeded", "pending")})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/payments/release/p-1"))
        .and(header("authorization", "Bearer admin-token"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let id = PaymentId::new("p-1");
    let fresh = client.fetch_payment(&id).await.unwrap();
    assert_eq!(fresh.status, PaymentStatus::Succeeded);
    assert!(order_lifecycle::can_release(&fresh));

    client.release_payment(&id).await.unwrap();
}
