//! Integration tests for the typed inventory endpoints

use serde_json::json;
use stockroom_http::Gateway;
use stockroom_http::client::ClientError;
use stockroom_http::types::{LoginRequest, MovementKind, NewProduct, TransferRequest};
use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn product_json() -> serde_json::Value {
    json!({
        "id": "p-1",
        "name": "Arroz 5kg",
        "sku": "ARZ-5",
        "unit": "un",
        "price": 27.9,
        "minStock": 10
    })
}

#[tokio::test]
async fn test_list_and_get_products() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json()])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_json()))
        .mount(&server)
        .await;

    let gateway = Gateway::new(server.uri()).unwrap();

    let products = gateway.products().list().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].sku, "ARZ-5");
    assert_eq!(products[0].min_stock, Some(10.0));

    let product = gateway.products().get("p-1").await.unwrap();
    assert_eq!(product.name, "Arroz 5kg");
}

#[tokio::test]
async fn test_create_product_sends_camel_case_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/products"))
        .and(body_json(json!({
            "name": "Arroz 5kg",
            "sku": "ARZ-5",
            "unit": "un",
            "minStock": 10.0
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(product_json()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Gateway::new(server.uri()).unwrap();
    let created = gateway
        .products()
        .create(&NewProduct {
            name: "Arroz 5kg".to_string(),
            sku: "ARZ-5".to_string(),
            description: None,
            category: None,
            unit: "un".to_string(),
            price: None,
            min_stock: Some(10.0),
        })
        .await
        .unwrap();

    assert_eq!(created.id, "p-1");
    server.verify().await;
}

#[tokio::test]
async fn test_delete_accepts_no_content() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/warehouses/w-2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Gateway::new(server.uri()).unwrap();
    gateway.warehouses().delete("w-2").await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn test_transfer_and_filtered_movements() {
    let server = MockServer::start().await;

    let movement = json!({
        "id": "m-7",
        "kind": "transfer",
        "productId": "p-1",
        "fromWarehouseId": "w-1",
        "toWarehouseId": "w-2",
        "quantity": 4,
        "createdAt": "2024-07-10T12:00:00Z"
    });

    Mock::given(method("POST"))
        .and(path("/movements/transfer"))
        .and(body_string_contains("\"toWarehouseId\":\"w-2\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(movement.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movements"))
        .and(query_param("kind", "transfer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([movement])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Gateway::new(server.uri()).unwrap();

    let recorded = gateway
        .movements()
        .transfer(&TransferRequest {
            product_id: "p-1".to_string(),
            batch_id: None,
            from_warehouse_id: "w-1".to_string(),
            to_warehouse_id: "w-2".to_string(),
            quantity: 4.0,
            note: None,
        })
        .await
        .unwrap();
    assert_eq!(recorded.kind, MovementKind::Transfer);

    let transfers = gateway
        .movements()
        .list_kind(MovementKind::Transfer)
        .await
        .unwrap();
    assert_eq!(transfers.len(), 1);

    server.verify().await;
}

#[tokio::test]
async fn test_upload_product_image() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/products/p-1/image"))
        .and(body_string_contains("filename=\"arroz.png\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_json()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Gateway::new(server.uri()).unwrap();
    let product = gateway
        .products()
        .upload_image("p-1", "arroz.png", "image/png", b"fake png data".to_vec())
        .await
        .unwrap();

    assert_eq!(product.id, "p-1");
    server.verify().await;
}

#[tokio::test]
async fn test_login_returns_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "ana@example.com", "password": "s3nha"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u-1",
            "name": "Ana Souza",
            "email": "ana@example.com",
            "role": "admin"
        })))
        .mount(&server)
        .await;

    let gateway = Gateway::new(server.uri()).unwrap();
    let session = gateway
        .login(&LoginRequest {
            email: "ana@example.com".to_string(),
            password: "s3nha".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(session.user_id, "u-1");
    assert_eq!(session.role.as_deref(), Some("admin"));
}

#[tokio::test]
async fn test_undecodable_body_is_a_serialization_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let gateway = Gateway::new(server.uri()).unwrap();
    let err = gateway.roles().list().await.unwrap_err();
    assert!(matches!(err, ClientError::Serialization(_)));
}
