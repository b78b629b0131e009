//! REST integration test macro for storage backends.
//!
//! The `rest_integration_tests!` macro generates HTTP-level tests that validate
//! an `OrderStore` through full REST round-trips:
//! JSON → HTTP request → handler → OrderService → store → HTTP response → JSON.

/// Generate a REST integration test suite for a storage backend.
///
/// `$store_factory` must produce an `impl OrderStore + 'static` with empty tables.
///
/// # Generated Tests
///
/// ## CRUD
/// - `test_rest_create`: POST 201 + created order
/// - `test_rest_get`: GET 200 + `{data: order}`
/// - `test_rest_list`: GET 200 + `{data: [orders]}` in id order
/// - `test_rest_update`: PUT 200 + replaced item set
/// - `test_rest_update_repeated_item_id_keeps_last_entry`: one item, last entry's fields
/// - `test_rest_delete`: DELETE 204, then GET reports not found
/// - `test_rest_create_update_get_scenario`: create, empty the items, read back
///
/// ## Error handling
/// - body, date, not-found and ownership failures with their status codes
#[macro_export]
macro_rules! rest_integration_tests {
    ($store_factory:expr) => {
        mod rest_integration_tests {
            use super::*;
            use axum::http::StatusCode;
            use axum_test::TestServer;
            use serde_json::{Value, json};

            async fn make_server() -> TestServer {
                let store = $store_factory;
                storage_harness::integration::build_test_server(store)
            }

            async fn create(server: &TestServer, customer: &str, items: Value) -> Value {
                let response = server
                    .post("/orders")
                    .json(&order_body(customer, "2023-01-01T00:00:00Z", items))
                    .await;
                response.assert_status(StatusCode::CREATED);
                response.json::<Value>()
            }

            // ==============================================================
            // CRUD
            // ==============================================================

            #[tokio::test]
            async fn test_rest_create() {
                let server = make_server().await;

                let body = create(
                    &server,
                    "Alice",
                    json!([item_body("A1", 2), item_body("B2", 1)]),
                )
                .await;

                assert!(body["id"].as_i64().is_some());
                assert_eq!(body["customer_name"], "Alice");
                assert_eq!(body["ordered_at"], "2023-01-01T00:00:00Z");
                assert!(body["created_at"].is_string());
                assert!(body["updated_at"].is_string());

                let items = body["items"].as_array().unwrap();
                assert_eq!(items.len(), 2);
                assert_ne!(items[0]["id"], items[1]["id"]);
                for item in items {
                    assert_eq!(item["order_id"], body["id"]);
                }
                assert_eq!(items[0]["item_code"], "A1");
                assert_eq!(items[0]["quantity"], 2);
            }

            #[tokio::test]
            async fn test_rest_create_with_offset_date_normalizes_to_utc() {
                let server = make_server().await;

                let response = server
                    .post("/orders")
                    .json(&order_body("Alice", "2023-01-01T07:00:00+07:00", json!([])))
                    .await;
                response.assert_status(StatusCode::CREATED);
                assert_eq!(response.json::<Value>()["ordered_at"], "2023-01-01T00:00:00Z");
            }

            #[tokio::test]
            async fn test_rest_get() {
                let server = make_server().await;
                let created = create(&server, "Bob", json!([item_body("B1", 4)])).await;

                let response = server.get(&format!("/orders/{}", created["id"])).await;
                response.assert_status_ok();

                let body: Value = response.json();
                assert_eq!(body["data"], created);
            }

            #[tokio::test]
            async fn test_rest_list() {
                let server = make_server().await;
                let first = create(&server, "Alice", json!([item_body("A1", 1)])).await;
                let second = create(&server, "Bob", json!([])).await;

                let response = server.get("/orders").await;
                response.assert_status_ok();

                let body: Value = response.json();
                let data = body["data"].as_array().unwrap();
                assert_eq!(data.len(), 2);
                assert_eq!(data[0], first);
                assert_eq!(data[1], second);
            }

            #[tokio::test]
            async fn test_rest_list_empty() {
                let server = make_server().await;
                let body: Value = server.get("/orders").await.json();
                assert_eq!(body, json!({ "data": [] }));
            }

            #[tokio::test]
            async fn test_rest_update() {
                let server = make_server().await;
                let created = create(
                    &server,
                    "Alice",
                    json!([item_body("A1", 1), item_body("A2", 2), item_body("A3", 3)]),
                )
                .await;
                let kept_id = created["items"][0]["id"].clone();

                let response = server
                    .put(&format!("/orders/{}", created["id"]))
                    .json(&order_body(
                        "Alice Cooper",
                        "2024-05-05T12:00:00Z",
                        json!([
                            {"id": kept_id, "item_code": "A1", "description": "kept", "quantity": 10},
                            {"id": 0, "item_code": "N1", "description": "new", "quantity": 0}
                        ]),
                    ))
                    .await;
                response.assert_status_ok();

                let body: Value = response.json();
                assert_eq!(body["id"], created["id"]);
                assert_eq!(body["customer_name"], "Alice Cooper");
                assert_eq!(body["ordered_at"], "2024-05-05T12:00:00Z");
                let items = body["items"].as_array().unwrap();
                assert_eq!(items.len(), 2);
                assert_eq!(items[0]["id"], kept_id);
                assert_eq!(items[0]["quantity"], 10);
                assert_eq!(items[1]["quantity"], 0);

                let reread: Value = server.get(&format!("/orders/{}", created["id"])).await.json();
                assert_eq!(reread["data"]["items"], body["items"]);
            }

            #[tokio::test]
            async fn test_rest_update_repeated_item_id_keeps_last_entry() {
                let server = make_server().await;
                let created = create(&server, "Alice", json!([item_body("A1", 1)])).await;
                let item_id = created["items"][0]["id"].clone();
                let path = format!("/orders/{}", created["id"]);

                let response = server
                    .put(&path)
                    .json(&order_body(
                        "Alice",
                        "2023-01-01T00:00:00Z",
                        json!([
                            {"id": item_id, "item_code": "A1", "description": "first", "quantity": 2},
                            {"id": item_id, "item_code": "A1", "description": "second", "quantity": 3}
                        ]),
                    ))
                    .await;
                response.assert_status_ok();

                let body: Value = response.json();
                let items = body["items"].as_array().unwrap();
                assert_eq!(items.len(), 1);
                assert_eq!(items[0]["id"], item_id);
                assert_eq!(items[0]["description"], "second");
                assert_eq!(items[0]["quantity"], 3);

                let reread: Value = server.get(&path).await.json();
                assert_eq!(reread["data"]["items"], body["items"]);
            }

            #[tokio::test]
            async fn test_rest_delete() {
                let server = make_server().await;
                let created = create(&server, "Alice", json!([item_body("A1", 1)])).await;
                let path = format!("/orders/{}", created["id"]);

                let response = server.delete(&path).await;
                response.assert_status(StatusCode::NO_CONTENT);
                assert!(response.as_bytes().is_empty());

                // Not-found on GET is a 400 on this route
                let response = server.get(&path).await;
                response.assert_status_bad_request();
                assert_eq!(response.json::<Value>()["code"], "ENTITY_NOT_FOUND");

                server.delete(&path).await.assert_status_not_found();
            }

            #[tokio::test]
            async fn test_rest_create_update_get_scenario() {
                let server = make_server().await;

                let response = server
                    .post("/orders")
                    .json(&json!({
                        "ordered_at": "2023-01-01T00:00:00Z",
                        "customer_name": "Alice",
                        "items": [{"item_code": "A1", "description": "Widget", "quantity": 2}]
                    }))
                    .await;
                response.assert_status(StatusCode::CREATED);
                let created: Value = response.json();
                assert_eq!(created["items"][0]["quantity"], 2);
                let path = format!("/orders/{}", created["id"]);

                let response = server
                    .put(&path)
                    .json(&json!({
                        "ordered_at": "2023-01-01T00:00:00Z",
                        "customer_name": "Alice",
                        "items": []
                    }))
                    .await;
                response.assert_status_ok();
                assert_eq!(response.json::<Value>()["items"], json!([]));

                let response = server.get(&path).await;
                response.assert_status_ok();
                assert_eq!(response.json::<Value>()["data"]["items"], json!([]));
            }

            // ==============================================================
            // Error handling
            // ==============================================================

            #[tokio::test]
            async fn test_rest_create_missing_field_is_400() {
                let server = make_server().await;
                let response = server
                    .post("/orders")
                    .json(&json!({"customer_name": "Alice", "items": []}))
                    .await;
                response.assert_status_bad_request();
                assert_eq!(response.json::<Value>()["code"], "INVALID_BODY");
            }

            #[tokio::test]
            async fn test_rest_create_missing_items_is_400() {
                let server = make_server().await;
                let response = server
                    .post("/orders")
                    .json(&json!({"ordered_at": "2023-01-01T00:00:00Z", "customer_name": "Alice"}))
                    .await;
                response.assert_status_bad_request();
            }

            #[tokio::test]
            async fn test_rest_create_negative_quantity_is_400() {
                let server = make_server().await;
                let response = server
                    .post("/orders")
                    .json(&order_body(
                        "Alice",
                        "2023-01-01T00:00:00Z",
                        json!([item_body("A1", -1)]),
                    ))
                    .await;
                response.assert_status_bad_request();

                let body: Value = response.json();
                assert_eq!(body["code"], "VALIDATION_ERROR");
                assert_eq!(body["details"]["fields"][0]["field"], "items[0].quantity");
            }

            #[tokio::test]
            async fn test_rest_create_bad_date_is_400() {
                let server = make_server().await;
                let response = server
                    .post("/orders")
                    .json(&order_body("Alice", "01/01/2023", json!([])))
                    .await;
                response.assert_status_bad_request();
                assert_eq!(response.json::<Value>()["code"], "INVALID_DATE");

                let body: Value = server.get("/orders").await.json();
                assert_eq!(body["data"], json!([]));
            }

            #[tokio::test]
            async fn test_rest_create_without_json_content_type_is_400() {
                let server = make_server().await;
                let response = server
                    .post("/orders")
                    .text(r#"{"ordered_at":"2023-01-01T00:00:00Z","customer_name":"A","items":[]}"#)
                    .await;
                response.assert_status_bad_request();
            }

            #[tokio::test]
            async fn test_rest_get_unknown_and_non_integer_ids_are_400() {
                let server = make_server().await;
                server.get("/orders/424242").await.assert_status_bad_request();
                server.get("/orders/abc").await.assert_status_bad_request();
            }

            #[tokio::test]
            async fn test_rest_update_unknown_order_is_404() {
                let server = make_server().await;
                let response = server
                    .put("/orders/424242")
                    .json(&order_body("Alice", "2023-01-01T00:00:00Z", json!([])))
                    .await;
                response.assert_status_not_found();
            }

            #[tokio::test]
            async fn test_rest_update_bad_date_is_500_and_changes_nothing() {
                let server = make_server().await;
                let created = create(&server, "Alice", json!([item_body("A1", 1)])).await;
                let path = format!("/orders/{}", created["id"]);

                let response = server
                    .put(&path)
                    .json(&order_body("Mallory", "not-a-date", json!([])))
                    .await;
                response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(response.json::<Value>()["code"], "INVALID_DATE");

                let reread: Value = server.get(&path).await.json();
                assert_eq!(reread["data"], created);
            }

            #[tokio::test]
            async fn test_rest_update_malformed_body_is_400() {
                let server = make_server().await;
                let created = create(&server, "Alice", json!([])).await;

                let response = server
                    .put(&format!("/orders/{}", created["id"]))
                    .json(&json!({"customer_name": 5}))
                    .await;
                response.assert_status_bad_request();
            }

            #[tokio::test]
            async fn test_rest_update_foreign_item_is_409() {
                let server = make_server().await;
                let first = create(&server, "Alice", json!([item_body("A1", 1)])).await;
                let second = create(&server, "Bob", json!([item_body("B1", 1)])).await;
                let second_path = format!("/orders/{}", second["id"]);

                let response = server
                    .put(&second_path)
                    .json(&order_body(
                        "Bob",
                        "2023-01-01T00:00:00Z",
                        json!([{
                            "id": first["items"][0]["id"],
                            "item_code": "X",
                            "description": "taken",
                            "quantity": 1
                        }]),
                    ))
                    .await;
                response.assert_status(StatusCode::CONFLICT);
                assert_eq!(response.json::<Value>()["code"], "ITEM_OWNED_BY_OTHER_ORDER");

                let reread: Value = server.get(&second_path).await.json();
                assert_eq!(reread["data"], second);
                let reread: Value = server.get(&format!("/orders/{}", first["id"])).await.json();
                assert_eq!(reread["data"], first);
            }

            #[tokio::test]
            async fn test_rest_delete_unknown_order_is_404() {
                let server = make_server().await;
                server.delete("/orders/424242").await.assert_status_not_found();
                server.delete("/orders/abc").await.assert_status_not_found();
            }

            #[tokio::test]
            async fn test_rest_health() {
                let server = make_server().await;
                let body: Value = server.get("/health").await.json();
                assert_eq!(body, json!({"status": "ok", "service": "orders-rs"}));
            }
        }
    };
}
