use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use crudgrid::{CollectionServer, EntityRecord};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn seeded_server() -> CollectionServer {
    CollectionServer::new()
        .with_collection(
            "users",
            vec![
                EntityRecord::new(1).with("name", "Ada"),
                EntityRecord::new(2).with("name", "Alan"),
            ],
        )
        .await
}

#[tokio::test]
async fn collection_routes_cover_the_crud_cycle() {
    let server = seeded_server().await;
    let router = server.router();

    let listed = router
        .clone()
        .oneshot(empty_request(Method::GET, "/users"))
        .await
        .expect("list response");
    assert_eq!(listed.status(), StatusCode::OK);
    let listed_body = decode_json(listed).await;
    assert_eq!(listed_body.as_array().map(Vec::len), Some(2));

    let created = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/users",
            json!({"id": 0, "name": "Grace"}),
        ))
        .await
        .expect("create response");
    assert_eq!(created.status(), StatusCode::CREATED);
    let created_body = decode_json(created).await;
    assert_eq!(created_body.get("id").and_then(Value::as_i64), Some(3));
    assert_eq!(
        created_body.get("name").and_then(Value::as_str),
        Some("Grace")
    );

    let updated = router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/users/3",
            json!({"name": "Grace Hopper"}),
        ))
        .await
        .expect("update response");
    assert_eq!(updated.status(), StatusCode::OK);

    let fetched = router
        .clone()
        .oneshot(empty_request(Method::GET, "/users/3"))
        .await
        .expect("fetch response");
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(
        decode_json(fetched).await.get("name").and_then(Value::as_str),
        Some("Grace Hopper")
    );

    let deleted = router
        .clone()
        .oneshot(empty_request(Method::DELETE, "/users/1"))
        .await
        .expect("delete response");
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let remaining = server.records("users").await.expect("users collection");
    let ids = remaining.iter().map(|r| r.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
async fn missing_records_and_endpoints_are_not_found() {
    let router = seeded_server().await.router();

    let missing = router
        .clone()
        .oneshot(json_request(Method::PUT, "/users/42", json!({"name": "x"})))
        .await
        .expect("update response");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body = decode_json(missing).await;
    assert_eq!(body.get("code").and_then(Value::as_str), Some("not_found"));

    let gone = router
        .clone()
        .oneshot(empty_request(Method::DELETE, "/users/42"))
        .await
        .expect("delete response");
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let unknown = router
        .clone()
        .oneshot(empty_request(Method::GET, "/orders"))
        .await
        .expect("list response");
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_bodies_are_unprocessable() {
    let router = seeded_server().await.router();

    let not_object = router
        .clone()
        .oneshot(json_request(Method::POST, "/users", json!(["Ada"])))
        .await
        .expect("create response");
    assert_eq!(not_object.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let nested = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/users",
            json!({"name": {"first": "Ada"}}),
        ))
        .await
        .expect("create response");
    assert_eq!(nested.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = decode_json(nested).await;
    assert_eq!(body.get("code").and_then(Value::as_str), Some("input_error"));
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn decode_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    serde_json::from_slice(&bytes).expect("json body")
}
