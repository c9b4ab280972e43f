//! HTTP adapters against a mock server: wire shapes, bearer propagation,
//! trace headers and envelope validation.

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use tracing_test::traced_test;

use todo_sync::contract::model::{Credentials, NewTask, TaskPatch};
use todo_sync::domain::error::DomainError;
use todo_sync::domain::ports::storage::keys;
use todo_sync::domain::ports::{AuthGateway, ImageUploader, KeyValueStore, TaskGateway};
use todo_sync::domain::session::SessionStore;
use todo_sync::infra::http::{ApiClient, HttpAuthGateway, HttpImageUploader, HttpTaskGateway};
use todo_sync::infra::storage::InMemoryStore;

fn client_for(server: &MockServer, storage: Arc<InMemoryStore>, timeout: Duration) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(&server.base_url(), storage, timeout, timeout).unwrap())
}

fn todo_json(id: &str, completed: bool) -> serde_json::Value {
    json!({
        "id": id,
        "userId": "u1",
        "title": "Buy milk",
        "completed": completed,
        "createdAt": "2025-01-01T00:00:00Z",
        "updatedAt": "2025-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn login_posts_credentials_with_trace_header() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/login")
                .header_exists("traceparent")
                .json_body(json!({ "email": "ana@example.com", "password": "pw" }));
            then.status(200).json_body(json!({
                "success": true,
                "data": { "token": "tok-1", "user": { "id": "u1", "email": "ana@example.com" } }
            }));
        })
        .await;

    let storage = Arc::new(InMemoryStore::new());
    let auth = HttpAuthGateway::new(client_for(&server, storage, Duration::from_secs(5)));
    let grant = auth
        .login(&Credentials {
            email: "ana@example.com".into(),
            password: "pw".into(),
        })
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(grant.token.as_deref(), Some("tok-1"));
    assert_eq!(grant.user.unwrap().id.as_deref(), Some("u1"));
}

#[tokio::test]
async fn rejected_login_surfaces_server_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(401)
                .json_body(json!({ "success": false, "error": "Invalid credentials" }));
        })
        .await;

    let storage = Arc::new(InMemoryStore::new());
    let auth = Arc::new(HttpAuthGateway::new(client_for(
        &server,
        storage.clone(),
        Duration::from_secs(5),
    )));
    let session = SessionStore::new(storage.clone(), auth);

    let err = session.login("ana@example.com", "bad").await.unwrap_err();
    assert_eq!(err, DomainError::api(Some(401), "Invalid credentials"));
    assert!(!session.is_authenticated());
    assert!(!storage.contains(keys::AUTH_TOKEN));
}

#[tokio::test]
async fn token_from_login_is_sent_on_later_requests() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200).json_body(json!({
                "success": true,
                "data": { "token": "tok-1", "user": { "id": "u1", "email": "ana@example.com" } }
            }));
        })
        .await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/todos")
                .header("authorization", "Bearer tok-1");
            then.status(200).json_body(json!({
                "success": true,
                "data": [todo_json("t1", false)],
                "count": 1
            }));
        })
        .await;

    let storage = Arc::new(InMemoryStore::new());
    let client = client_for(&server, storage.clone(), Duration::from_secs(5));
    let session = SessionStore::new(storage.clone(), Arc::new(HttpAuthGateway::new(client.clone())));
    session.login("ana@example.com", "pw").await.unwrap();

    let tasks = HttpTaskGateway::new(client).list("u1").await.unwrap();
    list.assert_async().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].owner_id, "u1");
}

#[tokio::test]
async fn rotated_token_is_used_without_restart() {
    let server = MockServer::start_async().await;
    let old = server
        .mock_async(|when, then| {
            when.method(GET).path("/todos").header("authorization", "Bearer old");
            then.status(200).json_body(json!({ "success": true, "data": [] }));
        })
        .await;
    let new = server
        .mock_async(|when, then| {
            when.method(GET).path("/todos").header("authorization", "Bearer new");
            then.status(200).json_body(json!({ "success": true, "data": [] }));
        })
        .await;

    let storage = Arc::new(InMemoryStore::with_entries([(keys::AUTH_TOKEN, "old")]));
    let gateway = HttpTaskGateway::new(client_for(&server, storage.clone(), Duration::from_secs(5)));

    gateway.list("u1").await.unwrap();
    storage.set(keys::AUTH_TOKEN, "new").await.unwrap();
    gateway.list("u1").await.unwrap();

    old.assert_async().await;
    new.assert_async().await;
}

#[tokio::test]
async fn envelope_failures_are_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/todos");
            then.status(200)
                .json_body(json!({ "success": false, "error": "db offline" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/todos/no-data");
            then.status(200).json_body(json!({ "success": true }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/todos/html");
            then.status(200).body("<html>oops</html>");
        })
        .await;

    let gateway = HttpTaskGateway::new(client_for(
        &server,
        Arc::new(InMemoryStore::new()),
        Duration::from_secs(5),
    ));

    assert_eq!(
        gateway.list("u1").await.unwrap_err(),
        DomainError::api(None, "db offline")
    );
    assert!(matches!(
        gateway.get("u1", "no-data").await.unwrap_err(),
        DomainError::MalformedResponse { .. }
    ));
    assert!(matches!(
        gateway.get("u1", "html").await.unwrap_err(),
        DomainError::MalformedResponse { .. }
    ));
}

#[tokio::test]
async fn missing_task_maps_to_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/todos/gone");
            then.status(404)
                .json_body(json!({ "success": false, "error": "Todo not found" }));
        })
        .await;

    let gateway = HttpTaskGateway::new(client_for(
        &server,
        Arc::new(InMemoryStore::new()),
        Duration::from_secs(5),
    ));
    assert_eq!(
        gateway.get("u1", "gone").await.unwrap_err(),
        DomainError::task_not_found("gone")
    );
}

#[tokio::test]
async fn create_update_delete_wire_shapes() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/todos").json_body(json!({
                "title": "Buy milk",
                "completed": false,
                "photoUri": "https://cdn.example.com/a.jpg"
            }));
            then.status(201)
                .json_body(json!({ "success": true, "data": todo_json("t1", false) }));
        })
        .await;
    let update = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/todos/t1")
                .json_body(json!({ "completed": true }));
            then.status(200)
                .json_body(json!({ "success": true, "data": todo_json("t1", true) }));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/todos/t1");
            then.status(200)
                .json_body(json!({ "success": true, "data": todo_json("t1", true) }));
        })
        .await;

    let gateway = HttpTaskGateway::new(client_for(
        &server,
        Arc::new(InMemoryStore::new()),
        Duration::from_secs(5),
    ));

    let created = gateway
        .create(
            "u1",
            NewTask {
                title: "Buy milk".into(),
                photo_uri: Some("https://cdn.example.com/a.jpg".into()),
                location: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(created.id, "t1");

    let patch = TaskPatch {
        completed: Some(true),
        ..Default::default()
    };
    assert!(gateway.update("u1", "t1", &patch).await.unwrap().completed);
    gateway.delete("u1", "t1").await.unwrap();

    create.assert_async().await;
    update.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/todos");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(json!({ "success": true, "data": [] }));
        })
        .await;

    let gateway = HttpTaskGateway::new(client_for(
        &server,
        Arc::new(InMemoryStore::new()),
        Duration::from_millis(100),
    ));
    assert_eq!(gateway.list("u1").await.unwrap_err(), DomainError::Timeout);
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let storage = Arc::new(InMemoryStore::new());
    let client = Arc::new(
        ApiClient::new(
            "http://127.0.0.1:9",
            storage,
            Duration::from_secs(2),
            Duration::from_secs(2),
        )
        .unwrap(),
    );
    let err = HttpTaskGateway::new(client).list("u1").await.unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn upload_sends_multipart_image_part() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shot.png");
    std::fs::write(&path, b"\x89PNG fake").unwrap();

    let server = MockServer::start_async().await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/images")
                .header_exists("traceparent")
                .header_exists("content-type");
            then.status(201).json_body(json!({
                "success": true,
                "data": { "url": "/images/u1/img-9", "imageId": "img-9" }
            }));
        })
        .await;

    let uploader = HttpImageUploader::new(client_for(
        &server,
        Arc::new(InMemoryStore::new()),
        Duration::from_secs(5),
    ));
    let local_ref = format!("file://{}", path.display());
    let uploaded = uploader.upload(&local_ref, None).await.unwrap();

    upload.assert_async().await;
    assert_eq!(uploaded.image_id, "img-9");
    assert_eq!(uploaded.url, format!("{}/images/u1/img-9", server.base_url()));
}

#[tokio::test]
async fn upload_of_missing_file_fails_before_network() {
    let server = MockServer::start_async().await;

    let uploader = HttpImageUploader::new(client_for(
        &server,
        Arc::new(InMemoryStore::new()),
        Duration::from_secs(5),
    ));
    let err = uploader.upload("file:///does/not/exist.jpg", None).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
}

#[tokio::test]
async fn image_url_and_delete() {
    let server = MockServer::start_async().await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/images/u1/img-9");
            then.status(200).json_body(json!({ "success": true }));
        })
        .await;

    let uploader = HttpImageUploader::new(client_for(
        &server,
        Arc::new(InMemoryStore::new()),
        Duration::from_secs(5),
    ));
    assert_eq!(
        uploader.image_url("u1", "img-9"),
        format!("{}/images/u1/img-9", server.base_url())
    );
    uploader.delete_image("u1", "img-9").await.unwrap();
    delete.assert_async().await;
}

#[tokio::test]
async fn profile_is_read_from_users_me() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/users/me")
                .header("authorization", "Bearer tok-1");
            then.status(200).json_body(json!({
                "data": { "id": "u1", "email": "ana@example.com", "name": "Ana" }
            }));
        })
        .await;

    let storage = Arc::new(InMemoryStore::with_entries([(keys::AUTH_TOKEN, "tok-1")]));
    let auth = HttpAuthGateway::new(client_for(&server, storage, Duration::from_secs(5)));
    let user = auth.me().await.unwrap();
    assert_eq!(user.email, "ana@example.com");
    assert_eq!(user.name.as_deref(), Some("Ana"));
}

#[traced_test]
#[tokio::test]
async fn outgoing_request_span_carries_trace_id_and_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/todos").header_exists("traceparent");
            then.status(200)
                .json_body(json!({ "success": true, "data": [], "count": 0 }));
        })
        .await;

    let storage = Arc::new(InMemoryStore::new());
    let tasks = HttpTaskGateway::new(client_for(&server, storage, Duration::from_secs(5)));
    assert!(tasks.list("u1").await.unwrap().is_empty());

    assert!(logs_contain("outgoing_http"));
    assert!(logs_contain("trace_id="));
    assert!(logs_contain("Response received"));
}
