use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use signup_api::{AppStateInner, router};
use signup_db::Database;

const NOT_VALID_COMPOSITION: &str =
    "Password must have atleast 1 uppercase, 1 lowercase and 1 number in it";

struct TestApp {
    router: Router,
    db: Arc<Database>,
}

fn app() -> TestApp {
    let db = Arc::new(Database::open_in_memory().unwrap());
    TestApp {
        router: router(AppStateInner::new(db.clone())),
        db,
    }
}

fn valid_user() -> Value {
    json!({
        "username": "user1",
        "email": "user1@mail.com",
        "password": "P4ssword",
    })
}

async fn post_raw(app: &TestApp, content_type: &str, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/1.0/users")
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_user(app: &TestApp, user: Value) -> (StatusCode, Value) {
    post_raw(app, "application/json", user.to_string()).await
}

fn error_keys(body: &Value) -> Vec<String> {
    body["validationErrors"]
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect()
}

#[tokio::test]
async fn valid_request_returns_200_and_message() {
    let app = app();
    let (status, body) = post_user(&app, valid_user()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "User created" }));
}

#[tokio::test]
async fn valid_request_saves_one_user_with_hashed_password() {
    let app = app();
    post_user(&app, valid_user()).await;

    let users = app.db.list_users().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "user1");
    assert_eq!(users[0].email, "user1@mail.com");
    assert_ne!(users[0].password, "P4ssword");
}

#[tokio::test]
async fn null_username_returns_400_with_only_that_field() {
    let app = app();
    let (status, body) = post_user(
        &app,
        json!({ "username": null, "email": "user1@mail.com", "password": "P4ssword" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "validationErrors": { "username": "Username cannot be null" } })
    );
}

#[tokio::test]
async fn null_username_and_email_are_reported_in_order() {
    let app = app();
    let (status, body) = post_user(
        &app,
        json!({ "username": null, "email": null, "password": "P4ssword" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_keys(&body), ["username", "email"]);
}

#[tokio::test]
async fn missing_fields_read_as_null() {
    let app = app();
    let (status, body) = post_user(&app, json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "validationErrors": {
                "username": "Username cannot be null",
                "email": "email cannot be null",
                "password": "Password cannot be null",
            }
        })
    );
    assert_eq!(error_keys(&body), ["username", "email", "password"]);
}

#[tokio::test]
async fn field_messages() {
    let too_long = "s".repeat(50);
    let cases: &[(&str, Value, &str)] = &[
        ("username", Value::Null, "Username cannot be null"),
        ("username", json!("usr"), "Username must be min 4 and max 32 characters"),
        ("username", json!(too_long), "Username must be min 4 and max 32 characters"),
        ("email", Value::Null, "email cannot be null"),
        ("email", json!("usr.com"), "Email is not valid"),
        ("email", json!("usr@com"), "Email is not valid"),
        ("email", json!("usr.mail"), "Email is not valid"),
        ("password", Value::Null, "Password cannot be null"),
        ("password", json!("P4ss"), "Password must be atleast 6 characters long"),
        ("password", json!("Password"), NOT_VALID_COMPOSITION),
        ("password", json!("123456"), NOT_VALID_COMPOSITION),
        ("password", json!("lowercase"), NOT_VALID_COMPOSITION),
        ("password", json!("UPPERCASE"), NOT_VALID_COMPOSITION),
        ("password", json!("loweerUPPER"), NOT_VALID_COMPOSITION),
    ];

    for (field, value, expected) in cases {
        let app = app();
        let mut user = valid_user();
        user[*field] = value.clone();

        let (status, body) = post_user(&app, user).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{field} = {value}");
        assert_eq!(body["validationErrors"][*field], *expected, "{field} = {value}");
        assert_eq!(error_keys(&body), [*field], "{field} = {value}");
    }
}

#[tokio::test]
async fn username_length_boundaries() {
    for (len, accepted) in [(3, false), (4, true), (32, true), (33, false)] {
        let app = app();
        let mut user = valid_user();
        user["username"] = json!("u".repeat(len));

        let (status, _) = post_user(&app, user).await;
        let expected = if accepted {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        };
        assert_eq!(status, expected, "username of {len} chars");
    }
}

#[tokio::test]
async fn email_in_use() {
    let app = app();
    app.db
        .insert_user("user1", "user1@mail.com", "P4ssword")
        .unwrap();

    let (status, body) = post_user(&app, valid_user()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "validationErrors": { "email": "Email in use" } })
    );
}

#[tokio::test]
async fn registering_twice_rejects_second_attempt() {
    let app = app();

    let (first, _) = post_user(&app, valid_user()).await;
    let (second, body) = post_user(&app, valid_user()).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "validationErrors": { "email": "Email in use" } })
    );
    assert_eq!(app.db.list_users().unwrap().len(), 1);
}

#[tokio::test]
async fn short_username_and_email_in_use_are_reported_together() {
    let app = app();
    post_user(&app, valid_user()).await;

    let (status, body) = post_user(
        &app,
        json!({ "username": "usr", "email": "user1@mail.com", "password": "P4ssword" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_keys(&body), ["username", "email"]);
    assert_eq!(body["validationErrors"]["email"], "Email in use");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_with_same_email_store_one_user() {
    // Either the pre-check or the unique constraint may reject the loser;
    // both must produce the same body.
    let app = app();

    let (a, b) = tokio::join!(
        post_user(&app, valid_user()),
        post_user(
            &app,
            json!({ "username": "user2", "email": "user1@mail.com", "password": "P4ssword" }),
        ),
    );

    let mut statuses = [a.0.as_u16(), b.0.as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 400]);

    let rejected = if a.0 == StatusCode::BAD_REQUEST { a.1 } else { b.1 };
    assert_eq!(
        rejected,
        json!({ "validationErrors": { "email": "Email in use" } })
    );
    assert_eq!(app.db.list_users().unwrap().len(), 1);
}

#[tokio::test]
async fn storage_failure_returns_500() {
    let app = app();
    app.db
        .with_conn(|conn| Ok(conn.execute_batch("DROP TABLE users")?))
        .unwrap();

    let (status, body) = post_user(&app, valid_user()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "message": "Internal server error" }));
}

#[tokio::test]
async fn malformed_json_returns_400() {
    let app = app();
    let (status, body) = post_raw(&app, "application/json", "{\"username\":".into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
    assert!(app.db.list_users().unwrap().is_empty());
}

#[tokio::test]
async fn non_string_field_returns_400() {
    let app = app();
    let (status, body) = post_user(
        &app,
        json!({ "username": 42, "email": "user1@mail.com", "password": "P4ssword" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn array_body_returns_400_without_registering() {
    let app = app();
    let (status, body) = post_user(&app, json!(["user1", "user1@mail.com", "P4ssword"])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
    assert!(body.get("validationErrors").is_none());
    assert!(app.db.list_users().unwrap().is_empty());
}

#[tokio::test]
async fn empty_array_body_skips_validation() {
    let app = app();
    let (status, body) = post_user(&app, json!([])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
    assert!(body.get("validationErrors").is_none());
}

#[tokio::test]
async fn scalar_body_returns_400() {
    let app = app();
    let (status, body) = post_user(&app, json!("user1")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
    assert!(app.db.list_users().unwrap().is_empty());
}

#[tokio::test]
async fn missing_content_type_returns_400() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/1.0/users")
        .body(Body::from(valid_user().to_string()))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
    assert!(app.db.list_users().unwrap().is_empty());
}

#[tokio::test]
async fn non_json_content_type_returns_400() {
    let app = app();
    let (status, body) = post_raw(&app, "text/plain", valid_user().to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
    assert!(app.db.list_users().unwrap().is_empty());
}

#[tokio::test]
async fn health_check() {
    let app = app();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
