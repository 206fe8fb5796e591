use super::*;
use crate::state::test_helpers::*;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::Request;
use domain::permissions::Role;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use tower::ServiceExt;

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
    let response = app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, headers, body)
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri).header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn money(value: &serde_json::Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn healthz_needs_no_session() {
    let state = test_app_state();
    let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let (status, _, _) = send(&state, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn api_requires_a_session() {
    let state = test_app_state();
    let request = Request::builder().uri("/api/quotes").body(Body::empty()).unwrap();
    let (status, _, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication required");

    let (status, _, body) = send(&state, get_with_token("/api/quotes", "stale-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn login_sets_cookie_that_authenticates() {
    let state = test_app_state();
    seed_user(&state, "alice", Role::Admin).await;

    let credentials = serde_json::json!({ "username": "alice", "password": TEST_PASSWORD });
    let (status, headers, body) = send(&state, post_json("/api/auth/login", None, &credentials)).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_owned();
    assert_eq!(body["user"]["username"], "alice");

    let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with(&format!("session_token={token}")));
    assert!(cookie.contains("HttpOnly"));

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(COOKIE, format!("session_token={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, me) = send(&state, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let state = test_app_state();
    seed_user(&state, "alice", Role::Admin).await;

    let credentials = serde_json::json!({ "username": "alice", "password": "nope" });
    let (status, headers, body) = send(&state, post_json("/api/auth/login", None, &credentials)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(headers.get(SET_COOKIE).is_none());
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn bearer_token_authenticates_and_logout_revokes_it() {
    let state = test_app_state();
    let (_, token) = seed_session(&state, "bob", Role::SalesRep).await;

    let (status, _, me) = send(&state, get_with_token("/api/auth/me", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "sales_rep");

    let logout = post_json("/api/auth/logout", Some(&token), &serde_json::json!({}));
    let (status, _, _) = send(&state, logout).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = send(&state, get_with_token("/api/auth/me", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sales_rep_cannot_list_users() {
    let state = test_app_state();
    let (_, token) = seed_session(&state, "bob", Role::SalesRep).await;

    let (status, _, body) = send(&state, get_with_token("/api/users", &token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("users"));
}

#[tokio::test]
async fn created_quote_is_priced_by_the_server() {
    let state = test_app_state();
    let (_, token) = seed_session(&state, "lead", Role::SalesLeader).await;
    let client = seed_client(&state, "Acme Homes", None).await;
    let product = seed_product(&state, "Calacatta", Decimal::new(50, 0)).await;

    let body = serde_json::json!({
        "client_id": client.id,
        "project_name": "Kitchen remodel",
        "line_items": [{ "product_id": product.id, "quantity": "10", "unit_price": "50" }],
        "subtotal": "1",
        "total": "1",
    });
    let (status, _, quote) = send(&state, post_json("/api/quotes", Some(&token), &body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(money(&quote["subtotal"]), Decimal::new(500, 0));
    assert_eq!(money(&quote["tax_amount"]), Decimal::new(4250, 2));
    assert_eq!(money(&quote["total"]), Decimal::new(54250, 2));
    assert!(quote["quote_number"].as_str().unwrap().ends_with("-0001"));

    let uri = format!("/api/quotes/{}", quote["id"].as_str().unwrap());
    let (status, _, fetched) = send(&state, get_with_token(&uri, &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], quote["id"]);
}

#[tokio::test]
async fn malformed_json_uses_error_shape() {
    let state = test_app_state();
    let (_, token) = seed_session(&state, "lead", Role::SalesLeader).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/quotes")
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&state, request).await;
    assert!(status.is_client_error());
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unknown_quote_is_not_found() {
    let state = test_app_state();
    let (_, token) = seed_session(&state, "lead", Role::SalesLeader).await;

    let uri = format!("/api/quotes/{}", uuid::Uuid::new_v4());
    let (status, _, body) = send(&state, get_with_token(&uri, &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn oversized_quantity_is_a_bad_request() {
    let state = test_app_state();
    let (_, token) = seed_session(&state, "lead", Role::SalesLeader).await;
    let product = seed_product(&state, "Calacatta", Decimal::new(50, 0)).await;

    let body = serde_json::json!({
        "line_items": [{ "product_id": product.id, "quantity": "79228162514264337593543950335" }],
    });
    let (status, _, body) = send(&state, post_json("/api/quotes/preview", Some(&token), &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("quantity"));
}
