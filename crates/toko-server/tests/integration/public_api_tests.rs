//! Routing, auth, validation and rate limiting. None of these reach the
//! database, so they run against an offline pool.

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;

use crate::integration::common::{
    body_json, get_request, json_request, setup_offline_app, setup_offline_app_behind_proxy,
};

fn login_body() -> serde_json::Value {
    serde_json::json!({ "email": "alice@example.com", "password": "secret123" })
}

#[tokio::test]
async fn status_answers_get_and_head() {
    let app = setup_offline_app();

    let response = app.send(get_request("/status", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(Request::head("/status").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());
}

#[tokio::test]
async fn unknown_route_returns_route_not_found() {
    let app = setup_offline_app();

    let response = app.send(get_request("/api/shops", None)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["statusCode"], 404);
    assert_eq!(json["error"], "ROUTE_NOT_FOUND");
}

#[tokio::test]
async fn health_reports_unreachable_database() {
    let app = setup_offline_app();

    let response = app.send(get_request("/health", None)).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["status"], "unhealthy");
    assert_eq!(json["database"], "error");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = setup_offline_app();

    let response = app.send(get_request("/api-docs/openapi.json", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["info"]["title"], "Toko API");
}

#[tokio::test]
async fn missing_token_returns_401() {
    let app = setup_offline_app();

    for uri in ["/api/users", "/api/toko", "/api/toko/not-an-id"] {
        let response = app.send(get_request(uri, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");

        let json = body_json(response).await;
        assert_eq!(json["statusCode"], 401);
        assert_eq!(json["error"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn bad_token_returns_401() {
    let app = setup_offline_app();

    let response = app
        .send(get_request("/api/users", Some("not.a.jwt")))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_list_parameters_return_400() {
    let app = setup_offline_app();
    let token = app.token();

    for query in [
        "page_number=0",
        "page_size=-1",
        "page_number=abc",
        "sort=name:sideways",
        "sort=password_hash:asc",
    ] {
        let response = app
            .send(get_request(&format!("/api/users?{query}"), Some(&token)))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{query}");

        let json = body_json(response).await;
        assert_eq!(json["error"], "INVALID_QUERY_PARAMETERS", "{query}");
    }
}

#[tokio::test]
async fn malformed_id_returns_validation_error() {
    let app = setup_offline_app();
    let token = app.token();

    let response = app
        .send(get_request("/api/toko/not-an-id", Some(&token)))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn invalid_create_body_lists_validation_errors() {
    let app = setup_offline_app();
    let token = app.token();

    let body = serde_json::json!({
        "name": "",
        "email": "nope",
        "password": "123",
        "password_confirm": "123"
    });
    let response = app
        .send(json_request("POST", "/api/toko/create", Some(&token), &body))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "VALIDATION_ERROR");
    let errors = json["validation_errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e.as_str().unwrap().starts_with("email:")));
    assert!(errors.iter().any(|e| e.as_str().unwrap().starts_with("name:")));
    assert!(errors.iter().any(|e| e.as_str().unwrap().starts_with("password:")));
}

#[tokio::test]
async fn unparseable_json_returns_validation_error() {
    let app = setup_offline_app();

    let response = app
        .send(
            Request::post("/api/authentication/login")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "VALIDATION_ERROR");
}

/// A login request arriving from `peer`, optionally carrying an
/// `X-Forwarded-For` header.
fn login_from(peer: &str, forwarded_for: Option<&str>) -> Request<Body> {
    let mut request = json_request("POST", "/api/authentication/login", None, &login_body());
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    if let Some(value) = forwarded_for {
        request
            .headers_mut()
            .insert("x-forwarded-for", value.parse().unwrap());
    }
    request
}

#[tokio::test]
async fn sixth_login_attempt_is_rate_limited() {
    let app = setup_offline_app();

    for attempt in 1..=5 {
        let response = app.send(login_from("198.51.100.9:40000", None)).await;
        // The database is offline, so the attempt itself fails.
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "attempt {attempt}"
        );
    }

    let response = app.send(login_from("198.51.100.9:40001", None)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().contains_key("retry-after"));
    let json = body_json(response).await;
    assert_eq!(json["error"], "RATE_LIMITED");
    assert_eq!(json["message"], "Too many failed login attempts.");

    // Another client is unaffected.
    let response = app.send(login_from("198.51.100.10:40000", None)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_escape_the_limit() {
    let app = setup_offline_app();

    for attempt in 1..=5 {
        let spoofed = format!("203.0.113.{attempt}");
        let response = app
            .send(login_from("198.51.100.9:40000", Some(&spoofed)))
            .await;
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "attempt {attempt}"
        );
    }

    let response = app
        .send(login_from("198.51.100.9:40000", Some("203.0.113.99")))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "RATE_LIMITED");
}

#[tokio::test]
async fn behind_proxy_only_the_appended_hop_is_trusted() {
    let app = setup_offline_app_behind_proxy();

    for attempt in 1..=5 {
        let forwarded = format!("203.0.113.{attempt}, 192.0.2.50");
        let response = app
            .send(login_from("10.0.0.2:40000", Some(&forwarded)))
            .await;
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "attempt {attempt}"
        );
    }

    let response = app
        .send(login_from("10.0.0.2:40000", Some("203.0.113.99, 192.0.2.50")))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "RATE_LIMITED");

    // A different client seen by the proxy has its own window.
    let response = app
        .send(login_from("10.0.0.2:40000", Some("192.0.2.51")))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
