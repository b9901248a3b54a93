//! Router-level tests: requests driven through the trust middleware.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use proxy_trust::config::{HeadersConfig, PresetConfig, ServiceConfig};
use proxy_trust::HttpServer;
use serde_json::Value;
use tower::ServiceExt;

mod common;

use common::{base_config, custom_x_headers, preset_config, strings, PEER};

fn request(headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().uri("/tag/proxy");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let mut request = builder.body(Body::empty()).unwrap();
    let peer: SocketAddr = format!("{PEER}:8888").parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

async fn report(server: &HttpServer, request: Request<Body>) -> Value {
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn server(trusted_proxies: proxy_trust::config::TrustedProxiesConfig) -> HttpServer {
    HttpServer::new(ServiceConfig {
        trusted_proxies,
        ..Default::default()
    })
}

#[tokio::test]
async fn test_report_for_untrusted_peer() {
    let server = server(base_config(HeadersConfig::default(), 0, &[], &[]));

    let body = report(&server, request(&[("x-forwarded-for", "1.2.3.4")])).await;

    assert_eq!(body["peer"], PEER);
    assert_eq!(body["policy"]["kind"], "base");
    assert_eq!(body["trusted_proxies"], serde_json::json!([]));
    assert_eq!(body["trusted_headers"], serde_json::json!([]));
    assert_eq!(body["forwarded_headers"]["x-forwarded-for"], "1.2.3.4");
}

#[tokio::test]
async fn test_report_for_trusted_chain() {
    let server = server(base_config(HeadersConfig::all(), 2, &["10.0.0.0/8"], &[]));

    let body = report(&server, request(&[("x-forwarded-for", "203.0.113.7, 198.51.100.1")])).await;

    assert_eq!(
        body["trusted_proxies"],
        serde_json::json!(["10.0.0.0/8", PEER, "198.51.100.1"])
    );
    assert_eq!(
        body["trusted_headers"],
        serde_json::json!([
            "forwarded",
            "x-forwarded-for",
            "x-forwarded-host",
            "x-forwarded-proto",
            "x-forwarded-port"
        ])
    );
}

#[tokio::test]
async fn test_overrides_are_visible_downstream() {
    let server = server(base_config(custom_x_headers(), 1, &[], &[]));

    let body = report(
        &server,
        request(&[
            ("x-forwarded-for", "6.6.6.6"),
            ("x-forwarded-host", "spoofed.example"),
            ("x-my-forwarded-for", "193.200.0.0"),
            ("x-my-forwarded-proto", "http"),
        ]),
    )
    .await;

    let forwarded = &body["forwarded_headers"];
    assert_eq!(forwarded["x-forwarded-for"], "193.200.0.0");
    assert_eq!(forwarded["x-forwarded-proto"], "http");
    assert!(forwarded.get("x-forwarded-host").is_none());
    assert!(forwarded.get("x-forwarded-port").is_none());
}

#[tokio::test]
async fn test_preset_selected_by_secret_header() {
    let preset = PresetConfig {
        proxies: strings(&["172.16.0.0/12"]),
        trust_last_proxies: 1,
        ..Default::default()
    };
    let server = server(preset_config(preset, Some("defaultPreset")));

    let body = report(&server, request(&[("x-my-preset-header", "secretValue")])).await;
    assert_eq!(body["policy"]["kind"], "secret_header");
    assert_eq!(body["policy"]["header"], "x-my-preset-header");
    assert_eq!(body["policy"]["preset"], "preset2");
    assert_eq!(body["trusted_proxies"], serde_json::json!(["172.16.0.0/12", PEER]));

    let body = report(&server, request(&[("x-my-preset-header", "wrong")])).await;
    assert_eq!(body["policy"]["kind"], "default_preset");
    assert_eq!(body["policy"]["preset"], "defaultPreset");
    assert_eq!(body["trusted_proxies"], serde_json::json!([]));
}

#[tokio::test]
async fn test_reload_applies_to_next_request() {
    let server = server(base_config(HeadersConfig::all(), 0, &[], &[]));

    let before = report(&server, request(&[])).await;
    assert_eq!(before["trusted_proxies"], serde_json::json!([]));

    server
        .state()
        .config
        .store(Arc::new(base_config(HeadersConfig::all(), 0, &[PEER], &[])));

    let after = report(&server, request(&[])).await;
    assert_eq!(after["trusted_proxies"], serde_json::json!([PEER]));
}

#[tokio::test]
async fn test_any_path_and_method_is_inspected() {
    let server = server(base_config(HeadersConfig::default(), 1, &[], &[]));

    let mut req = request(&[]);
    *req.method_mut() = axum::http::Method::POST;
    *req.uri_mut() = "/deeply/nested/path?q=1".parse().unwrap();

    let body = report(&server, req).await;
    assert_eq!(body["trusted_proxies"], serde_json::json!([PEER]));
}
