//! End-to-end tests: client → relay-proxy → fake upstream

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream;
use pretty_assertions::assert_eq;
use relay_proxy::{serve_listener, ProxyState, Upstream};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve a fake upstream on an ephemeral port
async fn spawn_upstream(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Start a proxy in front of `upstream_url` and return its base address
async fn spawn_proxy(upstream_url: &str, timeout: Duration) -> String {
    let state = ProxyState {
        upstream: Arc::new(Upstream::new(upstream_url, timeout, Duration::from_secs(2)).unwrap()),
        max_body_bytes: 1024 * 1024,
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_listener(listener, state, std::future::pending()));
    format!("http://{addr}")
}

async fn proxy_for(app: Router) -> String {
    let upstream = spawn_upstream(app).await;
    spawn_proxy(&upstream, Duration::from_secs(5)).await
}

fn chat_payload() -> serde_json::Value {
    serde_json::json!({
        "conversation_history": [{"role": "user", "content": "hi"}],
        "current_user_message": "hi",
        "api_key": "sk-test"
    })
}

#[tokio::test]
async fn test_upstream_error_becomes_generic_500() {
    let proxy = proxy_for(Router::new().route(
        "/api/chat",
        post(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "secret upstream detail: db password rejected",
            )
        }),
    ))
    .await;

    let response = reqwest::Client::new()
        .post(format!("{proxy}/api/chat"))
        .json(&chat_payload())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.text().await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, serde_json::json!({"error": "Failed to process request"}));
    assert!(!body.contains("secret"));
}

#[tokio::test]
async fn test_chat_stream_is_relayed_verbatim() {
    let chunks: Vec<&'static [u8]> = vec![b"Hel", b"lo, w", b"orld \xE2\x82", b"\xAC!"];
    let expected: Vec<u8> = chunks.concat();

    let upstream = Router::new().route(
        "/api/chat",
        post(move || async move {
            let items: Vec<Result<Bytes, std::io::Error>> =
                chunks.into_iter().map(|c| Ok(Bytes::from_static(c))).collect();
            Body::from_stream(stream::iter(items))
        }),
    );
    let proxy = proxy_for(upstream).await;

    let response = reqwest::Client::new()
        .post(format!("{proxy}/api/chat"))
        .json(&chat_payload())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[reqwest::header::CONTENT_TYPE], "text/plain");
    assert_eq!(headers[reqwest::header::CACHE_CONTROL], "no-cache");
    if let Some(connection) = headers.get(reqwest::header::CONNECTION) {
        assert_eq!(connection, "keep-alive");
    }

    let body = response.bytes().await.unwrap();
    assert_eq!(body.to_vec(), expected);
}

#[tokio::test]
async fn test_chat_body_is_forwarded_unmodified() {
    async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or(header::HeaderValue::from_static("missing"));
        ([(header::CONTENT_TYPE, content_type)], body)
    }
    let proxy = proxy_for(Router::new().route("/api/chat", post(echo))).await;

    // Odd spacing and key order must survive untouched.
    let raw = r#"{ "current_user_message":"hi",  "api_key":"k","conversation_history":[] }"#;
    let body = reqwest::Client::new()
        .post(format!("{proxy}/api/chat"))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(raw)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(body, raw);
}

#[tokio::test]
async fn test_upload_keeps_multipart_boundary() {
    async fn receive(headers: HeaderMap, body: Bytes) -> Json<serde_json::Value> {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Json(serde_json::json!({
            "message": content_type,
            "file_size": body.len(),
        }))
    }
    let proxy = proxy_for(Router::new().route("/api/upload-pdf", post(receive))).await;

    let part = reqwest::multipart::Part::bytes(b"%PDF-1.7 fake".to_vec()).file_name("a.pdf");
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("api_key", "sk-test");
    let boundary = form.boundary().to_string();

    let response = reqwest::Client::new()
        .post(format!("{proxy}/api/upload-pdf"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let receipt: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        receipt["message"],
        format!("multipart/form-data; boundary={boundary}")
    );
    assert!(receipt["file_size"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_upload_failure_is_generic_500() {
    let proxy = proxy_for(Router::new().route(
        "/api/upload-pdf",
        post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "not a pdf") }),
    ))
    .await;

    let response = reqwest::Client::new()
        .post(format!("{proxy}/api/upload-pdf"))
        .header(reqwest::header::CONTENT_TYPE, "multipart/form-data; boundary=x")
        .body("--x--\r\n")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["error"], "Failed to upload file");
}

#[tokio::test]
async fn test_health_passthrough() {
    let payload = serde_json::json!({"status": "ok", "models_loaded": 3});
    let expected = payload.clone();
    let proxy = proxy_for(Router::new().route(
        "/api/health",
        get(move || async move { Json(payload) }),
    ))
    .await;

    let response = reqwest::get(format!("{proxy}/api/health")).await.unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json, expected);
}

#[tokio::test]
async fn test_health_failure_when_upstream_unreachable() {
    // Nothing listens on the discard port.
    let proxy = spawn_proxy("http://127.0.0.1:9", Duration::from_secs(5)).await;

    let response = reqwest::get(format!("{proxy}/api/health")).await.unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json, serde_json::json!({"error": "Failed to check API health"}));
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let upstream = spawn_upstream(Router::new().route(
        "/api/chat",
        post(|| async {
            std::future::pending::<()>().await;
            "never"
        }),
    ))
    .await;
    let proxy = spawn_proxy(&upstream, Duration::from_millis(200)).await;

    let response = reqwest::Client::new()
        .post(format!("{proxy}/api/chat"))
        .json(&chat_payload())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let state = ProxyState {
        upstream: Arc::new(
            Upstream::new(
                "http://127.0.0.1:9",
                Duration::from_secs(1),
                Duration::from_secs(1),
            )
            .unwrap(),
        ),
        max_body_bytes: 1024,
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(serve_listener(listener, state, async move {
        let _ = stop_rx.await;
    }));
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
