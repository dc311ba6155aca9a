//! Shared fixtures: a local product-page server and a stub content model.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use prodify::{AppConfig, ContentModel, ModelReply, ProdifyError};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const PRODUCT_PAGE: &str = r#"<!DOCTYPE html>
<html><head>
  <title>Acme Trail Runner 2 | Acme Store</title>
  <meta name="description" content="Lightweight trail running shoe with grippy outsole.">
</head><body>
  <img src="/static/logo.png" alt="Acme">
  <h1>Acme Trail Runner 2</h1>
  <p>Built for rocky descents.</p>
  <p>Weighs only 240 g.</p>
  <img src="/images/shoe-side.jpg" alt="Side view">
  <img src="https://cdn.example.test/shoe-top.jpg" alt="Top view">
</body></html>"#;

pub const MODEL_JSON: &str = r#"{
  "title": "Acme Trail Runner 2 Review",
  "description": "Why the Trail Runner 2 is the shoe for rocky trails.",
  "slug": "acme-trail-runner-2",
  "sections": [
    {"title": "Introduction", "content": "<p>Meet the Trail Runner 2.</p>", "type": "introduction"},
    {"title": "Features", "content": "<ul><li>240 g</li><li onclick=\"x()\">Grippy outsole</li></ul>", "type": "features"},
    {"title": "Buy now", "content": "<p>Grab yours today.</p><script>alert(1)</script>", "type": "cta"}
  ],
  "keywords": ["trail running", "acme"]
}"#;

/// Serve the product fixture on `127.0.0.1:0` and return its address.
///
/// * `/product`  — [`PRODUCT_PAGE`]
/// * `/gone`     — 404
/// * `/broken`   — 500
pub async fn spawn_product_site() -> SocketAddr {
    let app = Router::new()
        .route("/product", get(|| async { Html(PRODUCT_PAGE) }))
        .route("/gone", get(|| async { (StatusCode::NOT_FOUND, "gone") }))
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Content model returning a canned reply and recording prompts.
pub struct StubModel {
    reply: Result<String, u16>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl StubModel {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentModel for StubModel {
    fn name(&self) -> String {
        "stub".into()
    }

    async fn complete_json(&self, prompt: &str, _schema: &Value) -> Result<ModelReply, ProdifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.reply {
            Ok(ref text) => Ok(ModelReply {
                text: text.clone(),
                input_tokens: 100,
                output_tokens: 200,
            }),
            Err(status) => Err(ProdifyError::GenerationFailed {
                status: Some(status),
                detail: "stubbed failure".into(),
            }),
        }
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::builder()
        .public_base_url("https://prodify.test")
        .main_domain("prodify.test")
        .api_token("alice-token", "alice")
        .api_token("bob-token", "bob")
        .fetch_timeout_secs(5)
        .build()
        .unwrap()
}
