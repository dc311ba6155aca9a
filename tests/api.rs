//! HTTP surface tests: the complete router driven with `tower::ServiceExt::oneshot`.
//!
//! Sites live in a [`MemorySiteStore`]; generation uses a stub model and a
//! local product page.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{spawn_product_site, test_config, StubModel, MODEL_JSON};
use prodify::{build_app, AppState, MemorySiteStore, SiteStore, StaticTokenAuth};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct Harness {
    app: Router,
    store: Arc<MemorySiteStore>,
}

fn harness() -> Harness {
    harness_replying(MODEL_JSON)
}

fn harness_replying(model_reply: &str) -> Harness {
    let store = Arc::new(MemorySiteStore::new());
    let config = test_config();
    let auth = StaticTokenAuth::from_config(&config);
    let state = AppState::new(config, store.clone(), Arc::new(auth))
        .with_model(Arc::new(StubModel::replying(model_reply)));
    Harness {
        app: build_app(state),
        store,
    }
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body).unwrap()
}

fn publish_body(slug: &str) -> Body {
    Body::from(
        json!({
            "slug": slug,
            "title": "Acme Trail Runner 2 Review",
            "description": "Why the Trail Runner 2 is the shoe for rocky trails.",
            "html": "<!DOCTYPE html><html><head><title>Acme</title></head><body><h1>Acme</h1></body></html>",
            "css": "body { margin: 0; }",
            "ogImage": "https://cdn.example.test/shoe-top.jpg",
        })
        .to_string(),
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    let value = serde_json::from_str(&body)
        .unwrap_or_else(|e| panic!("response is not JSON ({e}): {body}"));
    (status, value)
}

fn assert_error(value: &Value, needle: &str) {
    assert_eq!(value["success"], false);
    let message = value["error"].as_str().unwrap();
    assert!(message.contains(needle), "{message:?} lacks {needle:?}");
}

// ── Auth and body validation ─────────────────────────────────────────────

#[tokio::test]
async fn health_needs_no_token() {
    let h = harness();
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn api_routes_reject_missing_or_unknown_tokens() {
    let h = harness();
    for token in [None, Some("nobody")] {
        for (method, uri) in [
            ("POST", "/api/scrape"),
            ("POST", "/api/generate"),
            ("POST", "/api/publish"),
            ("GET", "/api/publish"),
        ] {
            let request = json_request(method, uri, token, publish_body("acme"));
            let (status, value) = send_json(&h.app, request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_error(&value, "Unauthorized");
        }
    }
    assert!(!h.store.slug_exists("acme").await.unwrap());
}

#[tokio::test]
async fn empty_and_malformed_bodies_are_bad_requests() {
    let h = harness();

    let request = json_request("POST", "/api/publish", Some("alice-token"), Body::empty());
    let (status, value) = send_json(&h.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&value, "empty");

    let request = json_request("POST", "/api/scrape", Some("alice-token"), Body::from("{url:"));
    let (status, value) = send_json(&h.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&value, "Invalid JSON");

    let request = json_request("POST", "/api/scrape", Some("alice-token"), Body::from("{}"));
    let (status, value) = send_json(&h.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&value, "url");
}

// ── Scrape and generate ──────────────────────────────────────────────────

#[tokio::test]
async fn scrape_returns_page_data() {
    let h = harness();
    let addr = spawn_product_site().await;
    let body = Body::from(json!({ "url": format!("http://{addr}/product") }).to_string());

    let request = json_request("POST", "/api/scrape", Some("alice-token"), body);
    let (status, value) = send_json(&h.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["title"], "Acme Trail Runner 2 | Acme Store");
    assert_eq!(value["data"]["h1"][0], "Acme Trail Runner 2");
    assert_eq!(value["data"]["images"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn scrape_of_missing_page_hides_upstream_detail() {
    let h = harness();
    let addr = spawn_product_site().await;
    let body = Body::from(json!({ "url": format!("http://{addr}/gone") }).to_string());

    let request = json_request("POST", "/api/scrape", Some("alice-token"), body);
    let (status, value) = send_json(&h.app, request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&value, "Could not retrieve the product page");
    assert!(!value["error"].as_str().unwrap().contains("127.0.0.1"));
}

#[tokio::test]
async fn generate_then_publish_then_view() {
    let h = harness();
    let addr = spawn_product_site().await;
    let body = Body::from(json!({ "url": format!("http://{addr}/product") }).to_string());

    let request = json_request("POST", "/api/generate", Some("alice-token"), body);
    let (status, generated) = send_json(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(generated["success"], true);
    assert_eq!(generated["product"]["title"], "Acme Trail Runner 2");
    assert_eq!(generated["site"]["slug"], "acme-trail-runner-2");
    assert_eq!(generated["stats"]["inputTokens"], 100);
    assert_eq!(generated["stats"]["outputTokens"], 200);
    assert!(generated["stats"].get("input_tokens").is_none());

    let site = &generated["site"];
    let publish = json!({
        "slug": site["slug"],
        "title": site["title"],
        "description": site["description"],
        "html": site["html"],
        "css": site["css"],
        "ogImage": site["ogImage"],
        "productUrl": generated["product"]["url"],
    });
    let request = json_request(
        "POST",
        "/api/publish",
        Some("alice-token"),
        Body::from(publish.to_string()),
    );
    let (status, published) = send_json(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(published["url"], "https://prodify.test/acme-trail-runner-2");

    let request = Request::get("/acme-trail-runner-2").body(Body::empty()).unwrap();
    let (status, page) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Meet the Trail Runner 2."));
    assert!(page.contains("Made with Prodify"));
    assert!(!page.contains("<script"));
}

#[tokio::test]
async fn generated_page_neutralises_hostile_section_html() {
    let hostile = json!({
        "title": "Acme",
        "description": "Acme shoe",
        "slug": "acme-hostile",
        "sections": [
            {"title": "Intro", "type": "introduction",
             "content": "<p>Safe intro</p><svg/onload=alert(1)><math><mi xlink:href=\"javascript:alert(2)\">m</mi></math>"},
            {"title": "Buy", "type": "cta",
             "content": "<a href=\"jav&#x61;script:alert(3)\">Buy</a><form><button formaction=\"javascript:alert(4)\">Go</button></form><img/src=\"a.png\"/onerror=alert(5)>"}
        ],
        "keywords": []
    })
    .to_string();
    let h = harness_replying(&hostile);
    let addr = spawn_product_site().await;
    let body = Body::from(json!({ "url": format!("http://{addr}/product") }).to_string());

    let request = json_request("POST", "/api/generate", Some("alice-token"), body);
    let (status, generated) = send_json(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    let html = generated["site"]["html"].as_str().unwrap().to_ascii_lowercase();

    assert!(html.contains("safe intro"));
    assert!(html.contains("<a>buy</a>"));
    assert!(html.contains("<img src=\"a.png\">"));
    for needle in ["<svg", "<math", "onload", "onerror", "formaction", "javascript", "alert("] {
        assert!(!html.contains(needle), "generated page still contains {needle:?}");
    }
}

// ── Publish and list ─────────────────────────────────────────────────────

#[tokio::test]
async fn publish_returns_public_url() {
    let h = harness();
    let request = json_request("POST", "/api/publish", Some("alice-token"), publish_body("acme"));
    let (status, value) = send_json(&h.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
    assert_eq!(value["slug"], "acme");
    assert_eq!(value["url"], "https://prodify.test/acme");
    assert!(value["siteId"].as_str().is_some());
    assert!(h.store.slug_exists("acme").await.unwrap());
}

#[tokio::test]
async fn duplicate_slug_is_conflict_across_users() {
    let h = harness();
    let request = json_request("POST", "/api/publish", Some("alice-token"), publish_body("acme"));
    assert_eq!(send(&h.app, request).await.0, StatusCode::OK);

    for token in ["alice-token", "bob-token"] {
        let request = json_request("POST", "/api/publish", Some(token), publish_body("acme"));
        let (status, value) = send_json(&h.app, request).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_error(&value, "already taken");
    }
}

#[tokio::test]
async fn publish_reports_every_missing_field() {
    let h = harness();
    let body = Body::from(json!({ "slug": "acme", "html": "<p>x</p>" }).to_string());
    let request = json_request("POST", "/api/publish", Some("alice-token"), body);
    let (status, value) = send_json(&h.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&value, "title");
    assert_error(&value, "css");
}

#[tokio::test]
async fn publish_rejects_malformed_slug() {
    let h = harness();
    let request = json_request(
        "POST",
        "/api/publish",
        Some("alice-token"),
        publish_body("Bad Slug"),
    );
    let (status, value) = send_json(&h.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&value, "Invalid slug");
}

#[tokio::test]
async fn list_shows_only_callers_sites_newest_first() {
    let h = harness();
    for (token, slug) in [
        ("alice-token", "first"),
        ("bob-token", "bobs"),
        ("alice-token", "second"),
    ] {
        let request = json_request("POST", "/api/publish", Some(token), publish_body(slug));
        assert_eq!(send(&h.app, request).await.0, StatusCode::OK);
    }

    let request = json_request("GET", "/api/publish", Some("alice-token"), Body::empty());
    let (status, value) = send_json(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
    let slugs: Vec<&str> = value["sites"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["second", "first"]);
    assert!(value["sites"][0].get("html").is_none());
}

// ── Public pages ─────────────────────────────────────────────────────────

#[tokio::test]
async fn each_view_increments_the_counter() {
    let h = harness();
    let request = json_request("POST", "/api/publish", Some("alice-token"), publish_body("acme"));
    assert_eq!(send(&h.app, request).await.0, StatusCode::OK);

    for _ in 0..3 {
        let request = Request::get("/acme").body(Body::empty()).unwrap();
        let (status, page) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(page.contains("body { margin: 0; }"));
        assert!(page.contains("Made with Prodify"));
    }

    let request = json_request("GET", "/api/publish", Some("alice-token"), Body::empty());
    let (_, value) = send_json(&h.app, request).await;
    assert_eq!(value["sites"][0]["views"], 3);
}

#[tokio::test]
async fn unknown_slug_is_html_404() {
    let h = harness();
    let request = Request::get("/nothing-here").body(Body::empty()).unwrap();
    let (status, page) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(page.contains("nothing-here"));
}

#[tokio::test]
async fn subdomain_host_serves_the_site() {
    let h = harness();
    let request = json_request("POST", "/api/publish", Some("alice-token"), publish_body("acme"));
    assert_eq!(send(&h.app, request).await.0, StatusCode::OK);

    let request = Request::get("/")
        .header(header::HOST, "acme.prodify.test")
        .body(Body::empty())
        .unwrap();
    let (status, page) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("<h1>Acme</h1>"));

    let request = Request::get("/health")
        .header(header::HOST, "acme.prodify.test")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&h.app, request).await.0, StatusCode::OK);
}
