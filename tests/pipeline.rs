//! Pipeline integration tests against a local product-page server.
//!
//! The content model is a stub, so nothing here touches the network beyond
//! `127.0.0.1`.

mod common;

use common::{spawn_product_site, test_config, StubModel, MODEL_JSON};
use prodify::{
    generate_site_with_model, scrape_page, summarize_product, ErrorKind, ExtractorTable,
    GenerationProgressCallback, NoopProgressCallback, ProdifyError, Stage,
};
use std::sync::Mutex;

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl GenerationProgressCallback for RecordingProgress {
    fn on_stage_start(&self, stage: Stage) {
        self.events.lock().unwrap().push(format!("start:{stage}"));
    }

    fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
        self.events.lock().unwrap().push(format!("done:{stage}"));
    }

    fn on_stage_error(&self, stage: Stage, _error: &str) {
        self.events.lock().unwrap().push(format!("error:{stage}"));
    }

    fn on_generation_complete(&self, slug: &str, _total_ms: u64) {
        self.events.lock().unwrap().push(format!("complete:{slug}"));
    }
}

// ── Scrape ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn scrape_extracts_page_fields() {
    let addr = spawn_product_site().await;
    let url = format!("http://{addr}/product");

    let data = scrape_page(&url, &test_config()).await.unwrap();

    assert_eq!(data.title, "Acme Trail Runner 2 | Acme Store");
    assert_eq!(
        data.meta_description,
        "Lightweight trail running shoe with grippy outsole."
    );
    assert_eq!(data.headings, vec!["Acme Trail Runner 2"]);
    assert_eq!(data.paragraphs.len(), 2);
    assert_eq!(data.images.len(), 3);
    assert_eq!(
        data.images[1].src,
        format!("http://{addr}/images/shoe-side.jpg")
    );
    assert_eq!(data.images[2].src, "https://cdn.example.test/shoe-top.jpg");
}

#[tokio::test]
async fn summary_skips_decorative_images() {
    let addr = spawn_product_site().await;
    let summary = summarize_product(&format!("http://{addr}/product"), &test_config())
        .await
        .unwrap();

    assert_eq!(summary.title, "Acme Trail Runner 2");
    assert!(summary.images.iter().all(|src| !src.contains("logo")));
    assert_eq!(summary.images.len(), 2);
}

#[tokio::test]
async fn non_success_status_is_fetch_status() {
    let addr = spawn_product_site().await;
    for (path, expected) in [("gone", 404), ("broken", 500)] {
        let err = scrape_page(&format!("http://{addr}/{path}"), &test_config())
            .await
            .unwrap_err();
        match err {
            ProdifyError::FetchStatus { status, .. } => assert_eq!(status, expected),
            other => panic!("expected FetchStatus, got {other:?}"),
        }
        assert_eq!(
            ProdifyError::FetchStatus {
                url: String::new(),
                status: expected
            }
            .kind(),
            ErrorKind::UpstreamFetch
        );
    }
}

#[tokio::test]
async fn unreachable_host_is_fetch_failed() {
    let err = scrape_page("http://127.0.0.1:1/product", &test_config())
        .await
        .unwrap_err();
    assert!(matches!(err, ProdifyError::FetchFailed { .. }), "got {err:?}");
}

#[tokio::test]
async fn relative_url_is_rejected() {
    let err = scrape_page("/product", &test_config()).await.unwrap_err();
    assert!(matches!(err, ProdifyError::InvalidUrl { .. }));
}

// ── Generate ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_produces_sanitised_site() {
    let addr = spawn_product_site().await;
    let model = StubModel::replying(&format!("```json\n{MODEL_JSON}\n```"));
    let progress = RecordingProgress::default();

    let output = generate_site_with_model(
        &model,
        &ExtractorTable::default(),
        &format!("http://{addr}/product"),
        &test_config(),
        &progress,
    )
    .await
    .unwrap();

    assert_eq!(model.call_count(), 1);
    let prompt = model.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("Acme Trail Runner 2"));

    assert_eq!(output.site.slug, "acme-trail-runner-2");
    assert_eq!(output.content.sections.len(), 3);
    assert!(!output.site.html.contains("<script"));
    assert!(!output.site.html.contains("onclick"));
    assert!(output.site.html.contains("Grippy outsole"));
    assert_eq!(
        output.site.og_image.as_deref(),
        Some(format!("http://{addr}/images/shoe-side.jpg").as_str())
    );
    assert!(!output.site.css.is_empty());
    assert_eq!(output.stats.input_tokens, 100);
    assert_eq!(output.stats.output_tokens, 200);

    assert_eq!(
        progress.events(),
        vec![
            "start:fetch",
            "done:fetch",
            "start:extract",
            "done:extract",
            "start:generate",
            "done:generate",
            "start:render",
            "done:render",
            "complete:acme-trail-runner-2",
        ]
    );
}

#[tokio::test]
async fn fetch_failure_never_calls_the_model() {
    let addr = spawn_product_site().await;
    let model = StubModel::replying(MODEL_JSON);
    let progress = RecordingProgress::default();

    let err = generate_site_with_model(
        &model,
        &ExtractorTable::default(),
        &format!("http://{addr}/gone"),
        &test_config(),
        &progress,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ProdifyError::FetchStatus { status: 404, .. }));
    assert_eq!(model.call_count(), 0);
    assert_eq!(progress.events(), vec!["start:fetch", "error:fetch"]);
}

#[tokio::test]
async fn model_failure_surfaces_as_generation_error() {
    let addr = spawn_product_site().await;
    let model = StubModel::failing(503);

    let err = generate_site_with_model(
        &model,
        &ExtractorTable::default(),
        &format!("http://{addr}/product"),
        &test_config(),
        &NoopProgressCallback,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ProdifyError::GenerationFailed {
            status: Some(503),
            ..
        }
    ));
}

#[tokio::test]
async fn unparsable_reply_is_malformed_response() {
    let addr = spawn_product_site().await;
    let model = StubModel::replying("Sorry, I can't help with that.");

    let err = generate_site_with_model(
        &model,
        &ExtractorTable::default(),
        &format!("http://{addr}/product"),
        &test_config(),
        &NoopProgressCallback,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ProdifyError::MalformedResponse(_)));
}

#[tokio::test]
async fn invalid_model_slug_falls_back_to_title() {
    let addr = spawn_product_site().await;
    let reply = MODEL_JSON.replace("\"acme-trail-runner-2\"", "\"!!!\"");
    let model = StubModel::replying(&reply);

    let output = generate_site_with_model(
        &model,
        &ExtractorTable::default(),
        &format!("http://{addr}/product"),
        &test_config(),
        &NoopProgressCallback,
    )
    .await
    .unwrap();

    assert_eq!(output.site.slug, "acme-trail-runner-2-review");
}
