//! Top-level entry points: scrape a page, summarise a product, generate a site.
//!
//! Control flow is linear per call: fetch → extract → generate → render.
//! Nothing is retried or cached, and a failed stage aborts the run before
//! the next one starts.

use crate::config::AppConfig;
use crate::error::ProdifyError;
use crate::output::{AssembledPage, ExtractedPageData, GenerationOutput, GenerationStats, ProductSummary};
use crate::pipeline::llm::{generate_content, resolve_model, ContentModel};
use crate::pipeline::product::ExtractorTable;
use crate::pipeline::{extract, fetch, render};
use crate::progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Fetch `url` and extract its generic page fields.
///
/// Fails with [`ProdifyError::InvalidUrl`] before any network traffic when
/// `url` is not an absolute HTTP(S) URL.
pub async fn scrape_page(url: &str, config: &AppConfig) -> Result<ExtractedPageData, ProdifyError> {
    let page_url = fetch::parse_page_url(url)?;
    let client = fetch::build_client(config)?;
    let html = fetch::fetch_html(&client, &page_url).await?;
    Ok(extract::extract_page_data(&html, page_url.as_str()))
}

/// Fetch `url` and summarise it with the default extractor table.
pub async fn summarize_product(url: &str, config: &AppConfig) -> Result<ProductSummary, ProdifyError> {
    summarize_product_with(&ExtractorTable::default(), url, config).await
}

/// Fetch `url` and summarise it with a caller-supplied extractor table.
pub async fn summarize_product_with(
    extractors: &ExtractorTable,
    url: &str,
    config: &AppConfig,
) -> Result<ProductSummary, ProdifyError> {
    let page_url = fetch::parse_page_url(url)?;
    let client = fetch::build_client(config)?;
    let html = fetch::fetch_html(&client, &page_url).await?;
    Ok(extractors.summarize(&html, page_url.as_str()))
}

/// Generate a complete affiliate page for the product at `url`.
///
/// The model is chosen by [`resolve_model`]; with the default Gemini backend
/// a missing `GOOGLE_API_KEY` fails here, before the page is fetched.
///
/// # Example
/// ```rust,no_run
/// use prodify::{generate_site, AppConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AppConfig::from_env()?;
/// let output = generate_site("https://shop.example/p/42", &config).await?;
/// println!("{} -> /{}", output.site.title, output.site.slug);
/// # Ok(())
/// # }
/// ```
pub async fn generate_site(url: &str, config: &AppConfig) -> Result<GenerationOutput, ProdifyError> {
    generate_site_with_progress(url, config, std::sync::Arc::new(NoopProgressCallback)).await
}

/// [`generate_site`] with stage events delivered to `progress`.
pub async fn generate_site_with_progress(
    url: &str,
    config: &AppConfig,
    progress: ProgressCallback,
) -> Result<GenerationOutput, ProdifyError> {
    let client = fetch::build_client(config)?;
    let model = resolve_model(config, client)?;
    generate_site_with_model(
        model.as_ref(),
        &ExtractorTable::default(),
        url,
        config,
        progress.as_ref(),
    )
    .await
}

/// Run the whole pipeline with an explicit model and extractor table.
pub async fn generate_site_with_model(
    model: &dyn ContentModel,
    extractors: &ExtractorTable,
    url: &str,
    config: &AppConfig,
    progress: &dyn GenerationProgressCallback,
) -> Result<GenerationOutput, ProdifyError> {
    let total_start = Instant::now();
    info!("Starting generation: {}", url);

    let page_url = fetch::parse_page_url(url)?;
    let client = fetch::build_client(config)?;

    // ── Step 1: Fetch ────────────────────────────────────────────────────
    let (html, fetch_duration_ms) =
        run_stage(progress, Stage::Fetch, fetch::fetch_html(&client, &page_url)).await?;

    // ── Step 2: Extract ──────────────────────────────────────────────────
    let (product, _) = run_stage(progress, Stage::Extract, async {
        Ok(extractors.summarize(&html, page_url.as_str()))
    })
    .await?;
    debug!(
        "Product '{}': {} images, {} features, price {:?}",
        product.title,
        product.images.len(),
        product.features.len(),
        product.price
    );

    // ── Step 3: Generate ─────────────────────────────────────────────────
    let (generated, llm_duration_ms) = run_stage(
        progress,
        Stage::Generate,
        generate_content(model, &product, config),
    )
    .await?;

    // ── Step 4: Render ───────────────────────────────────────────────────
    let (site, render_duration_ms) = run_stage(progress, Stage::Render, async {
        Ok(render::render_page(&generated.content, &product))
    })
    .await?;

    let stats = GenerationStats {
        fetch_duration_ms,
        llm_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        input_tokens: generated.input_tokens,
        output_tokens: generated.output_tokens,
    };

    info!(
        "Generation complete: '{}' ({} sections) in {}ms",
        site.slug,
        generated.content.sections.len(),
        stats.total_duration_ms
    );
    progress.on_generation_complete(&site.slug, stats.total_duration_ms);

    Ok(GenerationOutput {
        product,
        content: generated.content,
        site,
        stats,
    })
}

/// Generate a site and write `index.html` + `styles.css` into `dir`.
pub async fn generate_site_to_dir(
    url: &str,
    dir: impl AsRef<Path>,
    config: &AppConfig,
) -> Result<GenerationOutput, ProdifyError> {
    let output = generate_site(url, config).await?;
    write_site_dir(&output.site, dir).await?;
    Ok(output)
}

/// Write an assembled page as a standalone static site.
///
/// Uses atomic writes (temp file + rename) so a crash never leaves a
/// half-written file. Returns the paths written.
pub async fn write_site_dir(site: &AssembledPage, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ProdifyError> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ProdifyError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let index = dir.join("index.html");
    let styles = dir.join("styles.css");
    write_atomic(&index, &render::standalone_document(&site.html)).await?;
    write_atomic(&styles, &site.css).await?;
    info!("Wrote {} and {}", index.display(), styles.display());
    Ok(vec![index, styles])
}

async fn write_atomic(path: &Path, contents: &str) -> Result<(), ProdifyError> {
    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| ProdifyError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ProdifyError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Run one stage, timing it and reporting start/complete/error events.
async fn run_stage<T, F>(
    progress: &dyn GenerationProgressCallback,
    stage: Stage,
    fut: F,
) -> Result<(T, u64), ProdifyError>
where
    F: Future<Output = Result<T, ProdifyError>>,
{
    progress.on_stage_start(stage);
    let start = Instant::now();
    match fut.await {
        Ok(value) => {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            debug!("Stage {} finished in {}ms", stage, elapsed_ms);
            progress.on_stage_complete(stage, elapsed_ms);
            Ok((value, elapsed_ms))
        }
        Err(e) => {
            progress.on_stage_error(stage, &e.to_string());
            Err(e)
        }
    }
}
