//! # prodify
//!
//! Turn a product-page URL into a published affiliate micro-site.
//!
//! ## Pipeline Overview
//!
//! ```text
//! product URL
//!  │
//!  ├─ 1. Fetch     GET with a browser User-Agent
//!  ├─ 2. Extract   DOM queries: title, description, price, images, features
//!  ├─ 3. Generate  one structured-JSON call to Gemini (or any edgequake-llm provider)
//!  ├─ 4. Polish    strip fences, normalise the slug, sanitise section HTML
//!  ├─ 5. Render    HTML template + constant responsive stylesheet
//!  └─ 6. Publish   slug-addressed public page with a view counter
//! ```
//!
//! Steps 1–5 are library functions ([`generate_site`], [`scrape_page`]);
//! step 6 lives in [`sites`] and is exposed over HTTP by [`server`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prodify::{generate_site, AppConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // GOOGLE_API_KEY must be set for the default Gemini backend.
//!     let config = AppConfig::from_env()?;
//!     let output = generate_site("https://shop.example/p/42", &config).await?;
//!     println!("{}", output.site.html);
//!     eprintln!("tokens: {} in / {} out",
//!         output.stats.input_tokens,
//!         output.stats.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `prodify` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! prodify = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod auth;
pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod server;
pub mod sites;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use auth::{AuthProvider, AuthUser, StaticTokenAuth};
pub use config::{AppConfig, AppConfigBuilder};
pub use error::{ErrorKind, ProdifyError};
pub use generate::{
    generate_site, generate_site_to_dir, generate_site_with_model, generate_site_with_progress,
    scrape_page, summarize_product, write_site_dir,
};
pub use output::{
    AssembledPage, ExtractedPageData, GeneratedContent, GenerationOutput, GenerationStats,
    ImageRef, ProductSummary, SectionType, SiteSection,
};
pub use pipeline::llm::{ContentModel, ModelReply};
pub use pipeline::product::{ExtractorTable, SiteExtractor};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use server::{build_app, serve, AppState};
pub use sites::store::{JsonFileSiteStore, MemorySiteStore, SiteStore};
