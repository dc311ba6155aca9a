//! Pipeline stages for product-page → affiliate-site generation.
//!
//! Each submodule implements exactly one transformation step and is
//! testable on its own; [`crate::generate`] wires them together.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ extract / product ──▶ llm ──▶ postprocess ──▶ render
//! (HTTP)    (DOM queries)         (AI)    (cleanup)       (HTML+CSS)
//! ```
//!
//! 1. [`fetch`]   — validate the URL and GET it with a browser User-Agent
//! 2. [`extract`] — generic page fields for `/api/scrape`
//! 3. [`product`] — site-specific product summary via an extractor table
//! 4. [`llm`]     — one structured-JSON model call; the only stage besides
//!    fetch with network I/O
//! 5. [`postprocess`] — deterministic cleanup of the reply and its HTML
//! 6. [`render`]  — HTML template plus the constant stylesheet

pub mod extract;
pub mod fetch;
pub mod llm;
pub mod postprocess;
pub mod product;
pub mod render;
