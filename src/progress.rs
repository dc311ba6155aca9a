//! Progress-callback trait for generation stage events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] into
//! [`crate::generate::generate_site_with_progress`] to observe the pipeline as
//! it moves through fetch → extract → generate → render. The CLI uses this to
//! drive a spinner; a server could forward events to a log or a websocket.
//!
//! # Example
//!
//! ```rust
//! use prodify::{GenerationProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: Arc<AtomicUsize>,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage} finished in {elapsed_ms}ms");
//!     }
//! }
//!
//! let cb: Arc<dyn GenerationProgressCallback> = Arc::new(CountingCallback {
//!     done: Arc::new(AtomicUsize::new(0)),
//! });
//! cb.on_stage_complete(Stage::Fetch, 12);
//! ```

use std::fmt;
use std::sync::Arc;

/// Pipeline stage reported to a [`GenerationProgressCallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// HTTP GET of the source page.
    Fetch,
    /// DOM extraction and product heuristics.
    Extract,
    /// Prompt, model call and response parsing.
    Generate,
    /// HTML/CSS assembly.
    Render,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Extract => "extract",
            Stage::Generate => "generate",
            Stage::Render => "render",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the generation pipeline as it moves through its stages.
///
/// All methods default to no-ops so implementors only override what they
/// need. Implementations must be `Send + Sync`; server handlers run on the
/// multi-threaded runtime.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called before a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called after a stage succeeded.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a stage fails; no further stages run.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after the page has been assembled.
    ///
    /// * `slug`        — slug of the generated page
    /// * `total_ms`    — wall-clock duration of the whole run
    fn on_generation_complete(&self, slug: &str, total_ms: u64) {
        let _ = (slug, total_ms);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias for the shared callback handle.
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
