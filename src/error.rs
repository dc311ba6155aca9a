//! Error types for the prodify library.
//!
//! Every failure in the scrape → generate → render → publish chain is a
//! [`ProdifyError`]. Variants are grouped by the four families the HTTP
//! surface distinguishes (see [`ErrorKind`]):
//!
//! * **Configuration** — a required setting is missing; nothing external was
//!   contacted yet.
//! * **Upstream** — the source page or the generative endpoint failed.
//! * **Validation** — the caller sent something unusable (bad URL, bad slug,
//!   duplicate slug, missing fields).
//! * **Auth** — no authenticated caller.
//!
//! The server layer maps [`ProdifyError::status_code`] onto the response and
//! wraps the message in a JSON envelope; the CLI adds `anyhow` context on top.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the prodify library.
#[derive(Debug, Error)]
pub enum ProdifyError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// The generative API key is not set.
    #[error("API key not configured.\nSet {var} before generating content.")]
    MissingApiKey { var: String },

    /// A named edgequake-llm provider could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Upstream errors ───────────────────────────────────────────────────
    /// The source page could not be fetched (DNS, connect, TLS, body read).
    #[error("Failed to fetch '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// The source page answered with a non-success status.
    #[error("Fetching '{url}' returned HTTP {status}")]
    FetchStatus { url: String, status: u16 },

    /// The generative endpoint call failed or returned a non-success status.
    #[error("Content generation failed (status {status:?}): {detail}")]
    GenerationFailed { status: Option<u16>, detail: String },

    /// The generative endpoint answered but not with the expected shape.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    // ── Validation errors ─────────────────────────────────────────────────
    /// The input is not an absolute HTTP/HTTPS URL.
    #[error("Invalid URL '{input}': expected an absolute http:// or https:// URL")]
    InvalidUrl { input: String },

    /// A request body was empty.
    #[error("Request body is empty")]
    EmptyBody,

    /// A request body was not valid JSON for the expected shape.
    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    /// Required publish fields are missing or blank.
    #[error("Missing required fields: {0}")]
    MissingFields(String),

    /// The slug does not match the lowercase-kebab-case pattern.
    #[error("Invalid slug '{slug}': use lowercase letters, digits and single hyphens")]
    InvalidSlug { slug: String },

    /// A site with this slug already exists.
    #[error("Slug '{slug}' is already taken. Choose another one.")]
    SlugTaken { slug: String },

    // ── Auth errors ───────────────────────────────────────────────────────
    /// No authenticated caller.
    #[error("Unauthorized")]
    Unauthorized,

    // ── Lookup errors ─────────────────────────────────────────────────────
    /// No published site exists for the slug.
    #[error("No published site for slug '{slug}'")]
    SiteNotFound { slug: String },

    // ── Storage / I/O errors ──────────────────────────────────────────────
    /// The site store failed to read or persist.
    #[error("Site store error: {0}")]
    Store(String),

    /// Could not write generated output files.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used for status mapping and client-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    UpstreamFetch,
    Validation,
    Conflict,
    Auth,
    NotFound,
    Internal,
}

impl ProdifyError {
    pub fn kind(&self) -> ErrorKind {
        use ProdifyError::*;
        match self {
            MissingApiKey { .. } | ProviderNotConfigured { .. } | InvalidConfig(_) => {
                ErrorKind::Configuration
            }
            FetchFailed { .. }
            | FetchStatus { .. }
            | GenerationFailed { .. }
            | MalformedResponse(_) => ErrorKind::UpstreamFetch,
            InvalidUrl { .. }
            | EmptyBody
            | InvalidJson(_)
            | MissingFields(_)
            | InvalidSlug { .. } => ErrorKind::Validation,
            SlugTaken { .. } => ErrorKind::Conflict,
            Unauthorized => ErrorKind::Auth,
            SiteNotFound { .. } => ErrorKind::NotFound,
            Store(_) | OutputWriteFailed { .. } | Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::Auth => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Configuration | ErrorKind::UpstreamFetch | ErrorKind::Internal => 500,
        }
    }

    /// Message safe to show to an HTTP client.
    ///
    /// Validation, auth and lookup errors carry their own message. Upstream
    /// and internal failures collapse to a generic sentence; the detail is
    /// only logged.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Conflict | ErrorKind::Auth | ErrorKind::NotFound => {
                self.to_string()
            }
            ErrorKind::Configuration => "Server is not configured for content generation".into(),
            ErrorKind::UpstreamFetch => match self {
                ProdifyError::FetchFailed { .. } | ProdifyError::FetchStatus { .. } => {
                    "Could not retrieve the product page".into()
                }
                _ => "Could not generate site content".into(),
            },
            ErrorKind::Internal => "Internal server error".into(),
        }
    }
}

impl From<serde_json::Error> for ProdifyError {
    fn from(e: serde_json::Error) -> Self {
        ProdifyError::InvalidJson(e.to_string())
    }
}
