//! axum HTTP surface.
//!
//! ```text
//! GET  /health          liveness
//! POST /api/scrape      {url} → {success, data: ExtractedPageData}
//! POST /api/generate    {url} → {success, product, site, stats}
//! POST /api/publish     PublishRequest → {success, siteId, slug, url}
//! GET  /api/publish     caller's sites, newest first
//! GET  /:slug           public page (+1 view)
//! ```
//!
//! `{slug}.{main_domain}` hosts are rewritten onto `/:slug` before routing.

pub mod error;
pub mod public;
pub mod routes;
pub mod subdomain;

use crate::auth::{AuthProvider, AuthUser, StaticTokenAuth};
use crate::config::AppConfig;
use crate::error::ProdifyError;
use crate::pipeline::llm::ContentModel;
use crate::pipeline::product::ExtractorTable;
use crate::sites::store::{JsonFileSiteStore, MemorySiteStore, SiteStore};
use axum::http::HeaderMap;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SiteStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub extractors: Arc<ExtractorTable>,
    /// Fixed content model. `None` resolves one from the config per request.
    pub model: Option<Arc<dyn ContentModel>>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn SiteStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            auth,
            extractors: Arc::new(ExtractorTable::default()),
            model: None,
        }
    }

    /// State from configuration alone: JSON-file store when `store_path` is
    /// set (in-memory otherwise) and bearer tokens from `api_tokens`.
    pub async fn from_config(config: AppConfig) -> Result<Self, ProdifyError> {
        let store: Arc<dyn SiteStore> = match config.store_path {
            Some(ref path) => Arc::new(JsonFileSiteStore::open(path.clone()).await?),
            None => {
                warn!("No store path configured; published sites live in memory only");
                Arc::new(MemorySiteStore::new())
            }
        };
        let auth = StaticTokenAuth::from_config(&config);
        if auth.is_empty() {
            warn!("No API tokens configured; every /api request will be rejected");
        }
        Ok(Self::new(config, store, Arc::new(auth)))
    }

    pub fn with_model(mut self, model: Arc<dyn ContentModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_extractors(mut self, extractors: ExtractorTable) -> Self {
        self.extractors = Arc::new(extractors);
        self
    }

    pub(crate) async fn require_user(&self, headers: &HeaderMap) -> Result<AuthUser, ProdifyError> {
        self.auth
            .authenticate(headers)
            .await
            .ok_or(ProdifyError::Unauthorized)
    }
}

/// Routes without the host rewrite.
pub fn make_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/scrape", post(routes::scrape))
        .route("/api/generate", post(routes::generate))
        .route("/api/publish", post(routes::publish).get(routes::list))
        .route("/:slug", get(public::show_site))
        .with_state(state)
}

/// Complete application: routes, subdomain rewrite and request tracing.
///
/// The rewrite middleware sits on an outer router whose only route is the
/// inner router as fallback, so the inner router matches the rewritten path.
pub fn build_app(state: AppState) -> Router {
    let main_domain: Arc<str> = Arc::from(state.config.main_domain.as_str());
    let inner = make_router(state);
    Router::new()
        .fallback_service(inner)
        .layer(middleware::from_fn_with_state(
            main_domain,
            subdomain::rewrite_subdomain,
        ))
        .layer(TraceLayer::new_for_http())
}

/// Bind `state.config.bind_addr` and serve until the process stops.
pub async fn serve(state: AppState) -> Result<(), ProdifyError> {
    let addr = state.config.bind_addr;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ProdifyError::Internal(format!("cannot bind {addr}: {e}")))?;
    serve_on(listener, state).await
}

/// Serve on an already-bound listener.
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<(), ProdifyError> {
    let addr = listener
        .local_addr()
        .map_err(|e| ProdifyError::Internal(format!("listener has no address: {e}")))?;
    info!(
        "Serving on http://{} (main domain {})",
        addr, state.config.main_domain
    );
    axum::serve(listener, build_app(state))
        .await
        .map_err(|e| ProdifyError::Internal(format!("server error: {e}")))
}
