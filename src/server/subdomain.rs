//! Host-based routing: `{slug}.{main_domain}/…` is served as `/{slug}/…`.

use crate::sites::slug::is_valid_slug;
use axum::extract::{Request, State};
use axum::http::{header, Uri};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use tracing::debug;

/// Path prefixes that are never rewritten.
pub const PASSTHROUGH_PREFIXES: [&str; 4] = ["/_next", "/api", "/static", "/health"];

/// Rewritten path for a request to `host` + `path`, or `None` to leave it alone.
///
/// `host` and `main_domain` may carry a port; both are compared case-insensitively.
pub fn rewrite_path(host: &str, path: &str, main_domain: &str) -> Option<String> {
    let host = host.trim().to_ascii_lowercase();
    let main_domain = main_domain.to_ascii_lowercase();

    if host == main_domain || host.starts_with("www.") {
        return None;
    }
    if PASSTHROUGH_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return None;
    }
    let subdomain = host.strip_suffix(main_domain.as_str())?.strip_suffix('.')?;
    if !is_valid_slug(subdomain) {
        return None;
    }

    Some(if path == "/" || path.is_empty() {
        format!("/{subdomain}")
    } else {
        format!("/{subdomain}{path}")
    })
}

/// Middleware rewriting the request URI according to [`rewrite_path`].
///
/// Must wrap the router from the outside so routing sees the new path.
pub async fn rewrite_subdomain(State(main_domain): State<Arc<str>>, mut req: Request, next: Next) -> Response {
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|a| a.to_string()));

    if let Some(host) = host {
        if let Some(new_path) = rewrite_path(&host, req.uri().path(), &main_domain) {
            let path_and_query = match req.uri().query() {
                Some(q) => format!("{new_path}?{q}"),
                None => new_path,
            };
            match path_and_query.parse::<Uri>() {
                Ok(uri) => {
                    debug!("Rewrote {}{} to {}", host, req.uri().path(), uri);
                    *req.uri_mut() = uri;
                }
                Err(e) => debug!("Not rewriting {}: {}", path_and_query, e),
            }
        }
    }

    next.run(req).await
}
