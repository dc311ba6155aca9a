//! Public `/{slug}` pages.
//!
//! The stored HTML is served verbatim with the stored CSS in a `<style>`
//! element and a fixed attribution badge. Head metadata comes from the
//! stored title, description and image. Every successful read counts as a
//! view.

use crate::error::{ErrorKind, ProdifyError};
use crate::pipeline::render::escape_html;
use crate::server::AppState;
use crate::sites::service::view_site;
use crate::sites::PublishedSite;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::error;

static RE_STYLE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</style").unwrap());

/// Badge markup appended to every public page.
pub const BADGE_HTML: &str = r#"<a href="/" class="prodify-badge" style="position:fixed;bottom:16px;right:16px;z-index:2147483647;padding:8px 14px;border-radius:999px;background:#111827;color:#fff;font:600 13px/1.2 -apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;text-decoration:none;box-shadow:0 4px 12px rgba(0,0,0,.25)">Made with Prodify</a>"#;

/// Description used in head metadata when the site has none.
pub const FALLBACK_DESCRIPTION: &str = "Discover this amazing product";

pub async fn show_site(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    match view_site(state.store.as_ref(), &slug).await {
        Ok(site) => Html(render_public_page(&site)).into_response(),
        Err(e) if e.kind() == ErrorKind::NotFound => not_found(&slug),
        Err(e) => {
            error!("Failed to load site '{}': {}", slug, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<!DOCTYPE html><html><body><h1>Something went wrong</h1></body></html>"),
            )
                .into_response()
        }
    }
}

fn not_found(slug: &str) -> Response {
    let err = ProdifyError::SiteNotFound {
        slug: slug.to_string(),
    };
    (
        StatusCode::NOT_FOUND,
        Html(format!(
            "<!DOCTYPE html><html><head><title>Not found</title></head><body><h1>404</h1><p>{}</p><p><a href=\"/\">Back to Prodify</a></p></body></html>",
            escape_html(&err.to_string())
        )),
    )
        .into_response()
}

/// Full HTML document for a stored site.
///
/// A stored full document keeps its own `<head>`; the stylesheet and the
/// badge are spliced in. A fragment is wrapped in a fresh document.
pub fn render_public_page(site: &PublishedSite) -> String {
    let style = format!("<style>{}</style>\n", RE_STYLE_CLOSE.replace_all(&site.css, "<\\/style"));
    let lower = site.html.to_ascii_lowercase();

    if let (Some(head_end), Some(body_end)) = (lower.find("</head>"), lower.rfind("</body>")) {
        if head_end < body_end {
            let mut out = String::with_capacity(site.html.len() + style.len() + BADGE_HTML.len());
            out.push_str(&site.html[..head_end]);
            out.push_str(&style);
            out.push_str(&site.html[head_end..body_end]);
            out.push_str(BADGE_HTML);
            out.push('\n');
            out.push_str(&site.html[body_end..]);
            return out;
        }
    }

    let title = escape_html(&site.title);
    let description = if site.description.trim().is_empty() {
        FALLBACK_DESCRIPTION.to_string()
    } else {
        escape_html(&site.description)
    };
    let og_image = site
        .og_image
        .as_deref()
        .map(|src| format!("<meta property=\"og:image\" content=\"{}\">\n", escape_html(src)))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
<title>{title}</title>\n<meta name=\"description\" content=\"{description}\">\n\
<meta property=\"og:title\" content=\"{title}\">\n<meta property=\"og:description\" content=\"{description}\">\n\
{og_image}{style}</head>\n<body>\n{html}\n{BADGE_HTML}\n</body>\n</html>\n",
        html = site.html,
    )
}
