//! Page assembler: structured copy + product facts → static HTML and CSS.
//!
//! Rendering is a pure function of its inputs (plus the current year in the
//! footer). Text fields are HTML-escaped. Section bodies are already
//! sanitised HTML fragments and are inserted as markup. The stylesheet is a
//! constant and does not depend on the content.

use crate::output::{AssembledPage, GeneratedContent, ProductSummary, SiteSection};
use chrono::{Datelike, Utc};
use std::fmt::Write as _;

/// Number of product images shown in the gallery.
pub const GALLERY_SIZE: usize = 4;

/// Assemble the publishable page for `content` about `product`.
pub fn render_page(content: &GeneratedContent, product: &ProductSummary) -> AssembledPage {
    AssembledPage {
        html: render_html_with_year(content, product, Utc::now().year()),
        css: STYLESHEET.to_string(),
        title: content.title.clone(),
        description: content.description.clone(),
        slug: content.slug.clone(),
        og_image: product.images.first().cloned(),
    }
}

/// Render the HTML document with a fixed footer year.
pub fn render_html_with_year(content: &GeneratedContent, product: &ProductSummary, year: i32) -> String {
    let title = escape_html(&content.title);
    let description = escape_html(&content.description);
    let keywords = escape_html(&content.keywords.join(", "));

    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    let _ = writeln!(html, "<title>{title}</title>");
    let _ = writeln!(html, "<meta name=\"description\" content=\"{description}\">");
    if !keywords.is_empty() {
        let _ = writeln!(html, "<meta name=\"keywords\" content=\"{keywords}\">");
    }
    let _ = writeln!(html, "<meta property=\"og:title\" content=\"{title}\">");
    let _ = writeln!(html, "<meta property=\"og:description\" content=\"{description}\">");
    html.push_str("<meta property=\"og:type\" content=\"product\">\n");
    if let Some(image) = product.images.first() {
        let _ = writeln!(html, "<meta property=\"og:image\" content=\"{}\">", escape_html(image));
    }
    html.push_str("<meta name=\"twitter:card\" content=\"summary_large_image\">\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header class=\"site-header\">\n<div class=\"container\">\n");
    let _ = writeln!(html, "<h1>{title}</h1>");
    if let Some(ref price) = product.price {
        let _ = writeln!(html, "<span class=\"price\">{}</span>", escape_html(price));
    }
    html.push_str("</div>\n</header>\n");

    html.push_str("<main class=\"container\">\n");
    render_gallery(&mut html, &content.title, &product.images);
    for section in &content.sections {
        render_section(&mut html, section);
    }
    html.push_str(
        "<aside class=\"affiliate-disclaimer\">\n<p>This page contains affiliate links. \
We may earn a commission on purchases made through these links, at no extra cost to you.</p>\n</aside>\n",
    );
    html.push_str("</main>\n");

    let _ = writeln!(
        html,
        "<footer class=\"site-footer\">\n<div class=\"container\">\n<p>&copy; {year} {title}. All rights reserved.</p>\n</div>\n</footer>"
    );
    html.push_str("</body>\n</html>\n");
    html
}

fn render_gallery(html: &mut String, title: &str, images: &[String]) {
    if images.is_empty() {
        return;
    }
    html.push_str("<div class=\"product-gallery\">\n");
    for (i, src) in images.iter().take(GALLERY_SIZE).enumerate() {
        let alt = format!("{} - Image {}", title, i + 1);
        let _ = writeln!(
            html,
            "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
            escape_html(src),
            escape_html(&alt)
        );
    }
    html.push_str("</div>\n");
}

fn render_section(html: &mut String, section: &SiteSection) {
    let _ = writeln!(
        html,
        "<section class=\"{}\">\n<h2>{}</h2>\n<div class=\"section-content\">{}</div>\n</section>",
        section.kind.css_class(),
        escape_html(&section.title),
        section.content
    );
}

/// Add a `<link>` to `styles.css` so the document works as a standalone file
/// next to the stylesheet.
pub fn standalone_document(html: &str) -> String {
    const LINK: &str = "<link rel=\"stylesheet\" href=\"styles.css\">\n";
    match html.find("</head>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + LINK.len());
            out.push_str(&html[..idx]);
            out.push_str(LINK);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{LINK}{html}"),
    }
}

/// Escape text for use in HTML content and double- or single-quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Stylesheet shared by every generated page.
pub const STYLESHEET: &str = r#":root {
  --primary: #2563eb;
  --primary-dark: #1d4ed8;
  --accent: #f59e0b;
  --text: #1f2937;
  --text-muted: #6b7280;
  --bg: #ffffff;
  --bg-alt: #f9fafb;
  --border: #e5e7eb;
  --radius: 12px;
  --shadow: 0 4px 6px -1px rgba(0, 0, 0, 0.1), 0 2px 4px -1px rgba(0, 0, 0, 0.06);
}

* {
  margin: 0;
  padding: 0;
  box-sizing: border-box;
}

body {
  font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
  line-height: 1.7;
  color: var(--text);
  background: var(--bg);
}

.container {
  max-width: 960px;
  margin: 0 auto;
  padding: 0 1.5rem;
}

.site-header {
  background: linear-gradient(135deg, var(--primary) 0%, var(--primary-dark) 100%);
  color: #fff;
  padding: 4rem 0 3rem;
  text-align: center;
}

.site-header h1 {
  font-size: 2.5rem;
  line-height: 1.2;
  margin-bottom: 1rem;
}

.site-header .price {
  display: inline-block;
  background: var(--accent);
  color: #111827;
  font-weight: 700;
  font-size: 1.25rem;
  padding: 0.5rem 1.25rem;
  border-radius: 999px;
}

main.container {
  padding-top: 3rem;
  padding-bottom: 3rem;
}

.product-gallery {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
  gap: 1rem;
  margin-bottom: 3rem;
}

.product-gallery img {
  width: 100%;
  height: 220px;
  object-fit: contain;
  background: var(--bg-alt);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 1rem;
  transition: transform 0.2s ease, box-shadow 0.2s ease;
}

.product-gallery img:hover {
  transform: translateY(-4px);
  box-shadow: var(--shadow);
}

section {
  margin-bottom: 2.5rem;
  padding: 2rem;
  background: var(--bg-alt);
  border-radius: var(--radius);
}

section h2 {
  font-size: 1.75rem;
  margin-bottom: 1rem;
  color: var(--primary-dark);
}

.section-content p {
  margin-bottom: 1rem;
}

.section-content ul,
.section-content ol {
  margin: 1rem 0 1rem 1.5rem;
}

.section-content li {
  margin-bottom: 0.5rem;
}

.section-features li::marker,
.section-benefits li::marker {
  color: var(--primary);
}

.section-comparison table {
  width: 100%;
  border-collapse: collapse;
}

.section-comparison th,
.section-comparison td {
  padding: 0.75rem;
  border-bottom: 1px solid var(--border);
  text-align: left;
}

.section-cta {
  background: linear-gradient(135deg, var(--primary) 0%, var(--primary-dark) 100%);
  color: #fff;
  text-align: center;
}

.section-cta h2 {
  color: #fff;
}

.section-cta a {
  display: inline-block;
  margin-top: 1rem;
  padding: 0.875rem 2rem;
  background: var(--accent);
  color: #111827;
  font-weight: 700;
  text-decoration: none;
  border-radius: 999px;
}

.affiliate-disclaimer {
  font-size: 0.875rem;
  color: var(--text-muted);
  border-left: 4px solid var(--accent);
  padding: 1rem 1.5rem;
  background: var(--bg-alt);
  border-radius: 0 var(--radius) var(--radius) 0;
}

.site-footer {
  border-top: 1px solid var(--border);
  padding: 2rem 0;
  text-align: center;
  color: var(--text-muted);
  font-size: 0.875rem;
}

@media (max-width: 768px) {
  .site-header {
    padding: 2.5rem 0 2rem;
  }

  .site-header h1 {
    font-size: 1.75rem;
  }

  section {
    padding: 1.25rem;
  }

  section h2 {
    font-size: 1.375rem;
  }
}

@media (prefers-reduced-motion: reduce) {
  * {
    transition: none !important;
    animation: none !important;
  }
}

@media (prefers-color-scheme: dark) {
  :root {
    --text: #f3f4f6;
    --text-muted: #9ca3af;
    --bg: #111827;
    --bg-alt: #1f2937;
    --border: #374151;
  }

  section h2 {
    color: #93c5fd;
  }
}
"#;
