//! Product-summary heuristics: turn a product page into a [`ProductSummary`].
//!
//! Site-specific knowledge lives in [`SiteExtractor`] implementations held
//! in an ordered [`ExtractorTable`]. The first extractor whose `matches`
//! returns true handles the page, so supporting a new shop means pushing one
//! more extractor in front of the generic fallback.

use crate::output::ProductSummary;
use crate::pipeline::extract::{all_texts, element_text, first_attr, first_text, resolve_image_url};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

/// Maximum number of product images kept.
pub const MAX_IMAGES: usize = 5;
/// Maximum number of feature bullets kept.
pub const MAX_FEATURES: usize = 10;

/// One site-specific extraction strategy.
pub trait SiteExtractor: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether this extractor understands pages at `url`.
    fn matches(&self, url: &str) -> bool;

    /// Pull product fields out of the parsed page. Limits are applied by the table.
    fn extract(&self, doc: &Html, url: &str) -> ProductSummary;
}

/// Ordered list of extractors; first match wins.
pub struct ExtractorTable {
    extractors: Vec<Box<dyn SiteExtractor>>,
}

impl Default for ExtractorTable {
    /// Amazon first, then the generic fallback.
    fn default() -> Self {
        Self {
            extractors: vec![Box::new(AmazonExtractor), Box::new(GenericExtractor)],
        }
    }
}

impl ExtractorTable {
    /// An empty table. Pages that match nothing get an empty summary.
    pub fn empty() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Append an extractor at the lowest priority.
    pub fn push(mut self, extractor: impl SiteExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    /// Insert an extractor at the highest priority.
    pub fn prepend(mut self, extractor: impl SiteExtractor + 'static) -> Self {
        self.extractors.insert(0, Box::new(extractor));
        self
    }

    /// Names in priority order.
    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// Summarise the page at `url` whose markup is `html`.
    pub fn summarize(&self, html: &str, url: &str) -> ProductSummary {
        let Some(extractor) = self.extractors.iter().find(|e| e.matches(url)) else {
            debug!("No extractor matched {}", url);
            return ProductSummary {
                url: url.to_string(),
                ..Default::default()
            };
        };

        debug!("Using '{}' extractor for {}", extractor.name(), url);
        let doc = Html::parse_document(html);
        let mut summary = extractor.extract(&doc, url);
        summary.url = url.to_string();
        summary.images.truncate(MAX_IMAGES);
        summary.features.truncate(MAX_FEATURES);
        summary.price = summary.price.filter(|p| !p.trim().is_empty());
        summary
    }
}

// ── Amazon ───────────────────────────────────────────────────────────────────

static SEL_AMZ_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("#productTitle").unwrap());
static SEL_AMZ_BULLETS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#feature-bullets ul li").unwrap());
static SEL_AMZ_PRICE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".a-price .a-offscreen").unwrap());
static SEL_AMZ_ALT_IMAGES: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#altImages img").unwrap());

/// Amazon product pages (`amazon.` anywhere in the URL).
pub struct AmazonExtractor;

impl SiteExtractor for AmazonExtractor {
    fn name(&self) -> &'static str {
        "amazon"
    }

    fn matches(&self, url: &str) -> bool {
        url.contains("amazon.")
    }

    fn extract(&self, doc: &Html, url: &str) -> ProductSummary {
        let features = all_texts(doc, &SEL_AMZ_BULLETS);
        let description = doc
            .select(&SEL_AMZ_BULLETS)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let images = doc
            .select(&SEL_AMZ_ALT_IMAGES)
            .filter_map(|img| img.value().attr("src"))
            .filter(|src| !src.trim().is_empty())
            .map(|src| resolve_image_url(src, url))
            .collect();

        ProductSummary {
            url: url.to_string(),
            title: first_text(doc, &SEL_AMZ_TITLE).unwrap_or_default(),
            description,
            price: first_text(doc, &SEL_AMZ_PRICE),
            images,
            features,
        }
    }
}

// ── Generic fallback ─────────────────────────────────────────────────────────

static SEL_H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static SEL_OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static SEL_META_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static SEL_OG_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:description"]"#).unwrap());
static SEL_IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Any page: first `<h1>`/`og:title`, meta description, non-logo images.
pub struct GenericExtractor;

impl SiteExtractor for GenericExtractor {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn matches(&self, _url: &str) -> bool {
        true
    }

    fn extract(&self, doc: &Html, url: &str) -> ProductSummary {
        let title = first_text(doc, &SEL_H1)
            .or_else(|| first_attr(doc, &SEL_OG_TITLE, "content"))
            .unwrap_or_default();
        let description = first_attr(doc, &SEL_META_DESCRIPTION, "content")
            .or_else(|| first_attr(doc, &SEL_OG_DESCRIPTION, "content"))
            .unwrap_or_default();
        let images = doc
            .select(&SEL_IMG)
            .filter_map(|img| img.value().attr("src"))
            .filter(|src| !src.trim().is_empty() && !is_decorative(src))
            .map(|src| resolve_image_url(src, url))
            .collect();

        ProductSummary {
            url: url.to_string(),
            title,
            description,
            price: None,
            images,
            features: Vec::new(),
        }
    }
}

fn is_decorative(src: &str) -> bool {
    src.contains("logo") || src.contains("icon")
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMAZON_PAGE: &str = r#"<html><body>
<span id="productTitle">  Acme Noise-Cancelling Headphones  </span>
<span class="a-price"><span class="a-offscreen">$199.99</span></span>
<div id="feature-bullets"><ul>
  <li> 30h battery </li>
  <li>Bluetooth 5.3</li>
  <li>   </li>
  <li>Foldable</li>
</ul></div>
<div id="altImages">
  <img src="https://m.media-amazon.test/1.jpg">
  <img src="https://m.media-amazon.test/2.jpg">
</div>
</body></html>"#;

    #[test]
    fn amazon_page_uses_amazon_selectors() {
        let table = ExtractorTable::default();
        let s = table.summarize(AMAZON_PAGE, "https://www.amazon.fr/dp/B0TEST");
        assert_eq!(s.title, "Acme Noise-Cancelling Headphones");
        assert_eq!(s.description, "30h battery");
        assert_eq!(s.price.as_deref(), Some("$199.99"));
        assert_eq!(s.features, vec!["30h battery", "Bluetooth 5.3", "Foldable"]);
        assert_eq!(s.images.len(), 2);
    }

    #[test]
    fn generic_page_prefers_h1_then_og_title() {
        let html = r#"<head><meta property="og:title" content="OG Title">
<meta name="description" content="Desc"></head>
<body><img src="/logo.png"><img src="/icons/cart.svg"><img src="/p/1.jpg"></body>"#;
        let s = ExtractorTable::default().summarize(html, "https://shop.test/p");
        assert_eq!(s.title, "OG Title");
        assert_eq!(s.description, "Desc");
        assert_eq!(s.images, vec!["https://shop.test/p/1.jpg"]);
        assert!(s.price.is_none());
        assert!(s.features.is_empty());

        let with_h1 = format!("{html}<h1>Real Title</h1>");
        let s = ExtractorTable::default().summarize(&with_h1, "https://shop.test/p");
        assert_eq!(s.title, "Real Title");
    }

    #[test]
    fn limits_are_applied() {
        let imgs: String = (0..12).map(|i| format!("<img src=\"/p/{i}.jpg\">")).collect();
        let s = ExtractorTable::default().summarize(&imgs, "https://shop.test/");
        assert_eq!(s.images.len(), MAX_IMAGES);
        assert_eq!(s.images[0], "https://shop.test/p/0.jpg");

        let bullets: String = (0..15).map(|i| format!("<li>f{i}</li>")).collect();
        let html = format!("<div id=\"feature-bullets\"><ul>{bullets}</ul></div>");
        let s = ExtractorTable::default().summarize(&html, "https://amazon.test/x");
        assert_eq!(s.features.len(), MAX_FEATURES);
    }

    struct ShopExtractor;

    impl SiteExtractor for ShopExtractor {
        fn name(&self) -> &'static str {
            "shop"
        }
        fn matches(&self, url: &str) -> bool {
            url.contains("shop.test")
        }
        fn extract(&self, _doc: &Html, _url: &str) -> ProductSummary {
            ProductSummary {
                title: "from shop".into(),
                price: Some("  ".into()),
                ..Default::default()
            }
        }
    }

    #[test]
    fn prepended_extractor_wins_and_blank_price_is_dropped() {
        let table = ExtractorTable::default().prepend(ShopExtractor);
        assert_eq!(table.names(), vec!["shop", "amazon", "generic"]);
        let s = table.summarize("<h1>ignored</h1>", "https://shop.test/x");
        assert_eq!(s.title, "from shop");
        assert_eq!(s.url, "https://shop.test/x");
        assert!(s.price.is_none());
    }

    #[test]
    fn empty_table_yields_empty_summary() {
        let s = ExtractorTable::empty().summarize("<h1>x</h1>", "https://a.test");
        assert!(s.title.is_empty());
        assert_eq!(s.url, "https://a.test");
    }
}
