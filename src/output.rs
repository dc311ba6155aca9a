//! Data produced by each pipeline stage.
//!
//! All types are plain serialisable values: they are built once per request,
//! returned to the caller, and never mutated afterwards. JSON field names use
//! camelCase because these structs are also the HTTP API payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw fields pulled out of a scraped page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPageData {
    pub url: String,
    pub title: String,
    pub meta_description: String,
    /// Text of every non-empty `<h1>`, in document order.
    #[serde(rename = "h1")]
    pub headings: Vec<String>,
    pub paragraphs: Vec<String>,
    pub images: Vec<ImageRef>,
}

/// An `<img>` found on the scraped page. `src` is absolute when it could be resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
}

/// Product facts distilled from a page by a [`crate::pipeline::product::SiteExtractor`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub url: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// At most [`crate::pipeline::product::MAX_IMAGES`] entries.
    pub images: Vec<String>,
    /// At most [`crate::pipeline::product::MAX_FEATURES`] entries.
    #[serde(default)]
    pub features: Vec<String>,
}

/// Structured marketing copy returned by the generative model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub sections: Vec<SiteSection>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSection {
    pub title: String,
    /// HTML fragment (`<p>`, `<ul>`, `<strong>`…), sanitised before rendering.
    pub content: String,
    #[serde(rename = "type")]
    pub kind: SectionType,
}

/// Role of a section on the generated page.
///
/// The model is asked for one of the six known values but is not forced to
/// comply; anything else is kept verbatim in [`SectionType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SectionType {
    Introduction,
    Features,
    Benefits,
    Comparison,
    Conclusion,
    Cta,
    Other(String),
}

impl SectionType {
    pub fn as_str(&self) -> &str {
        match self {
            SectionType::Introduction => "introduction",
            SectionType::Features => "features",
            SectionType::Benefits => "benefits",
            SectionType::Comparison => "comparison",
            SectionType::Conclusion => "conclusion",
            SectionType::Cta => "cta",
            SectionType::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SectionType::Other(_))
    }

    /// CSS class for the `<section>` element: `section-{type}`.
    ///
    /// Unknown types are reduced to `[a-z0-9-]` so the class attribute can
    /// never break out of its quotes.
    pub fn css_class(&self) -> String {
        let raw: String = self
            .as_str()
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let cleaned = raw
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        if cleaned.is_empty() {
            "section-other".to_string()
        } else {
            format!("section-{cleaned}")
        }
    }
}

impl From<String> for SectionType {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "introduction" => SectionType::Introduction,
            "features" => SectionType::Features,
            "benefits" => SectionType::Benefits,
            "comparison" => SectionType::Comparison,
            "conclusion" => SectionType::Conclusion,
            "cta" => SectionType::Cta,
            _ => SectionType::Other(raw),
        }
    }
}

impl From<SectionType> for String {
    fn from(t: SectionType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete static page ready to publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledPage {
    pub html: String,
    pub css: String,
    pub title: String,
    pub description: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
}

/// Timing and token accounting for one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStats {
    pub fetch_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Everything one `generate_site` call produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub product: ProductSummary,
    pub content: GeneratedContent,
    pub site: AssembledPage,
    pub stats: GenerationStats,
}
