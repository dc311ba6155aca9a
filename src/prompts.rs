//! Prompt template and response schema for affiliate-page generation.
//!
//! Centralising the prompt here keeps the wording in one place and lets
//! tests inspect it without calling a model. Callers can replace the
//! instruction preamble via [`crate::config::AppConfig::system_prompt`];
//! the product block and the JSON contract are always appended.

use crate::output::ProductSummary;
use serde_json::{json, Value};

/// Default instruction preamble.
pub const DEFAULT_INSTRUCTIONS: &str = r#"You are an expert in affiliate marketing websites and SEO. Write optimised content for an affiliate page about the product below.

Produce:
1. A catchy SEO title (at most 60 characters)
2. An engaging meta description (at most 160 characters)
3. A URL slug (lowercase words joined by single hyphens)
4. 5 to 6 structured sections, in this order:
   - introduction: why this product is worth a look
   - features: the main technical characteristics
   - benefits: what the buyer actually gains
   - comparison: who it is ideal for, how it compares
   - conclusion: verdict and recommendation
   - cta: a persuasive call to action
5. 5 to 7 relevant SEO keywords"#;

/// Output contract appended after the product block.
pub const JSON_CONTRACT: &str = r#"IMPORTANT: Answer ONLY with valid JSON, no markdown, no code fences.

Expected JSON shape:
{
  "title": "SEO title",
  "description": "Meta description",
  "slug": "url-slug",
  "sections": [
    {
      "title": "Section title",
      "content": "Section body as HTML (<p>, <ul>, <li>, <strong>)",
      "type": "introduction"
    }
  ],
  "keywords": ["keyword-1", "keyword-2"]
}

Allowed section types: introduction, features, benefits, comparison, conclusion, cta."#;

const NOT_AVAILABLE: &str = "Not available";

/// Build the full prompt for one product.
pub fn build_prompt(product: &ProductSummary, instructions: Option<&str>) -> String {
    let instructions = instructions.unwrap_or(DEFAULT_INSTRUCTIONS);
    let price = product
        .price
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(NOT_AVAILABLE);
    let features = if product.features.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        product.features.join(", ")
    };

    format!(
        "{instructions}\n\n\
Product title: {title}\n\
Description: {description}\n\
Price: {price}\n\
Features: {features}\n\n\
{JSON_CONTRACT}",
        title = product.title,
        description = product.description,
    )
}

/// JSON schema sent as `responseSchema` so the model's output is constrained.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string", "description": "SEO optimised title" },
            "description": { "type": "string", "description": "Meta description" },
            "slug": { "type": "string", "description": "URL slug" },
            "sections": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "content": { "type": "string" },
                        "type": { "type": "string" }
                    },
                    "required": ["title", "content", "type"]
                }
            },
            "keywords": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["title", "description", "slug", "sections", "keywords"]
    })
}
