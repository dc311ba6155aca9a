//! Publish/serve surface: persisted sites, the store abstraction and the
//! operations the HTTP layer calls.
//!
//! * [`slug`]    — slug validation and derivation
//! * [`store`]   — [`store::SiteStore`] trait plus in-memory and JSON-file stores
//! * [`service`] — `publish_site`, `list_sites`, `view_site`

pub mod service;
pub mod slug;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A site as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedSite {
    pub id: Uuid,
    pub user_id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub html: String,
    pub css: String,
    #[serde(default)]
    pub og_image: Option<String>,
    #[serde(default)]
    pub product_url: Option<String>,
    pub published: bool,
    pub views: u64,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a site; id, counters and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSite {
    pub user_id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub html: String,
    pub css: String,
    pub og_image: Option<String>,
    pub product_url: Option<String>,
}

/// Dashboard row for one of the caller's sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub og_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub views: u64,
}

impl From<&PublishedSite> for SiteSummary {
    fn from(site: &PublishedSite) -> Self {
        Self {
            id: site.id,
            slug: site.slug.clone(),
            title: site.title.clone(),
            description: site.description.clone(),
            og_image: site.og_image.clone(),
            created_at: site.created_at,
            views: site.views,
        }
    }
}

/// `POST /api/publish` body. Every field is optional at the wire level so
/// missing ones can be reported together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub css: Option<String>,
    #[serde(default)]
    pub og_image: Option<String>,
    #[serde(default)]
    pub product_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub success: bool,
    pub site_id: Uuid,
    pub slug: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteList {
    pub success: bool,
    pub sites: Vec<SiteSummary>,
}
