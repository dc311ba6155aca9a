//! Site persistence.
//!
//! [`SiteStore`] is the seam between the publish/serve operations and
//! storage. Both provided stores keep the slug-uniqueness check and the view
//! counter increment under a single write lock, so two concurrent publishes
//! of one slug cannot both succeed and no view is lost.

use crate::error::ProdifyError;
use crate::sites::{NewSite, PublishedSite};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, error, info};
use uuid::Uuid;

#[async_trait]
pub trait SiteStore: Send + Sync {
    /// Insert a new published site. Fails with [`ProdifyError::SlugTaken`]
    /// when the slug already exists.
    async fn insert(&self, site: NewSite) -> Result<PublishedSite, ProdifyError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, ProdifyError>;

    /// Published site for `slug`, without touching its counters.
    async fn find_published(&self, slug: &str) -> Result<Option<PublishedSite>, ProdifyError>;

    /// Increment the view counter of a published site and return it.
    /// `None` when the slug is unknown or unpublished.
    async fn record_view(&self, slug: &str) -> Result<Option<PublishedSite>, ProdifyError>;

    /// Sites owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PublishedSite>, ProdifyError>;
}

/// Sites keyed by slug plus insertion order.
#[derive(Debug, Default)]
struct SiteTable {
    by_slug: HashMap<String, PublishedSite>,
    order: Vec<String>,
}

impl SiteTable {
    fn from_sites(sites: Vec<PublishedSite>) -> Self {
        let mut table = Self::default();
        for site in sites {
            if !table.by_slug.contains_key(&site.slug) {
                table.order.push(site.slug.clone());
            }
            table.by_slug.insert(site.slug.clone(), site);
        }
        table
    }

    fn insert(&mut self, new: NewSite) -> Result<PublishedSite, ProdifyError> {
        if self.by_slug.contains_key(&new.slug) {
            return Err(ProdifyError::SlugTaken { slug: new.slug });
        }
        let site = PublishedSite {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            slug: new.slug,
            title: new.title,
            description: new.description,
            html: new.html,
            css: new.css,
            og_image: new.og_image,
            product_url: new.product_url,
            published: true,
            views: 0,
            created_at: Utc::now(),
        };
        self.order.push(site.slug.clone());
        self.by_slug.insert(site.slug.clone(), site.clone());
        Ok(site)
    }

    /// Undo an [`insert`](Self::insert) of `slug`.
    fn remove(&mut self, slug: &str) {
        if self.by_slug.remove(slug).is_some() {
            self.order.retain(|s| s != slug);
        }
    }

    fn find_published(&self, slug: &str) -> Option<PublishedSite> {
        self.by_slug.get(slug).filter(|s| s.published).cloned()
    }

    fn record_view(&mut self, slug: &str) -> Option<PublishedSite> {
        let site = self.by_slug.get_mut(slug).filter(|s| s.published)?;
        site.views += 1;
        Some(site.clone())
    }

    /// Undo a [`record_view`](Self::record_view) of `slug`.
    fn unrecord_view(&mut self, slug: &str) {
        if let Some(site) = self.by_slug.get_mut(slug) {
            site.views = site.views.saturating_sub(1);
        }
    }

    fn list_for_user(&self, user_id: &str) -> Vec<PublishedSite> {
        self.order
            .iter()
            .rev()
            .filter_map(|slug| self.by_slug.get(slug))
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    fn snapshot(&self) -> Vec<&PublishedSite> {
        self.order
            .iter()
            .filter_map(|slug| self.by_slug.get(slug))
            .collect()
    }
}

// ── In-memory store ──────────────────────────────────────────────────────────

/// Process-local store; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemorySiteStore {
    table: RwLock<SiteTable>,
}

impl MemorySiteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SiteStore for MemorySiteStore {
    async fn insert(&self, site: NewSite) -> Result<PublishedSite, ProdifyError> {
        self.table.write().await.insert(site)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, ProdifyError> {
        Ok(self.table.read().await.by_slug.contains_key(slug))
    }

    async fn find_published(&self, slug: &str) -> Result<Option<PublishedSite>, ProdifyError> {
        Ok(self.table.read().await.find_published(slug))
    }

    async fn record_view(&self, slug: &str) -> Result<Option<PublishedSite>, ProdifyError> {
        Ok(self.table.write().await.record_view(slug))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PublishedSite>, ProdifyError> {
        Ok(self.table.read().await.list_for_user(user_id))
    }
}

// ── JSON file store ──────────────────────────────────────────────────────────

/// Store that mirrors its contents to a JSON file after every mutation.
///
/// The file is replaced atomically (temp file in the same directory, then
/// rename), so readers never see a partial snapshot. A mutation is written
/// while the table's write lock is held and undone if the write fails, so
/// memory never holds a site the file does not.
#[derive(Debug)]
pub struct JsonFileSiteStore {
    path: PathBuf,
    table: RwLock<SiteTable>,
}

impl JsonFileSiteStore {
    /// Open the store at `path`, loading existing sites if the file exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ProdifyError> {
        let path = path.into();
        let sites: Vec<PublishedSite> = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ProdifyError::Store(format!("cannot parse {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(ProdifyError::Store(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };
        info!("Opened site store {} ({} sites)", path.display(), sites.len());
        Ok(Self {
            path,
            table: RwLock::new(SiteTable::from_sites(sites)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `table` to disk. Callers hold the write lock, which also
    /// orders concurrent writes.
    async fn persist(&self, table: &SiteTable) -> Result<(), ProdifyError> {
        let bytes = serde_json::to_vec_pretty(&table.snapshot())
            .map_err(|e| ProdifyError::Store(format!("cannot serialise sites: {e}")))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_snapshot(&path, &bytes))
            .await
            .map_err(|e| ProdifyError::Internal(format!("persist task panicked: {e}")))??;
        debug!("Persisted site store to {}", self.path.display());
        Ok(())
    }
}

fn write_snapshot(path: &Path, bytes: &[u8]) -> Result<(), ProdifyError> {
    use std::io::Write;

    let store_err = |e: std::io::Error| ProdifyError::Store(format!("cannot write {}: {e}", path.display()));
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(store_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(store_err)?;
    tmp.write_all(bytes).map_err(store_err)?;
    tmp.as_file().sync_all().map_err(store_err)?;
    tmp.persist(path).map_err(|e| store_err(e.error))?;
    Ok(())
}

#[async_trait]
impl SiteStore for JsonFileSiteStore {
    async fn insert(&self, site: NewSite) -> Result<PublishedSite, ProdifyError> {
        let mut table = self.table.write().await;
        let inserted = table.insert(site)?;
        if let Err(e) = self.persist(&table).await {
            error!("Rolling back publish of '{}': {}", inserted.slug, e);
            table.remove(&inserted.slug);
            return Err(e);
        }
        Ok(inserted)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, ProdifyError> {
        Ok(self.table.read().await.by_slug.contains_key(slug))
    }

    async fn find_published(&self, slug: &str) -> Result<Option<PublishedSite>, ProdifyError> {
        Ok(self.table.read().await.find_published(slug))
    }

    async fn record_view(&self, slug: &str) -> Result<Option<PublishedSite>, ProdifyError> {
        let mut table = self.table.write().await;
        let Some(viewed) = table.record_view(slug) else {
            return Ok(None);
        };
        if let Err(e) = self.persist(&table).await {
            error!("Rolling back view of '{}': {}", slug, e);
            table.unrecord_view(slug);
            return Err(e);
        }
        Ok(Some(viewed))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PublishedSite>, ProdifyError> {
        Ok(self.table.read().await.list_for_user(user_id))
    }
}
