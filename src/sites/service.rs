//! Publish, list and view operations over a [`SiteStore`].

use crate::auth::AuthUser;
use crate::error::ProdifyError;
use crate::sites::slug::is_valid_slug;
use crate::sites::store::SiteStore;
use crate::sites::{NewSite, PublishRequest, PublishResponse, PublishedSite, SiteList, SiteSummary};
use tracing::{debug, info};

/// Validate `request` and store it as a published site owned by `user`.
///
/// Checks, in order: required fields (`slug`, `title`, `html`, `css`), slug
/// pattern, slug availability. The store repeats the availability check
/// under its lock, so a concurrent publish of the same slug still fails
/// with [`ProdifyError::SlugTaken`].
pub async fn publish_site(
    store: &dyn SiteStore,
    user: &AuthUser,
    request: PublishRequest,
    public_base_url: &str,
) -> Result<PublishResponse, ProdifyError> {
    let missing: Vec<&str> = [
        ("slug", &request.slug),
        ("title", &request.title),
        ("html", &request.html),
        ("css", &request.css),
    ]
    .into_iter()
    .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
    .map(|(name, _)| name)
    .collect();
    if !missing.is_empty() {
        return Err(ProdifyError::MissingFields(missing.join(", ")));
    }

    let PublishRequest {
        slug,
        title,
        description,
        html,
        css,
        og_image,
        product_url,
    } = request;
    let slug = slug.unwrap_or_default();

    if !is_valid_slug(&slug) {
        return Err(ProdifyError::InvalidSlug { slug });
    }
    if store.slug_exists(&slug).await? {
        debug!("Publish rejected, slug '{}' exists", slug);
        return Err(ProdifyError::SlugTaken { slug });
    }

    let site = store
        .insert(NewSite {
            user_id: user.id.clone(),
            slug,
            title: title.unwrap_or_default(),
            description: description.unwrap_or_default(),
            html: html.unwrap_or_default(),
            css: css.unwrap_or_default(),
            og_image: og_image.filter(|s| !s.trim().is_empty()),
            product_url: product_url.filter(|s| !s.trim().is_empty()),
        })
        .await?;

    info!("User {} published '{}' ({})", user.id, site.slug, site.id);
    Ok(PublishResponse {
        success: true,
        site_id: site.id,
        url: format!("{}/{}", public_base_url.trim_end_matches('/'), site.slug),
        slug: site.slug,
    })
}

/// The caller's sites, newest first.
pub async fn list_sites(store: &dyn SiteStore, user: &AuthUser) -> Result<SiteList, ProdifyError> {
    let sites = store.list_for_user(&user.id).await?;
    Ok(SiteList {
        success: true,
        sites: sites.iter().map(SiteSummary::from).collect(),
    })
}

/// Look up a published site for public display, counting the view.
pub async fn view_site(store: &dyn SiteStore, slug: &str) -> Result<PublishedSite, ProdifyError> {
    store
        .record_view(slug)
        .await?
        .ok_or_else(|| ProdifyError::SiteNotFound {
            slug: slug.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::store::MemorySiteStore;

    fn user(id: &str) -> AuthUser {
        AuthUser { id: id.into() }
    }

    fn request(slug: &str) -> PublishRequest {
        PublishRequest {
            slug: Some(slug.into()),
            title: Some("Acme".into()),
            description: Some("Great".into()),
            html: Some("<p>hi</p>".into()),
            css: Some("p{}".into()),
            og_image: Some(String::new()),
            product_url: None,
        }
    }

    #[tokio::test]
    async fn publish_returns_public_url() {
        let store = MemorySiteStore::new();
        let resp = publish_site(&store, &user("u1"), request("acme"), "https://prodify.test/")
            .await
            .unwrap();
        assert!(resp.success);
        assert_eq!(resp.url, "https://prodify.test/acme");
        let stored = store.find_published("acme").await.unwrap().unwrap();
        assert_eq!(stored.id, resp.site_id);
        assert!(stored.og_image.is_none());
    }

    #[tokio::test]
    async fn missing_fields_are_listed() {
        let store = MemorySiteStore::new();
        let mut req = request("acme");
        req.title = None;
        req.css = Some("   ".into());
        let err = publish_site(&store, &user("u1"), req, "https://p.test")
            .await
            .unwrap_err();
        match err {
            ProdifyError::MissingFields(fields) => assert_eq!(fields, "title, css"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_slug_is_rejected() {
        let store = MemorySiteStore::new();
        let err = publish_site(&store, &user("u1"), request("Bad Slug"), "https://p.test")
            .await
            .unwrap_err();
        assert!(matches!(err, ProdifyError::InvalidSlug { .. }));
    }

    #[tokio::test]
    async fn second_publish_of_slug_conflicts() {
        let store = MemorySiteStore::new();
        publish_site(&store, &user("u1"), request("acme"), "https://p.test")
            .await
            .unwrap();
        let err = publish_site(&store, &user("u2"), request("acme"), "https://p.test")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn views_increase_by_one_per_read() {
        let store = MemorySiteStore::new();
        publish_site(&store, &user("u1"), request("acme"), "https://p.test")
            .await
            .unwrap();
        for n in 1..=5 {
            assert_eq!(view_site(&store, "acme").await.unwrap().views, n);
        }
        let list = list_sites(&store, &user("u1")).await.unwrap();
        assert_eq!(list.sites[0].views, 5);
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let store = MemorySiteStore::new();
        let err = view_site(&store, "nope").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
