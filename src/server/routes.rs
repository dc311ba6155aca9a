//! JSON API handlers. Every route here requires an authenticated caller.

use crate::error::ProdifyError;
use crate::generate::{generate_site_with_model, scrape_page};
use crate::output::{AssembledPage, ExtractedPageData, GenerationStats, ProductSummary};
use crate::pipeline::fetch::build_client;
use crate::pipeline::llm::resolve_model;
use crate::progress::NoopProgressCallback;
use crate::server::error::Result;
use crate::server::AppState;
use crate::sites::service::{list_sites, publish_site};
use crate::sites::{PublishRequest, PublishResponse, SiteList};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
struct UrlRequest {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub data: ExtractedPageData,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub product: ProductSummary,
    pub site: AssembledPage,
    pub stats: GenerationStats,
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn scrape(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ScrapeResponse>> {
    state.require_user(&headers).await?;
    let url = required_url(parse_body::<UrlRequest>(&body)?)?;
    let data = scrape_page(&url, &state.config).await?;
    Ok(Json(ScrapeResponse {
        success: true,
        data,
    }))
}

pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GenerateResponse>> {
    state.require_user(&headers).await?;
    let url = required_url(parse_body::<UrlRequest>(&body)?)?;

    let model = match state.model {
        Some(ref model) => Arc::clone(model),
        None => resolve_model(&state.config, build_client(&state.config)?)?,
    };
    let output = generate_site_with_model(
        model.as_ref(),
        &state.extractors,
        &url,
        &state.config,
        &NoopProgressCallback,
    )
    .await?;

    Ok(Json(GenerateResponse {
        success: true,
        product: output.product,
        site: output.site,
        stats: output.stats,
    }))
}

pub async fn publish(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PublishResponse>> {
    let user = state.require_user(&headers).await?;
    let request: PublishRequest = parse_body(&body)?;
    let response = publish_site(
        state.store.as_ref(),
        &user,
        request,
        &state.config.public_base_url,
    )
    .await?;
    Ok(Json(response))
}

pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<SiteList>> {
    let user = state.require_user(&headers).await?;
    Ok(Json(list_sites(state.store.as_ref(), &user).await?))
}

/// Parse a JSON body, distinguishing an empty body from malformed JSON.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> std::result::Result<T, ProdifyError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ProdifyError::EmptyBody);
    }
    Ok(serde_json::from_slice(body)?)
}

fn required_url(req: UrlRequest) -> std::result::Result<String, ProdifyError> {
    req.url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ProdifyError::MissingFields("url".into()))
}
