//! Caller authentication for the API routes.
//!
//! The HTTP layer only needs to know *who* is calling; [`AuthProvider`] is
//! the seam where a hosted identity service would plug in. The bundled
//! [`StaticTokenAuth`] checks `Authorization: Bearer <token>` against a
//! configured token table.

use crate::config::AppConfig;
use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use std::collections::HashMap;
use std::fmt;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The caller behind `headers`, or `None` when unauthenticated.
    async fn authenticate(&self, headers: &HeaderMap) -> Option<AuthUser>;
}

/// Bearer-token table: token → user id.
#[derive(Clone, Default)]
pub struct StaticTokenAuth {
    tokens: HashMap<String, String>,
}

impl fmt::Debug for StaticTokenAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenAuth")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

impl StaticTokenAuth {
    pub fn new<I, T, U>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, U)>,
        T: Into<String>,
        U: Into<String>,
    {
        Self {
            tokens: pairs
                .into_iter()
                .map(|(t, u)| (t.into(), u.into()))
                .collect(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.api_tokens.iter().cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuth {
    async fn authenticate(&self, headers: &HeaderMap) -> Option<AuthUser> {
        let token = bearer_token(headers)?;
        self.tokens.get(token).map(|id| AuthUser { id: id.clone() })
    }
}

/// Token from an `Authorization: Bearer …` header (scheme is case-insensitive).
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        h
    }

    #[tokio::test]
    async fn known_token_authenticates() {
        let auth = StaticTokenAuth::new([("secret", "alice")]);
        let user = auth.authenticate(&headers("Bearer secret")).await.unwrap();
        assert_eq!(user.id, "alice");
        assert!(auth.authenticate(&headers("bearer   secret ")).await.is_some());
    }

    #[tokio::test]
    async fn unknown_or_missing_token_is_rejected() {
        let auth = StaticTokenAuth::new([("secret", "alice")]);
        assert!(auth.authenticate(&headers("Bearer other")).await.is_none());
        assert!(auth.authenticate(&headers("Basic secret")).await.is_none());
        assert!(auth.authenticate(&headers("Bearer")).await.is_none());
        assert!(auth.authenticate(&HeaderMap::new()).await.is_none());
    }

    #[test]
    fn debug_hides_tokens() {
        let auth = StaticTokenAuth::new([("secret", "alice")]);
        assert!(!format!("{auth:?}").contains("secret"));
    }
}
