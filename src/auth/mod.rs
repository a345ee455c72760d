use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::axum_http::error_responses::error_response;

#[derive(Debug, Serialize, Deserialize)]
pub struct ClerkClaims {
    pub sub: Option<String>,
    pub email: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization header required")]
    MissingHeader,
    #[error("Invalid Authorization header format")]
    MalformedHeader,
    #[error("Failed to authenticate user")]
    Verification(#[source] anyhow::Error),
    #[error("User not found")]
    UserNotFound,
    #[error("Authentication is not configured")]
    NotConfigured,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingHeader
            | AuthError::MalformedHeader
            | AuthError::Verification(_) => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        error_response(self.status_code(), self.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// Derives the JWKS endpoint from a publishable key of the form
/// `pk_(test|live)_<instance>.<domain>.clerk.accounts.dev`. A key that does
/// not match the pattern is a configuration error, caught at startup.
pub fn jwks_url_from_publishable_key(publishable_key: &str) -> Result<String> {
    let host = publishable_key
        .strip_prefix("pk_test_")
        .or_else(|| publishable_key.strip_prefix("pk_live_"))
        .ok_or_else(|| anyhow!("invalid Clerk publishable key format"))?;

    let (instance, rest) = host
        .split_once('.')
        .ok_or_else(|| anyhow!("invalid Clerk publishable key format"))?;
    let domain = rest
        .strip_suffix(".clerk.accounts.dev")
        .ok_or_else(|| anyhow!("invalid Clerk publishable key format"))?;

    if instance.is_empty() || domain.is_empty() {
        return Err(anyhow!("invalid Clerk publishable key format"));
    }

    Ok(format!(
        "https://{}.{}.clerk.accounts.dev/.well-known/jwks.json",
        instance, domain
    ))
}

/// Verifies Clerk session tokens against the instance's remote key set.
/// Constructed once per process; the key cache is shared across requests.
pub struct ClerkJwtVerifier {
    http: reqwest::Client,
    jwks_url: String,
    keys: RwLock<HashMap<String, Jwk>>,
}

impl ClerkJwtVerifier {
    pub fn from_publishable_key(publishable_key: &str) -> Result<Self> {
        let jwks_url = jwks_url_from_publishable_key(publishable_key)?;

        Ok(Self {
            http: reqwest::Client::new(),
            jwks_url,
            keys: RwLock::new(HashMap::new()),
        })
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    pub async fn verify(&self, token: &str) -> Result<ClerkClaims> {
        let header = decode_header(token)?;
        let kid = header
            .kid
            .ok_or_else(|| anyhow!("token header is missing kid"))?;

        let jwk = self.key_for(&kid).await?;
        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)?;
        let validation = Validation::new(Algorithm::RS256);

        let token_data = decode::<ClerkClaims>(token, &decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    async fn key_for(&self, kid: &str) -> Result<Jwk> {
        if let Some(jwk) = self.keys.read().await.get(kid) {
            return Ok(jwk.clone());
        }

        // Unknown kid: the instance may have rotated its keys. Refetch once.
        let fetched = self.fetch_keys().await?;
        let mut keys = self.keys.write().await;
        *keys = fetched;

        keys.get(kid)
            .cloned()
            .ok_or_else(|| anyhow!("no matching key in JWKS for kid {}", kid))
    }

    async fn fetch_keys(&self) -> Result<HashMap<String, Jwk>> {
        debug!(jwks_url = %self.jwks_url, "auth: fetching remote key set");

        let resp = self.http.get(&self.jwks_url).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("JWKS fetch failed with status {}", resp.status());
        }

        let set: JwkSet = resp.json().await?;
        Ok(set
            .keys
            .into_iter()
            .map(|jwk| (jwk.kid.clone(), jwk))
            .collect())
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    if !auth_str.starts_with("Bearer ") {
        return Err(AuthError::MalformedHeader);
    }

    Ok(&auth_str[7..])
}

pub fn identity_from_claims(claims: ClerkClaims) -> Result<AuthUser, AuthError> {
    // A verified token without a usable subject means the identity provider
    // handed out something unusable, not that the caller is unauthenticated.
    let user_id = match claims.sub {
        Some(sub) if !sub.is_empty() => sub,
        _ => return Err(AuthError::UserNotFound),
    };

    Ok(AuthUser {
        user_id,
        email: claims.email,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let verifier = parts
            .extensions
            .get::<Arc<ClerkJwtVerifier>>()
            .cloned()
            .ok_or(AuthError::NotConfigured)?;

        let token = bearer_token(&parts.headers)?.to_string();

        let claims = verifier.verify(&token).await.map_err(|err| {
            warn!(error = ?err, "auth: token verification failed");
            AuthError::Verification(err)
        })?;

        identity_from_claims(claims)
    }
}
