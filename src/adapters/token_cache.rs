//! Client-credentials token cache.
//!
//! One [`TokenCache`] is created per OAuth provider at start-up and handed
//! to the adapter that needs it. Entries are keyed by subject (the
//! authenticated username, or the provider name when there is none) and
//! are replaced wholesale once expired. Concurrent refreshes for the same
//! subject are not deduplicated; the last writer wins.

use crate::domain::context::SearchContext;
use crate::domain::ports::{Method, Requester};
use crate::utils::error::AuthError;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEntry {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenEntry {
    /// 沒有任何寬限時間：`now < expires_at` 才算有效
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

#[derive(Clone)]
pub struct ClientCredentials {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}

pub struct TokenCache {
    requester: Arc<dyn Requester>,
    credentials: ClientCredentials,
    entries: RwLock<HashMap<String, TokenEntry>>,
}

impl TokenCache {
    pub fn new(requester: Arc<dyn Requester>, credentials: ClientCredentials) -> Self {
        Self {
            requester,
            credentials,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a valid token for `subject`, refreshing it when needed.
    pub async fn get_token(
        &self,
        ctx: &SearchContext,
        subject: &str,
    ) -> Result<TokenEntry, AuthError> {
        if let Some(entry) = self.cached(subject).await {
            tracing::debug!("🔑 cached token for {}", subject);
            return Ok(entry);
        }

        // 交換期間不持有鎖
        let entry = self.request_token(ctx).await?;

        tracing::debug!("🔑 new token for {} valid until {}", subject, entry.expires_at);
        self.entries
            .write()
            .await
            .insert(subject.to_string(), entry.clone());

        Ok(entry)
    }

    /// 上游回 401 時丟棄該 subject 的 token
    pub async fn invalidate(&self, subject: &str) {
        self.entries.write().await.remove(subject);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn cached(&self, subject: &str) -> Option<TokenEntry> {
        let entries = self.entries.read().await;
        entries.get(subject).filter(|entry| entry.is_valid()).cloned()
    }

    async fn request_token(&self, ctx: &SearchContext) -> Result<TokenEntry, AuthError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.credentials.client_id)
            .append_pair("client_secret", &self.credentials.client_secret)
            .finish();

        let response = self
            .requester
            .make_request(
                ctx,
                Method::POST,
                &self.credentials.token_url,
                Some(body),
                &[("Content-Type", "application/x-www-form-urlencoded")],
            )
            .await
            .map_err(AuthError::Request)?;

        if !response.is_success() {
            return Err(AuthError::Status(response.status));
        }

        let auth: AuthResponse =
            serde_json::from_slice(&response.body).map_err(AuthError::Decode)?;

        if auth.access_token.trim().is_empty() {
            return Err(AuthError::EmptyToken);
        }

        let lifetime = TimeDelta::try_seconds(auth.expires_in.max(0)).unwrap_or(TimeDelta::zero());

        Ok(TokenEntry {
            access_token: auth.access_token,
            expires_at: Utc::now() + lifetime,
        })
    }
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
