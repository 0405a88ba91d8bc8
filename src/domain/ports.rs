use crate::domain::context::SearchContext;
use crate::domain::model::{Info, SearchParams};
use crate::utils::error::{ProviderError, RequestError};
use async_trait::async_trait;

pub use reqwest::Method;

/// 一個外部機票搜尋服務
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// `params` is expected to be validated and defaulted by the caller.
    async fn search(
        &self,
        ctx: &SearchContext,
        params: &SearchParams,
    ) -> Result<Vec<Info>, ProviderError>;
}

/// 原始 HTTP 回應
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The only way adapters reach the network.
#[async_trait]
pub trait Requester: Send + Sync {
    async fn make_request(
        &self,
        ctx: &SearchContext,
        method: Method,
        url: &str,
        body: Option<String>,
        headers: &[(&str, &str)],
    ) -> Result<RawResponse, RequestError>;
}
