use crate::domain::context::SearchContext;
use crate::domain::ports::{Method, RawResponse, Requester};
use crate::utils::error::RequestError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// reqwest 實作的 Requester，所有 provider 共用同一個 Client
#[derive(Debug, Clone)]
pub struct HttpRequester {
    client: Client,
}

/// 只留 host 和第一段 path；後面的 path 與 query 可能帶 API key
fn loggable_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return "<invalid url>".to_string();
    };

    let host = parsed.host_str().unwrap_or_default();
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
    let first = parsed
        .path_segments()
        .and_then(|mut segments| segments.next())
        .filter(|segment| !segment.is_empty());

    match first {
        Some(segment) => format!("{}://{}{}/{}/…", parsed.scheme(), host, port, segment),
        None => format!("{}://{}{}/", parsed.scheme(), host, port),
    }
}

impl HttpRequester {
    pub fn new(timeout: Duration) -> Result<Self, RequestError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("flight-lookup/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
        headers: &[(&str, &str)],
    ) -> Result<RawResponse, RequestError> {
        let mut request = self.client.request(method, url);

        // 添加自定義標頭
        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        tracing::debug!("📡 {} answered {}", loggable_url(url), status);

        let body = response.bytes().await?.to_vec();

        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl Requester for HttpRequester {
    async fn make_request(
        &self,
        ctx: &SearchContext,
        method: Method,
        url: &str,
        body: Option<String>,
        headers: &[(&str, &str)],
    ) -> Result<RawResponse, RequestError> {
        tracing::debug!("📡 {} {}", method, loggable_url(url));

        match ctx.run(self.send(method, url, body, headers)).await {
            Some(result) => result,
            None => {
                tracing::debug!("📡 request to {} cancelled", loggable_url(url));
                Err(RequestError::Cancelled)
            }
        }
    }
}
