use crate::domain::context::SearchContext;
use crate::domain::ports::{Method, RawResponse, Requester};
use crate::utils::error::RequestError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// 離線模式：依 URL 片段回傳磁碟上的 JSON 檔
#[derive(Debug, Clone, Default)]
pub struct FixtureRequester {
    routes: Vec<(String, PathBuf)>,
}

impl FixtureRequester {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first route whose fragment appears in the request URL wins.
    pub fn route(mut self, url_fragment: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        self.routes.push((url_fragment.into(), file.into()));
        self
    }

    /// 預設的檔名配置，對應 `fixtures/` 目錄
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new()
            .route("/security/oauth2/token", dir.join("amadeus_token.json"))
            .route("/shopping/flight-offers", dir.join("amadeus_search.json"))
            .route("/flights/search-one-way", dir.join("sky_scanner_search.json"))
            .route("onewaytrip", dir.join("flight_api_search.json"))
    }

    fn resolve(&self, url: &str) -> Option<&Path> {
        self.routes
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, path)| path.as_path())
    }
}

#[async_trait]
impl Requester for FixtureRequester {
    async fn make_request(
        &self,
        ctx: &SearchContext,
        method: Method,
        url: &str,
        _body: Option<String>,
        _headers: &[(&str, &str)],
    ) -> Result<RawResponse, RequestError> {
        let path = match self.resolve(url) {
            Some(path) => path,
            None => {
                tracing::debug!("📂 no fixture for {} {}", method, url);
                return Ok(RawResponse {
                    status: 404,
                    body: Vec::new(),
                });
            }
        };

        tracing::debug!("📂 serving {} for {} {}", path.display(), method, url);

        match ctx.run(tokio::fs::read(path)).await {
            Some(Ok(body)) => Ok(RawResponse { status: 200, body }),
            Some(Err(e)) => Err(RequestError::Failed(format!(
                "read fixture {}: {}",
                path.display(),
                e
            ))),
            None => Err(RequestError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_serves_matching_fixture() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("sky_scanner_search.json")).unwrap();
        file.write_all(br#"{"data":{"itineraries":[]}}"#).unwrap();

        let requester = FixtureRequester::from_dir(dir.path());
        let response = requester
            .make_request(
                &SearchContext::new("tester"),
                Method::GET,
                "https://sky.example.com/flights/search-one-way?fromEntityId=JFK",
                None,
                &[],
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"data":{"itineraries":[]}}"#.to_vec());
    }

    #[tokio::test]
    async fn test_unknown_url_is_not_found() {
        let requester = FixtureRequester::new().route("/known", "/nonexistent.json");
        let response = requester
            .make_request(&SearchContext::new("tester"), Method::GET, "https://x/unknown", None, &[])
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_missing_file_is_request_error() {
        let requester = FixtureRequester::new().route("/known", "/definitely/not/here.json");
        let err = requester
            .make_request(&SearchContext::new("tester"), Method::GET, "https://x/known", None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::Failed(_)));
    }
}
