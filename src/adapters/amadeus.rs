//! Amadeus flight-offers adapter (OAuth client credentials).

use crate::adapters::schema::{build_url, decode_response, join_agents, parse_iso8601_duration, RawAmount};
use crate::adapters::token_cache::TokenCache;
use crate::domain::context::SearchContext;
use crate::domain::model::{Cabin, Info, SearchParams};
use crate::domain::ports::{Method, Provider, Requester};
use crate::utils::error::ProviderError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

pub const PROVIDER_NAME: &str = "amadeus";

const TOKEN_PATH: [&str; 4] = ["v1", "security", "oauth2", "token"];
const SEARCH_PATH: [&str; 3] = ["v2", "shopping", "flight-offers"];

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(rename = "carrierCode", default)]
    carrier_code: String,
}

#[derive(Debug, Deserialize)]
struct Itinerary {
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Price {
    #[serde(default)]
    total: Option<RawAmount>,
}

#[derive(Debug, Deserialize)]
struct Offer {
    #[serde(default)]
    itineraries: Vec<Itinerary>,
    #[serde(default)]
    price: Option<Price>,
}

#[derive(Debug, Default, Deserialize)]
struct Dictionaries {
    #[serde(default)]
    carriers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Offer>,
    #[serde(default)]
    dictionaries: Dictionaries,
}

impl SearchResponse {
    /// 每個 offer 的每段 itinerary 產生一筆 Info，共用 offer 的總價
    fn into_infos(self) -> Vec<Info> {
        let carriers = &self.dictionaries.carriers;
        let mut infos = Vec::with_capacity(self.data.len());

        for offer in &self.data {
            let Some(price) = offer
                .price
                .as_ref()
                .and_then(|p| p.total.as_ref())
                .and_then(RawAmount::value)
            else {
                tracing::debug!("{}: skipping offer with unusable price", PROVIDER_NAME);
                continue;
            };

            for itinerary in &offer.itineraries {
                let Some(duration) = itinerary.duration.as_deref().and_then(parse_iso8601_duration)
                else {
                    tracing::debug!(
                        "{}: skipping itinerary with duration {:?}",
                        PROVIDER_NAME,
                        itinerary.duration
                    );
                    continue;
                };

                // 字典裡查不到的航空公司直接用代碼
                let agent = join_agents(itinerary.segments.iter().map(|segment| {
                    carriers
                        .get(&segment.carrier_code)
                        .map(String::as_str)
                        .unwrap_or(segment.carrier_code.as_str())
                }));

                infos.push(Info::new(agent, duration, price));
            }
        }

        infos
    }
}

fn travel_class(cabin: Cabin) -> &'static str {
    match cabin {
        Cabin::Economy => "ECONOMY",
        Cabin::PremiumEconomy => "PREMIUM_ECONOMY",
        Cabin::Business => "BUSINESS",
        Cabin::First => "FIRST",
    }
}

pub struct AmadeusProvider {
    base_url: String,
    requester: Arc<dyn Requester>,
    tokens: Arc<TokenCache>,
}

impl AmadeusProvider {
    pub fn new(base_url: impl Into<String>, requester: Arc<dyn Requester>, tokens: Arc<TokenCache>) -> Self {
        Self {
            base_url: base_url.into(),
            requester,
            tokens,
        }
    }

    /// OAuth endpoint for a given API base URL.
    pub fn token_url(base_url: &str) -> Result<String, ProviderError> {
        build_url(PROVIDER_NAME, base_url, &TOKEN_PATH, &[])
    }

    fn search_url(&self, params: &SearchParams) -> Result<String, ProviderError> {
        let date = params.date_string();
        let adults = params.num_adults.to_string();
        let children = params.num_children.to_string();
        let infants = params.num_infants.to_string();

        let mut query = vec![
            ("originLocationCode", params.departure_airport.as_str()),
            ("destinationLocationCode", params.arrival_airport.as_str()),
            ("departureDate", date.as_str()),
            ("adults", adults.as_str()),
            ("travelClass", travel_class(params.cabin())),
            ("currencyCode", params.currency.as_str()),
        ];
        if params.num_children > 0 {
            query.push(("children", children.as_str()));
        }
        if params.num_infants > 0 {
            query.push(("infants", infants.as_str()));
        }

        build_url(PROVIDER_NAME, &self.base_url, &SEARCH_PATH, &query)
    }

    fn subject<'a>(&self, ctx: &'a SearchContext) -> &'a str {
        match ctx.username() {
            "" => PROVIDER_NAME,
            username => username,
        }
    }
}

#[async_trait]
impl Provider for AmadeusProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn search(
        &self,
        ctx: &SearchContext,
        params: &SearchParams,
    ) -> Result<Vec<Info>, ProviderError> {
        let subject = self.subject(ctx);
        let token = self
            .tokens
            .get_token(ctx, subject)
            .await
            .map_err(|source| ProviderError::Auth {
                provider: PROVIDER_NAME.to_string(),
                source,
            })?;

        let url = self.search_url(params)?;
        let authorization = format!("Bearer {}", token.access_token);

        let response = self
            .requester
            .make_request(ctx, Method::GET, &url, None, &[("Authorization", authorization.as_str())])
            .await
            .map_err(|e| ProviderError::from_request(PROVIDER_NAME, e))?;

        // token 被上游撤銷時，下一次查詢重新取得
        if response.status == 401 {
            self.tokens.invalidate(subject).await;
        }

        let payload: SearchResponse = decode_response(PROVIDER_NAME, &response)?;
        let infos = payload.into_infos();

        tracing::debug!("✅ {}: {} offers", PROVIDER_NAME, infos.len());
        Ok(infos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::{HttpRequester, DEFAULT_REQUEST_TIMEOUT};
    use crate::adapters::token_cache::ClientCredentials;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use std::time::Duration;

    const SEARCH_BODY: &str = r#"{
        "data": [
            {
                "itineraries": [
                    {"duration": "PT6H28M", "segments": [{"carrierCode": "AS"}]}
                ],
                "price": {"currency": "USD", "total": "149.25"}
            },
            {
                "itineraries": [
                    {"duration": "PT6H17M", "segments": [{"carrierCode": "B6"}]}
                ],
                "price": {"currency": "USD", "total": "173.45"}
            },
            {
                "itineraries": [
                    {"duration": "PT9H5M", "segments": [{"carrierCode": "DL"}, {"carrierCode": "AS"}, {"carrierCode": "DL"}]}
                ],
                "price": {"currency": "USD", "total": "201.10"}
            },
            {
                "itineraries": [{"duration": "PT7H", "segments": [{"carrierCode": "UA"}]}],
                "price": {"currency": "USD", "total": "n/a"}
            },
            {
                "itineraries": [{"duration": "seven hours", "segments": [{"carrierCode": "UA"}]}],
                "price": {"currency": "USD", "total": "120.00"}
            }
        ],
        "dictionaries": {
            "carriers": {"AS": "ALASKA AIRLINES", "B6": "JETBLUE AIRWAYS", "DL": "DELTA AIR LINES"}
        }
    }"#;

    fn params() -> SearchParams {
        SearchParams::new("JFK", "SFO", NaiveDate::from_ymd_opt(2030, 10, 2).unwrap()).with_defaults()
    }

    fn provider(server: &MockServer) -> AmadeusProvider {
        let requester: Arc<dyn Requester> = Arc::new(HttpRequester::new(DEFAULT_REQUEST_TIMEOUT).unwrap());
        let tokens = Arc::new(TokenCache::new(
            requester.clone(),
            ClientCredentials {
                token_url: AmadeusProvider::token_url(&server.base_url()).unwrap(),
                client_id: "key".to_string(),
                client_secret: "secret".to_string(),
            },
        ));
        AmadeusProvider::new(server.base_url(), requester, tokens)
    }

    #[test]
    fn test_normalizes_offers() {
        let payload: SearchResponse = serde_json::from_str(SEARCH_BODY).unwrap();
        let infos = payload.into_infos();

        assert_eq!(
            infos,
            vec![
                Info::new("ALASKA AIRLINES", Duration::from_secs(6 * 3600 + 28 * 60), 149.25),
                Info::new("JETBLUE AIRWAYS", Duration::from_secs(6 * 3600 + 17 * 60), 173.45),
                Info::new(
                    "DELTA AIR LINES-ALASKA AIRLINES",
                    Duration::from_secs(9 * 3600 + 5 * 60),
                    201.10
                ),
            ]
        );
    }

    #[test]
    fn test_unknown_carrier_falls_back_to_code() {
        let payload: SearchResponse = serde_json::from_str(
            r#"{"data":[{"itineraries":[{"duration":"PT1H","segments":[{"carrierCode":"ZZ"}]}],"price":{"total":99}}]}"#,
        )
        .unwrap();
        assert_eq!(payload.into_infos(), vec![Info::new("ZZ", Duration::from_secs(3600), 99.0)]);
    }

    #[test]
    fn test_null_or_missing_total_skips_only_that_offer() {
        let payload: SearchResponse = serde_json::from_str(
            r#"{"data":[
                {"itineraries":[{"duration":"PT2H","segments":[{"carrierCode":"AS"}]}],"price":{"total":null}},
                {"itineraries":[{"duration":"PT3H","segments":[{"carrierCode":"AS"}]}],"price":{"currency":"USD"}},
                {"itineraries":[{"duration":"PT4H","segments":[{"carrierCode":"AS"}]}]},
                {"itineraries":[{"duration":null,"segments":[{"carrierCode":"B6"}]}],"price":{"total":"120.00"}},
                {"itineraries":[{"duration":"PT6H28M","segments":[{"carrierCode":"AS"}]}],"price":{"total":"149.25"}}
            ],"dictionaries":{"carriers":{"AS":"ALASKA AIRLINES"}}}"#,
        )
        .unwrap();

        assert_eq!(
            payload.into_infos(),
            vec![Info::new("ALASKA AIRLINES", Duration::from_secs(6 * 3600 + 28 * 60), 149.25)]
        );
    }

    #[tokio::test]
    async fn test_search_authenticates_and_maps_offers() {
        let server = MockServer::start();
        let token_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/security/oauth2/token")
                .body("grant_type=client_credentials&client_id=key&client_secret=secret");
            then.status(200)
                .json_body(serde_json::json!({"access_token": "tok", "expires_in": 1799}));
        });
        let search_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v2/shopping/flight-offers")
                .query_param("originLocationCode", "JFK")
                .query_param("destinationLocationCode", "SFO")
                .query_param("departureDate", "2030-10-02")
                .query_param("adults", "1")
                .query_param("travelClass", "ECONOMY")
                .query_param("currencyCode", "USD")
                .header("Authorization", "Bearer tok");
            then.status(200).body(SEARCH_BODY);
        });

        let provider = provider(&server);
        let ctx = SearchContext::new("alice");

        let first = provider.search(&ctx, &params()).await.unwrap();
        let second = provider.search(&ctx, &params()).await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        token_mock.assert_hits(1);
        search_mock.assert_hits(2);
    }

    #[tokio::test]
    async fn test_auth_failure_is_provider_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/security/oauth2/token");
            then.status(401).body(r#"{"error":"invalid_client"}"#);
        });
        let search_mock = server.mock(|when, then| {
            when.method(GET).path("/v2/shopping/flight-offers");
            then.status(200).body(SEARCH_BODY);
        });

        let err = provider(&server)
            .search(&SearchContext::new("alice"), &params())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Auth { .. }));
        search_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_rejected_token_is_dropped() {
        let server = MockServer::start();
        let token_mock = server.mock(|when, then| {
            when.method(POST).path("/v1/security/oauth2/token");
            then.status(200)
                .json_body(serde_json::json!({"access_token": "tok", "expires_in": 1799}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/v2/shopping/flight-offers");
            then.status(401).body("{}");
        });

        let provider = provider(&server);
        let ctx = SearchContext::new("alice");

        for _ in 0..2 {
            let err = provider.search(&ctx, &params()).await.unwrap_err();
            assert!(matches!(err, ProviderError::Status { status: 401, .. }));
        }
        token_mock.assert_hits(2);
    }

    #[tokio::test]
    async fn test_premium_cabin_and_children_are_forwarded() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/security/oauth2/token");
            then.status(200)
                .json_body(serde_json::json!({"access_token": "tok", "expires_in": 1799}));
        });
        let search_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v2/shopping/flight-offers")
                .query_param("travelClass", "PREMIUM_ECONOMY")
                .query_param("children", "2");
            then.status(200).body(r#"{"data":[]}"#);
        });

        let mut params = params();
        params.cabin_class = Some(Cabin::PremiumEconomy);
        params.num_children = 2;

        let infos = provider(&server)
            .search(&SearchContext::new(""), &params)
            .await
            .unwrap();

        assert!(infos.is_empty());
        search_mock.assert();
    }
}
