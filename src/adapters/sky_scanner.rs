//! Sky Scanner (RapidAPI) one-way search adapter.

use crate::adapters::schema::{build_url, decode_response, join_agents, minutes_to_duration, RawAmount};
use crate::domain::context::SearchContext;
use crate::domain::model::{Cabin, Info, SearchParams};
use crate::domain::ports::{Method, Provider, Requester};
use crate::utils::error::ProviderError;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

pub const PROVIDER_NAME: &str = "sky-scanner";

const SEARCH_PATH: [&str; 2] = ["flights", "search-one-way"];
const RAPIDAPI_HOST_HEADER: &str = "x-rapidapi-host";
const RAPIDAPI_KEY_HEADER: &str = "x-rapidapi-key";

#[derive(Debug, Deserialize)]
struct Price {
    #[serde(default)]
    raw: Option<RawAmount>,
}

#[derive(Debug, Deserialize)]
struct Marketing {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Carriers {
    #[serde(default)]
    marketing: Vec<Marketing>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Leg {
    #[serde(default)]
    duration_in_minutes: Option<RawAmount>,
    #[serde(default)]
    carriers: Carriers,
}

#[derive(Debug, Deserialize)]
struct Itinerary {
    #[serde(default)]
    price: Option<Price>,
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Debug, Default, Deserialize)]
struct Data {
    #[serde(default)]
    itineraries: Vec<Itinerary>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Data,
}

impl SearchResponse {
    /// 單程查詢只看第一段 leg
    fn into_infos(self) -> Vec<Info> {
        let mut infos = Vec::with_capacity(self.data.itineraries.len());

        for itinerary in &self.data.itineraries {
            let Some(price) = itinerary
                .price
                .as_ref()
                .and_then(|p| p.raw.as_ref())
                .and_then(RawAmount::value)
            else {
                tracing::debug!("{}: skipping itinerary with unusable price", PROVIDER_NAME);
                continue;
            };

            let Some(leg) = itinerary.legs.first() else {
                tracing::debug!("{}: skipping itinerary without legs", PROVIDER_NAME);
                continue;
            };

            let Some(duration) = minutes_to_duration(leg.duration_in_minutes.as_ref()) else {
                tracing::debug!("{}: skipping itinerary with unusable duration", PROVIDER_NAME);
                continue;
            };

            let agent = join_agents(leg.carriers.marketing.iter().map(|m| m.name.as_str()));

            infos.push(Info::new(agent, duration, price));
        }

        infos
    }
}

fn cabin_class(cabin: Cabin) -> &'static str {
    match cabin {
        Cabin::Economy => "economy",
        Cabin::PremiumEconomy => "premium_economy",
        Cabin::Business => "business",
        Cabin::First => "first",
    }
}

pub struct SkyScannerProvider {
    base_url: String,
    api_key: String,
    api_host: String,
    requester: Arc<dyn Requester>,
}

impl SkyScannerProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_host: impl Into<String>,
        requester: Arc<dyn Requester>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_host: api_host.into(),
            requester,
        }
    }

    fn search_url(&self, params: &SearchParams) -> Result<String, ProviderError> {
        let date = params.date_string();
        let adults = params.num_adults.to_string();
        let children = params.num_children.to_string();
        let infants = params.num_infants.to_string();

        let mut query = vec![
            ("fromEntityId", params.departure_airport.as_str()),
            ("toEntityId", params.arrival_airport.as_str()),
            ("departDate", date.as_str()),
            ("adults", adults.as_str()),
            ("cabinClass", cabin_class(params.cabin())),
            ("currency", params.currency.as_str()),
        ];
        if params.num_children > 0 {
            query.push(("children", children.as_str()));
        }
        if params.num_infants > 0 {
            query.push(("infants", infants.as_str()));
        }

        build_url(PROVIDER_NAME, &self.base_url, &SEARCH_PATH, &query)
    }
}

#[async_trait]
impl Provider for SkyScannerProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn search(
        &self,
        ctx: &SearchContext,
        params: &SearchParams,
    ) -> Result<Vec<Info>, ProviderError> {
        let url = self.search_url(params)?;

        let response = self
            .requester
            .make_request(
                ctx,
                Method::GET,
                &url,
                None,
                &[
                    (RAPIDAPI_HOST_HEADER, self.api_host.as_str()),
                    (RAPIDAPI_KEY_HEADER, self.api_key.as_str()),
                ],
            )
            .await
            .map_err(|e| ProviderError::from_request(PROVIDER_NAME, e))?;

        let payload: SearchResponse = decode_response(PROVIDER_NAME, &response)?;
        let infos = payload.into_infos();

        tracing::debug!("✅ {}: {} offers", PROVIDER_NAME, infos.len());
        Ok(infos)
    }
}
