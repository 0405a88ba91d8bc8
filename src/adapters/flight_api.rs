//! FlightAPI one-way trip adapter. The API key travels in the URL path.

use crate::adapters::schema::{build_url, decode_response, join_agents, minutes_to_duration, RawAmount};
use crate::domain::context::SearchContext;
use crate::domain::model::{Cabin, Info, SearchParams};
use crate::domain::ports::{Method, Provider, Requester};
use crate::utils::error::ProviderError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const PROVIDER_NAME: &str = "flight-api";

#[derive(Debug, Deserialize)]
struct Price {
    #[serde(default)]
    amount: Option<RawAmount>,
}

#[derive(Debug, Deserialize)]
struct PricingOption {
    #[serde(default)]
    agent_ids: Vec<String>,
    #[serde(default)]
    price: Option<Price>,
}

#[derive(Debug, Deserialize)]
struct Itinerary {
    #[serde(default)]
    leg_ids: Vec<String>,
    #[serde(default)]
    pricing_options: Vec<PricingOption>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    id: String,
    /// 分鐘
    #[serde(default)]
    duration: Option<RawAmount>,
}

#[derive(Debug, Deserialize)]
struct Agent {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    itineraries: Vec<Itinerary>,
    #[serde(default)]
    legs: Vec<Leg>,
    #[serde(default)]
    agents: Vec<Agent>,
}

impl Itinerary {
    /// 最便宜的報價選項；價格無法解析的選項不列入
    fn cheapest(&self) -> Option<(&PricingOption, f64)> {
        self.pricing_options
            .iter()
            .filter_map(|option| {
                let price = option.price.as_ref()?.amount.as_ref()?.value()?;
                Some((option, price))
            })
            .fold(None, |best, (option, price)| match best {
                Some((_, best_price)) if best_price <= price => best,
                _ => Some((option, price)),
            })
    }
}

impl SearchResponse {
    fn into_infos(self) -> Vec<Info> {
        // 時間無法換算的 leg 記成 None，引用它的 itinerary 會被略過
        let legs: HashMap<&str, Option<Duration>> = self
            .legs
            .iter()
            .map(|leg| (leg.id.as_str(), minutes_to_duration(leg.duration.as_ref())))
            .collect();
        let agents: HashMap<&str, &str> = self
            .agents
            .iter()
            .map(|agent| (agent.id.as_str(), agent.name.as_str()))
            .collect();

        let mut infos = Vec::with_capacity(self.itineraries.len());

        for itinerary in &self.itineraries {
            let Some((option, price)) = itinerary.cheapest() else {
                tracing::debug!("{}: skipping itinerary without usable pricing options", PROVIDER_NAME);
                continue;
            };

            let Some(duration) = itinerary
                .leg_ids
                .first()
                .and_then(|id| legs.get(id.as_str()).copied().flatten())
            else {
                tracing::debug!("{}: skipping itinerary without a usable leg", PROVIDER_NAME);
                continue;
            };

            let agent = join_agents(
                option
                    .agent_ids
                    .iter()
                    .map(|id| agents.get(id.as_str()).copied().unwrap_or(id.as_str())),
            );

            infos.push(Info::new(agent, duration, price));
        }

        infos
    }
}

fn cabin_segment(cabin: Cabin) -> &'static str {
    match cabin {
        Cabin::Economy => "Economy",
        Cabin::PremiumEconomy => "Premium_Economy",
        Cabin::Business => "Business",
        Cabin::First => "First",
    }
}

pub struct FlightApiProvider {
    base_url: String,
    api_key: String,
    requester: Arc<dyn Requester>,
}

impl FlightApiProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, requester: Arc<dyn Requester>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            requester,
        }
    }

    fn search_url(&self, params: &SearchParams) -> Result<String, ProviderError> {
        let date = params.date_string();
        let adults = params.num_adults.to_string();
        let children = params.num_children.to_string();
        let infants = params.num_infants.to_string();

        build_url(
            PROVIDER_NAME,
            &self.base_url,
            &[
                self.api_key.as_str(),
                params.departure_airport.as_str(),
                params.arrival_airport.as_str(),
                date.as_str(),
                adults.as_str(),
                children.as_str(),
                infants.as_str(),
                cabin_segment(params.cabin()),
                params.currency.as_str(),
            ],
            &[],
        )
    }
}

#[async_trait]
impl Provider for FlightApiProvider {
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
            .make_request(ctx, Method::GET, &url, None, &[("Content-Type", "application/json")])
            .await
            .map_err(|e| ProviderError::from_request(PROVIDER_NAME, e))?;

        let payload: SearchResponse = decode_response(PROVIDER_NAME, &response)?;
        let infos = payload.into_infos();

        tracing::debug!("✅ {}: {} offers", PROVIDER_NAME, infos.len());
        Ok(infos)
    }
}
