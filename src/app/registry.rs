//! Wires configured providers to a shared requester.

use crate::adapters::amadeus::AmadeusProvider;
use crate::adapters::fixture::FixtureRequester;
use crate::adapters::flight_api::FlightApiProvider;
use crate::adapters::http::HttpRequester;
use crate::adapters::sky_scanner::SkyScannerProvider;
use crate::adapters::token_cache::{ClientCredentials, TokenCache};
use crate::config::toml_config::{AmadeusConfig, AppConfig};
use crate::core::engine::FlightSearch;
use crate::domain::ports::{Provider, Requester};
use crate::utils::error::{FlightError, Result};
use std::sync::Arc;

/// 離線模式讀取 fixtures，否則用 reqwest
pub fn build_requester(config: &AppConfig) -> Result<Arc<dyn Requester>> {
    match config.fixtures_dir() {
        Some(dir) => {
            tracing::info!("📂 offline mode, serving responses from {}", dir.display());
            Ok(Arc::new(FixtureRequester::from_dir(dir)))
        }
        None => {
            let requester = HttpRequester::new(config.request_timeout()).map_err(|e| {
                FlightError::ConfigError {
                    message: format!("could not build http client: {}", e),
                }
            })?;
            Ok(Arc::new(requester))
        }
    }
}

/// Token cache for the Amadeus OAuth endpoint.
pub fn amadeus_token_cache(
    amadeus: &AmadeusConfig,
    requester: Arc<dyn Requester>,
) -> Result<Arc<TokenCache>> {
    let token_url =
        AmadeusProvider::token_url(&amadeus.base_url).map_err(|e| FlightError::InvalidConfigValueError {
            field: "providers.amadeus.base_url".to_string(),
            value: amadeus.base_url.clone(),
            reason: e.to_string(),
        })?;

    Ok(Arc::new(TokenCache::new(
        requester,
        ClientCredentials {
            token_url,
            client_id: amadeus.api_key.clone(),
            client_secret: amadeus.api_secret.clone(),
        },
    )))
}

/// Builds every enabled provider. `tokens` overrides the Amadeus token
/// cache, so several registries can share one.
pub fn build_providers(
    config: &AppConfig,
    requester: Arc<dyn Requester>,
    tokens: Option<Arc<TokenCache>>,
) -> Result<Vec<Arc<dyn Provider>>> {
    let mut providers: Vec<Arc<dyn Provider>> = Vec::new();

    if let Some(amadeus) = config.providers.amadeus.as_ref().filter(|p| p.enabled) {
        let tokens = match tokens {
            Some(tokens) => tokens,
            None => amadeus_token_cache(amadeus, Arc::clone(&requester))?,
        };
        providers.push(Arc::new(AmadeusProvider::new(
            amadeus.base_url.clone(),
            Arc::clone(&requester),
            tokens,
        )));
    }

    if let Some(flight_api) = config.providers.flight_api.as_ref().filter(|p| p.enabled) {
        providers.push(Arc::new(FlightApiProvider::new(
            flight_api.base_url.clone(),
            flight_api.api_key.clone(),
            Arc::clone(&requester),
        )));
    }

    if let Some(sky) = config.providers.sky_scanner.as_ref().filter(|p| p.enabled) {
        providers.push(Arc::new(SkyScannerProvider::new(
            sky.base_url.clone(),
            sky.api_key.clone(),
            sky.api_host.clone(),
            Arc::clone(&requester),
        )));
    }

    if providers.is_empty() {
        return Err(FlightError::ConfigValidationError {
            field: "providers".to_string(),
            message: "no provider is enabled".to_string(),
        });
    }

    tracing::debug!(
        "🧩 providers: {}",
        providers
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(providers)
}

/// 依配置建立查詢引擎
pub fn build_search(config: &AppConfig) -> Result<FlightSearch> {
    let requester = build_requester(config)?;
    let providers = build_providers(config, requester, None)?;

    let mut search = FlightSearch::new(providers);
    if let Some(timeout) = config.provider_timeout() {
        search = search.with_provider_timeout(timeout);
    }
    Ok(search)
}
