//! Fan-out/fan-in over every configured provider.
//!
//! Each provider runs in its own task on a [`JoinSet`]. A failing provider
//! only removes its own offers from the merge; the lookup as a whole fails
//! only when every provider failed. Dropping the returned future aborts the
//! tasks that are still running.

use crate::domain::context::SearchContext;
use crate::domain::model::{Info, SearchParams};
use crate::domain::ports::Provider;
use crate::utils::error::{FlightError, ProviderError, ProviderFailure, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// 所有 provider 的合併結果，含失敗原因
#[derive(Debug, Default)]
pub struct LookupOutcome {
    pub offers: Vec<Info>,
    pub succeeded: Vec<String>,
    pub failures: Vec<ProviderFailure>,
}

impl LookupOutcome {
    /// True when at least one provider ran and none of them succeeded.
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty() && !self.failures.is_empty()
    }

    pub fn into_result(self) -> Result<Vec<Info>> {
        if self.all_failed() {
            return Err(FlightError::CouldNotFetchFlights {
                failures: self.failures,
            });
        }
        Ok(self.offers)
    }
}

/// Queries all providers concurrently and merges their offers.
///
/// Zero providers yields an empty list. Merge order across providers is
/// unspecified.
pub async fn look_up(
    ctx: &SearchContext,
    providers: &[Arc<dyn Provider>],
    params: &SearchParams,
) -> Result<Vec<Info>> {
    look_up_detailed(ctx, providers, params, None)
        .await
        .into_result()
}

/// Like [`look_up`] but keeps the per-provider failures.
///
/// With `per_provider_timeout`, a provider still running after the limit
/// fails with [`ProviderError::TimedOut`].
pub async fn look_up_detailed(
    ctx: &SearchContext,
    providers: &[Arc<dyn Provider>],
    params: &SearchParams,
    per_provider_timeout: Option<Duration>,
) -> LookupOutcome {
    let started = Instant::now();
    let mut tasks = JoinSet::new();
    let mut names = HashMap::with_capacity(providers.len());

    for provider in providers {
        let provider = Arc::clone(provider);
        let ctx = ctx.clone();
        let params = params.clone();
        let name = provider.name().to_string();

        let handle = tasks.spawn(async move {
            let result = search_one(&ctx, provider.as_ref(), &params, per_provider_timeout).await;
            (provider.name().to_string(), result)
        });
        names.insert(handle.id(), name);
    }

    tracing::debug!("📡 dispatched {} providers", providers.len());

    let mut outcome = LookupOutcome::default();

    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, (name, Ok(offers)))) => {
                tracing::debug!("✅ {} returned {} offers", name, offers.len());
                outcome.offers.extend(offers);
                outcome.succeeded.push(name);
            }
            Ok((_, (name, Err(error)))) => {
                tracing::warn!("❌ {} failed: {}", name, error);
                outcome.failures.push(ProviderFailure {
                    provider: name,
                    error,
                });
            }
            Err(join_error) => {
                let name = names
                    .remove(&join_error.id())
                    .unwrap_or_else(|| "unknown".to_string());
                tracing::error!("❌ {} task aborted: {}", name, join_error);
                outcome.failures.push(ProviderFailure {
                    provider: name.clone(),
                    error: ProviderError::Aborted {
                        provider: name,
                        reason: join_error.to_string(),
                    },
                });
            }
        }
    }

    if outcome.all_failed() {
        tracing::error!(
            "❌ all {} providers failed after {:?}",
            outcome.failures.len(),
            started.elapsed()
        );
    } else {
        tracing::info!(
            "📊 {} offers from {}/{} providers in {:?}",
            outcome.offers.len(),
            outcome.succeeded.len(),
            providers.len(),
            started.elapsed()
        );
    }

    outcome
}

async fn search_one(
    ctx: &SearchContext,
    provider: &dyn Provider,
    params: &SearchParams,
    per_provider_timeout: Option<Duration>,
) -> std::result::Result<Vec<Info>, ProviderError> {
    let name = provider.name();

    let guarded = async {
        match per_provider_timeout {
            Some(limit) => tokio::time::timeout(limit, provider.search(ctx, params))
                .await
                .unwrap_or_else(|_| {
                    Err(ProviderError::TimedOut {
                        provider: name.to_string(),
                        seconds: limit.as_secs(),
                    })
                }),
            None => provider.search(ctx, params).await,
        }
    };

    // provider 本身沒理會取消時，這裡仍會結束
    ctx.run(guarded).await.unwrap_or_else(|| {
        Err(ProviderError::Cancelled {
            provider: name.to_string(),
        })
    })
}
