use crate::core::lookup::{look_up_detailed, LookupOutcome};
use crate::core::ranking::{rank, ComparisonResponse};
use crate::domain::context::SearchContext;
use crate::domain::model::SearchParams;
use crate::domain::ports::Provider;
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// 對外的查詢入口：驗證 → 補預設值 → 查詢所有 provider → 排名
#[derive(Clone, Default)]
pub struct FlightSearch {
    providers: Vec<Arc<dyn Provider>>,
    per_provider_timeout: Option<Duration>,
}

impl FlightSearch {
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Self {
        Self {
            providers,
            per_provider_timeout: None,
        }
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.per_provider_timeout = Some(timeout);
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Validates, then fills defaults.
    pub fn prepare(params: SearchParams) -> Result<SearchParams> {
        params.validate()?;
        Ok(params.with_defaults())
    }

    pub async fn look_up_detailed(
        &self,
        ctx: &SearchContext,
        params: SearchParams,
    ) -> Result<LookupOutcome> {
        let params = Self::prepare(params)?;

        tracing::info!(
            "🔍 {} → {} on {} for {}",
            params.departure_airport,
            params.arrival_airport,
            params.date_string(),
            ctx.username()
        );

        Ok(look_up_detailed(ctx, &self.providers, &params, self.per_provider_timeout).await)
    }

    pub async fn search(
        &self,
        ctx: &SearchContext,
        params: SearchParams,
    ) -> Result<ComparisonResponse> {
        let offers = self.look_up_detailed(ctx, params).await?.into_result()?;
        Ok(rank(offers))
    }
}

impl std::fmt::Debug for FlightSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightSearch")
            .field("providers", &self.provider_names())
            .field("per_provider_timeout", &self.per_provider_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Cabin, Info};
    use crate::utils::error::{FlightError, ProviderError, ValidationError};
    use async_trait::async_trait;
    use chrono::{Days, Utc};
    use std::sync::Mutex;

    /// 記錄收到的參數
    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<SearchParams>>,
    }

    #[async_trait]
    impl Provider for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn search(
            &self,
            _ctx: &SearchContext,
            params: &SearchParams,
        ) -> std::result::Result<Vec<Info>, ProviderError> {
            self.seen.lock().unwrap().push(params.clone());
            Ok(vec![Info::new("A", Duration::from_secs(3600), 10.0)])
        }
    }

    fn tomorrow() -> chrono::NaiveDate {
        Utc::now().date_naive().checked_add_days(Days::new(1)).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_params_never_reach_providers() {
        let recording = Arc::new(Recording::default());
        let engine = FlightSearch::new(vec![recording.clone() as Arc<dyn Provider>]);

        let err = engine
            .search(&SearchContext::new("alice"), SearchParams::new("JFK", "SF", tomorrow()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FlightError::Validation(ValidationError::InvalidArrivalCode)
        ));
        assert!(recording.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_providers_receive_defaulted_params() {
        let recording = Arc::new(Recording::default());
        let engine = FlightSearch::new(vec![recording.clone() as Arc<dyn Provider>]);

        let response = engine
            .search(&SearchContext::new("alice"), SearchParams::new("JFK", "SFO", tomorrow()))
            .await
            .unwrap();

        assert_eq!(response.comparison.len(), 1);
        let seen = recording.seen.lock().unwrap();
        assert_eq!(seen[0].num_adults, 1);
        assert_eq!(seen[0].currency, "USD");
        assert_eq!(seen[0].cabin_class, Some(Cabin::Economy));
    }

    #[test]
    fn test_debug_lists_provider_names() {
        let engine = FlightSearch::new(vec![Arc::new(Recording::default()) as Arc<dyn Provider>])
            .with_provider_timeout(Duration::from_secs(5));
        assert_eq!(engine.provider_names(), vec!["recording"]);
        assert!(format!("{:?}", engine).contains("recording"));
    }
}
