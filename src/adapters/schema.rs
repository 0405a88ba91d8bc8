//! Decoding helpers shared by the provider adapters.

use crate::domain::ports::RawResponse;
use crate::utils::error::{ProviderError, RequestError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// 數值欄位可能是字串也可能是數字；其他型別留給 `Other`，不讓整份回應解碼失敗
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawAmount {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RawAmount {
    /// `None` for unparseable or non-finite amounts.
    pub(crate) fn value(&self) -> Option<f64> {
        let value = match self {
            RawAmount::Number(n) => *n,
            RawAmount::Text(s) => s.trim().parse::<f64>().ok()?,
            RawAmount::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

/// Converts a whole, non-negative minute count into a `Duration`.
pub(crate) fn minutes_to_duration(minutes: Option<&RawAmount>) -> Option<Duration> {
    let minutes = minutes?.value()?;
    if minutes < 0.0 || minutes.fract() != 0.0 || minutes >= u64::MAX as f64 {
        return None;
    }
    let seconds = (minutes as u64).checked_mul(60)?;
    Some(Duration::from_secs(seconds))
}

/// Checks the status and decodes the body of a provider response.
pub(crate) fn decode_response<T: DeserializeOwned>(
    provider: &str,
    response: &RawResponse,
) -> Result<T, ProviderError> {
    if !response.is_success() {
        tracing::debug!(
            "❌ {}: status {} body {}",
            provider,
            response.status,
            String::from_utf8_lossy(&response.body)
        );
        return Err(ProviderError::Status {
            provider: provider.to_string(),
            status: response.status,
        });
    }

    serde_json::from_slice(&response.body).map_err(|source| ProviderError::Decode {
        provider: provider.to_string(),
        source,
    })
}

/// Appends percent-encoded path segments and query pairs to `base`.
pub(crate) fn build_url(
    provider: &str,
    base: &str,
    segments: &[&str],
    query: &[(&str, &str)],
) -> Result<String, ProviderError> {
    let invalid = |reason: String| ProviderError::Request {
        provider: provider.to_string(),
        source: RequestError::Failed(format!("invalid base url {}: {}", base, reason)),
    };

    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| invalid("cannot be a base".to_string()))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url.to_string())
}

/// 依序串接不重複的名稱，以 `-` 分隔
pub(crate) fn join_agents<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: Vec<&str> = Vec::new();
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen.join("-")
}

/// Parses ISO-8601 durations such as `PT6H28M`, `PT45M`, `P1DT2H30M15S`.
pub(crate) fn parse_iso8601_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim().to_ascii_uppercase();
    let rest = raw.strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }

    let mut seconds: u64 = 0;
    let mut number = String::new();
    let mut in_time = false;
    let mut saw_component = false;

    for c in rest.chars() {
        match c {
            'T' => {
                if in_time || !number.is_empty() {
                    return None;
                }
                in_time = true;
            }
            '0'..='9' => number.push(c),
            unit => {
                let value: u64 = number.parse().ok()?;
                number.clear();
                let factor = match (unit, in_time) {
                    ('W', false) => 7 * 86_400,
                    ('D', false) => 86_400,
                    ('H', true) => 3600,
                    ('M', true) => 60,
                    ('S', true) => 1,
                    _ => return None,
                };
                seconds = seconds.checked_add(value.checked_mul(factor)?)?;
                saw_component = true;
            }
        }
    }

    if !number.is_empty() || !saw_component {
        return None;
    }

    Some(Duration::from_secs(seconds))
}
