use crate::domain::model::{Cabin, SearchParams};
use crate::utils::error::ValidationError;
use chrono::NaiveDate;
use std::collections::HashMap;

/// 查詢字串形式的搜尋請求，例如 `origin=JFK&destination=SFO&date=2030-10-02`
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub origin: String,
    pub destination: String,
    pub date: String,
    pub adults: Option<String>,
    pub children: Option<String>,
    pub infants: Option<String>,
    pub cabin: Option<String>,
    pub currency: Option<String>,
}

impl SearchQuery {
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map: HashMap<String, String> = HashMap::new();
        for (key, value) in pairs {
            // 重複的 key 以第一個為準
            map.entry(key.as_ref().to_ascii_lowercase())
                .or_insert_with(|| value.into());
        }

        Self {
            origin: map.remove("origin").unwrap_or_default(),
            destination: map.remove("destination").unwrap_or_default(),
            date: map.remove("date").unwrap_or_default(),
            adults: map.remove("adults"),
            children: map.remove("children"),
            infants: map.remove("infants"),
            cabin: map.remove("cabin"),
            currency: map.remove("currency"),
        }
    }

    /// Parses `origin=JFK&destination=SFO&date=...` (leading `?` allowed).
    pub fn from_query_string(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    /// 轉為 SearchParams；不檢查業務規則，交給 `SearchParams::validate`
    pub fn into_params(self) -> Result<SearchParams, ValidationError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDateFormat)?;

        let mut params = SearchParams::new(
            self.origin.trim().to_ascii_uppercase(),
            self.destination.trim().to_ascii_uppercase(),
            date,
        );

        params.num_adults = parse_count("adults", self.adults.as_deref())?;
        params.num_children = parse_count("children", self.children.as_deref())?;
        params.num_infants = parse_count("infants", self.infants.as_deref())?;

        if let Some(cabin) = self.cabin.as_deref().filter(|c| !c.trim().is_empty()) {
            params.cabin_class = Some(cabin.parse::<Cabin>()?);
        }

        if let Some(currency) = self.currency {
            params.currency = currency.trim().to_ascii_uppercase();
        }

        Ok(params)
    }
}

fn parse_count(field: &'static str, raw: Option<&str>) -> Result<u32, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(0),
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidPassengerCount {
                field,
                value: value.to_string(),
            }),
    }
}
