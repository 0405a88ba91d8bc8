use crate::utils::error::ValidationError;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CURRENCY: &str = "USD";

/// 標準化後的航班報價；由 adapter 建立後不再修改
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Info {
    pub agent: String,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
    pub price: f64,
}

impl Info {
    pub fn new(agent: impl Into<String>, duration: Duration, price: f64) -> Self {
        Self {
            agent: agent.into(),
            duration,
            price,
        }
    }
}

fn serialize_duration<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*duration))
}

/// Renders a duration as `6h20m0s`, `45m0s`, `30s` or `0s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cabin {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl fmt::Display for Cabin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cabin::Economy => "Economy",
            Cabin::PremiumEconomy => "Premium Economy",
            Cabin::Business => "Business",
            Cabin::First => "First",
        };
        f.write_str(name)
    }
}

impl FromStr for Cabin {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "economy" => Ok(Cabin::Economy),
            "premium_economy" => Ok(Cabin::PremiumEconomy),
            "business" => Ok(Cabin::Business),
            "first" => Ok(Cabin::First),
            _ => Err(ValidationError::InvalidCabin(s.to_string())),
        }
    }
}

/// 所有 provider 共用的查詢參數
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_date: NaiveDate,
    pub num_adults: u32,
    pub num_children: u32,
    pub num_infants: u32,
    pub cabin_class: Option<Cabin>,
    pub currency: String,
}

impl SearchParams {
    pub fn new(
        departure_airport: impl Into<String>,
        arrival_airport: impl Into<String>,
        departure_date: NaiveDate,
    ) -> Self {
        Self {
            departure_airport: departure_airport.into(),
            arrival_airport: arrival_airport.into(),
            departure_date,
            num_adults: 0,
            num_children: 0,
            num_infants: 0,
            cabin_class: None,
            currency: String::new(),
        }
    }

    /// Validates against today's date in UTC.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_on(Utc::now().date_naive())
    }

    /// 純函式驗證；`today` 為 UTC 日期
    pub fn validate_on(&self, today: NaiveDate) -> Result<(), ValidationError> {
        if self.arrival_airport.chars().count() != 3 {
            return Err(ValidationError::InvalidArrivalCode);
        }

        if self.departure_airport.chars().count() != 3 {
            return Err(ValidationError::InvalidDepartureCode);
        }

        if self
            .arrival_airport
            .eq_ignore_ascii_case(&self.departure_airport)
        {
            return Err(ValidationError::SameAirport);
        }

        if self.departure_date < today {
            return Err(ValidationError::InvalidDepartureDate);
        }

        Ok(())
    }

    /// 補上預設值：成人 1 位、USD、經濟艙
    pub fn with_defaults(mut self) -> Self {
        if self.num_adults == 0 {
            self.num_adults = 1;
        }

        if self.currency.trim().is_empty() {
            self.currency = DEFAULT_CURRENCY.to_string();
        }

        self.cabin_class.get_or_insert(Cabin::Economy);

        self
    }

    pub fn cabin(&self) -> Cabin {
        self.cabin_class.unwrap_or_default()
    }

    pub fn date_string(&self) -> String {
        self.departure_date.format("%Y-%m-%d").to_string()
    }
}
