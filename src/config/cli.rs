use crate::config::toml_config::{AppConfig, FixturesConfig, SearchDefaults};
use crate::domain::query::SearchQuery;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_range, Validate};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FIXTURES_DIR: &str = "fixtures";

#[derive(Debug, Clone, Parser)]
#[command(name = "flight-lookup", version)]
#[command(about = "Compare flight prices across several travel-search providers")]
pub struct CliArgs {
    /// Origin airport, 3 letter IATA code
    pub origin: String,

    /// Destination airport, 3 letter IATA code
    pub destination: String,

    /// Departure date (YYYY-MM-DD)
    pub date: String,

    #[arg(long)]
    pub adults: Option<u32>,

    #[arg(long)]
    pub children: Option<u32>,

    #[arg(long)]
    pub infants: Option<u32>,

    /// economy, premium_economy, business or first
    #[arg(long)]
    pub cabin: Option<String>,

    #[arg(long)]
    pub currency: Option<String>,

    #[arg(short, long, help = "Path to the TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "User the provider tokens are cached for")]
    pub user: Option<String>,

    #[arg(long, value_name = "SECONDS", help = "Overall lookup deadline")]
    pub timeout: Option<u64>,

    #[arg(long, help = "Serve provider responses from the fixtures directory")]
    pub offline: bool,

    #[arg(long, value_name = "SECONDS", help = "Repeat the search every SECONDS until Ctrl-C")]
    pub watch: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliArgs {
    /// 命令列沒給的幣別與艙等取自設定檔
    pub fn to_query(&self, defaults: &SearchDefaults) -> SearchQuery {
        SearchQuery {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            date: self.date.clone(),
            adults: self.adults.map(|n| n.to_string()),
            children: self.children.map(|n| n.to_string()),
            infants: self.infants.map(|n| n.to_string()),
            cabin: Some(
                self.cabin
                    .clone()
                    .unwrap_or_else(|| defaults.cabin.to_string()),
            ),
            currency: Some(
                self.currency
                    .clone()
                    .unwrap_or_else(|| defaults.currency.clone()),
            ),
        }
    }

    /// 命令列參數覆蓋設定檔
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(seconds) = self.timeout {
            config.lookup.timeout_seconds = seconds;
        }

        if self.offline && config.fixtures.is_none() {
            config.fixtures = Some(FixturesConfig {
                dir: PathBuf::from(DEFAULT_FIXTURES_DIR),
            });
        }
    }

    pub fn username(&self, config: &AppConfig) -> String {
        self.user
            .clone()
            .unwrap_or_else(|| config.lookup.default_user.clone())
    }

    pub fn watch_interval(&self) -> Option<Duration> {
        self.watch.map(Duration::from_secs)
    }
}

impl Validate for CliArgs {
    fn validate(&self) -> Result<()> {
        if let Some(seconds) = self.timeout {
            validate_range("--timeout", seconds, 1, 300)?;
        }
        if let Some(seconds) = self.watch {
            validate_range("--watch", seconds, 5, 86_400)?;
        }
        if let Some(user) = &self.user {
            validate_non_empty_string("--user", user)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Cabin;

    fn parse(args: &[&str]) -> CliArgs {
        let mut argv = vec!["flight-lookup"];
        argv.extend_from_slice(args);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_positional_search_parameters() {
        let args = parse(&["jfk", "sfo", "2030-10-02", "--adults", "2", "--offline"]);
        let params = args
            .to_query(&SearchDefaults::default())
            .into_params()
            .unwrap();

        assert_eq!(params.departure_airport, "JFK");
        assert_eq!(params.arrival_airport, "SFO");
        assert_eq!(params.num_adults, 2);
        assert_eq!(params.cabin_class, Some(Cabin::Economy));
        assert_eq!(params.currency, "USD");
        assert!(args.offline);
    }

    #[test]
    fn test_flags_override_config_defaults() {
        let defaults = SearchDefaults {
            currency: "EUR".to_string(),
            cabin: Cabin::Business,
        };

        let from_config = parse(&["JFK", "SFO", "2030-10-02"])
            .to_query(&defaults)
            .into_params()
            .unwrap();
        assert_eq!(from_config.currency, "EUR");
        assert_eq!(from_config.cabin_class, Some(Cabin::Business));

        let from_flags = parse(&["JFK", "SFO", "2030-10-02", "--currency", "gbp", "--cabin", "first"])
            .to_query(&defaults)
            .into_params()
            .unwrap();
        assert_eq!(from_flags.currency, "GBP");
        assert_eq!(from_flags.cabin_class, Some(Cabin::First));
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let args = parse(&["JFK", "SFO", "2030-10-02", "--timeout", "7", "--offline", "--user", "bob"]);
        let mut config = AppConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.lookup.timeout_seconds, 7);
        assert_eq!(config.fixtures_dir(), Some(std::path::Path::new("fixtures")));
        assert_eq!(args.username(&config), "bob");
    }

    #[test]
    fn test_validation() {
        assert!(parse(&["JFK", "SFO", "2030-10-02", "--watch", "30"]).validate().is_ok());
        assert!(parse(&["JFK", "SFO", "2030-10-02", "--watch", "1"]).validate().is_err());
        assert!(parse(&["JFK", "SFO", "2030-10-02", "--timeout", "0"]).validate().is_err());
    }

    #[test]
    fn test_missing_positionals_fail_to_parse() {
        assert!(CliArgs::try_parse_from(["flight-lookup", "JFK"]).is_err());
    }
}
