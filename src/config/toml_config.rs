use crate::domain::model::{Cabin, DEFAULT_CURRENCY};
use crate::utils::error::{FlightError, Result};
use crate::utils::validation::{
    placeholder_regex, validate_non_empty_string, validate_path, validate_range, validate_secret,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "flight-lookup.toml";

/// 沒有設定檔時使用的內建配置，憑證一律從環境變數取得
pub const BUILTIN_CONFIG: &str = include_str!("../../flight-lookup.toml");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub lookup: LookupConfig,
    pub search: SearchDefaults,
    pub providers: ProvidersConfig,
    pub fixtures: Option<FixturesConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// 整次查詢的截止時間
    pub timeout_seconds: u64,
    pub provider_timeout_seconds: Option<u64>,
    pub request_timeout_seconds: u64,
    pub default_user: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 20,
            provider_timeout_seconds: None,
            request_timeout_seconds: 15,
            default_user: "anonymous".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub currency: String,
    pub cabin: Cabin,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            cabin: Cabin::Economy,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub amadeus: Option<AmadeusConfig>,
    pub flight_api: Option<FlightApiConfig>,
    pub sky_scanner: Option<SkyScannerConfig>,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmadeusConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightApiConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkyScannerConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub base_url: String,
    pub api_host: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixturesConfig {
    pub dir: PathBuf,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FlightError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| FlightError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Explicit path, then `flight-lookup.toml` in the working directory,
    /// then the built-in configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::debug!("📂 loading config from {}", path.display());
                Self::from_file(path)
            }
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                tracing::debug!("📂 loading config from {}", DEFAULT_CONFIG_PATH);
                Self::from_file(DEFAULT_CONFIG_PATH)
            }
            None => {
                tracing::debug!("📂 using built-in config");
                Self::from_toml_str(BUILTIN_CONFIG)
            }
        }
    }

    /// 替換環境變數 (例如 ${API_KEY})；未設定的變數原樣保留，交給驗證回報
    fn substitute_env_vars(content: &str) -> String {
        let Some(re) = placeholder_regex() else {
            return content.to_string();
        };

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// 驗證配置；離線模式不需要憑證
    pub fn validate_with(&self, require_credentials: bool) -> Result<()> {
        validate_range("lookup.timeout_seconds", self.lookup.timeout_seconds, 1, 300)?;
        validate_range(
            "lookup.request_timeout_seconds",
            self.lookup.request_timeout_seconds,
            1,
            120,
        )?;
        if let Some(seconds) = self.lookup.provider_timeout_seconds {
            validate_range("lookup.provider_timeout_seconds", seconds, 1, 300)?;
        }
        validate_non_empty_string("lookup.default_user", &self.lookup.default_user)?;

        if self.search.currency.len() != 3
            || !self.search.currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(FlightError::InvalidConfigValueError {
                field: "search.currency".to_string(),
                value: self.search.currency.clone(),
                reason: "Currency must be a 3 letter ISO code".to_string(),
            });
        }

        if let Some(amadeus) = self.providers.amadeus.as_ref().filter(|p| p.enabled) {
            validate_url("providers.amadeus.base_url", &amadeus.base_url)?;
            if require_credentials {
                validate_secret("providers.amadeus.api_key", &amadeus.api_key)?;
                validate_secret("providers.amadeus.api_secret", &amadeus.api_secret)?;
            }
        }

        if let Some(flight_api) = self.providers.flight_api.as_ref().filter(|p| p.enabled) {
            validate_url("providers.flight_api.base_url", &flight_api.base_url)?;
            if require_credentials {
                validate_secret("providers.flight_api.api_key", &flight_api.api_key)?;
            }
        }

        if let Some(sky) = self.providers.sky_scanner.as_ref().filter(|p| p.enabled) {
            validate_url("providers.sky_scanner.base_url", &sky.base_url)?;
            if require_credentials {
                validate_non_empty_string("providers.sky_scanner.api_host", &sky.api_host)?;
                validate_secret("providers.sky_scanner.api_key", &sky.api_key)?;
            }
        }

        if let Some(fixtures) = &self.fixtures {
            validate_path("fixtures.dir", &fixtures.dir.to_string_lossy())?;
        }

        Ok(())
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup.timeout_seconds)
    }

    pub fn provider_timeout(&self) -> Option<Duration> {
        self.lookup.provider_timeout_seconds.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup.request_timeout_seconds)
    }

    pub fn fixtures_dir(&self) -> Option<&Path> {
        self.fixtures.as_ref().map(|f| f.dir.as_path())
    }

    /// `[fixtures]` 存在即為離線模式
    pub fn is_offline(&self) -> bool {
        self.fixtures.is_some()
    }

    /// 已啟用的 provider 名稱
    pub fn enabled_providers(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.providers.amadeus.as_ref().is_some_and(|p| p.enabled) {
            names.push(crate::adapters::amadeus::PROVIDER_NAME);
        }
        if self.providers.flight_api.as_ref().is_some_and(|p| p.enabled) {
            names.push(crate::adapters::flight_api::PROVIDER_NAME);
        }
        if self.providers.sky_scanner.as_ref().is_some_and(|p| p.enabled) {
            names.push(crate::adapters::sky_scanner::PROVIDER_NAME);
        }
        names
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_with(true)
    }
}
