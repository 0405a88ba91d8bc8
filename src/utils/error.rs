use thiserror::Error;

/// 查詢參數錯誤，直接回報給呼叫端 (400)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("destination airport code must be a valid 3 letter IATA code")]
    InvalidArrivalCode,

    #[error("origin airport code must be a valid 3 letter IATA code")]
    InvalidDepartureCode,

    #[error("origin and destination airports must be different")]
    SameAirport,

    #[error("departure date can't be in the past")]
    InvalidDepartureDate,

    #[error("invalid date, must be in YYYY-MM-DD format")]
    InvalidDateFormat,

    #[error("invalid {field} count: {value}")]
    InvalidPassengerCount { field: &'static str, value: String },

    #[error("unknown cabin class: {0}")]
    InvalidCabin(String),
}

/// 對外 HTTP 請求的錯誤
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("request time out")]
    Cancelled,

    #[error("http request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Failed(String),
}

/// URL 可能帶有 API key（FlightAPI 放在 path），錯誤訊息裡不保留
impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        RequestError::Transport(err.without_url())
    }
}

impl RequestError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RequestError::Cancelled)
    }
}

/// client-credentials 交換失敗
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("auth request failed: {0}")]
    Request(#[source] RequestError),

    #[error("auth endpoint answered with status {0}")]
    Status(u16),

    #[error("decode auth response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("auth response carried an empty access token")]
    EmptyToken,
}

/// 單一 provider 呼叫失敗；由 orchestrator 記錄，不會直接回給使用者
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider}: request time out")]
    Cancelled { provider: String },

    #[error("{provider}: no answer after {seconds}s")]
    TimedOut { provider: String, seconds: u64 },

    #[error("{provider}: {source}")]
    Request {
        provider: String,
        #[source]
        source: RequestError,
    },

    #[error("{provider}: unexpected status {status}")]
    Status { provider: String, status: u16 },

    #[error("{provider}: decode json: {source}")]
    Decode {
        provider: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider}: could not authenticate: {source}")]
    Auth {
        provider: String,
        #[source]
        source: AuthError,
    },

    #[error("{provider}: search task aborted: {reason}")]
    Aborted { provider: String, reason: String },
}

impl ProviderError {
    /// Wraps a requester error, keeping cancellation distinguishable.
    pub fn from_request(provider: &str, err: RequestError) -> Self {
        if err.is_cancelled() {
            ProviderError::Cancelled {
                provider: provider.to_string(),
            }
        } else {
            ProviderError::Request {
                provider: provider.to_string(),
                source: err,
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            ProviderError::Cancelled { .. } => true,
            ProviderError::Request { source, .. } => source.is_cancelled(),
            ProviderError::Auth {
                source: AuthError::Request(source),
                ..
            } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// 某個 provider 的失敗紀錄
#[derive(Debug)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: ProviderError,
}

#[derive(Error, Debug)]
pub enum FlightError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("unable to look up flight prices")]
    CouldNotFetchFlights { failures: Vec<ProviderFailure> },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("missing {field} environment variable")]
    MissingConfigError { field: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Upstream,
    Configuration,
    System,
}

impl FlightError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FlightError::Validation(_) => ErrorCategory::Input,
            FlightError::CouldNotFetchFlights { .. } => ErrorCategory::Upstream,
            FlightError::ConfigError { .. }
            | FlightError::ConfigValidationError { .. }
            | FlightError::InvalidConfigValueError { .. }
            | FlightError::MissingConfigError { .. } => ErrorCategory::Configuration,
            FlightError::IoError(_) | FlightError::SerializationError(_) => ErrorCategory::System,
        }
    }

    /// HTTP 對應：輸入錯誤 400，其它一律 500
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::Input => 400,
            _ => 500,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FlightError::Validation(e) => e.to_string(),
            FlightError::CouldNotFetchFlights { .. } => self.to_string(),
            FlightError::MissingConfigError { .. } => self.to_string(),
            e if e.category() == ErrorCategory::Configuration => {
                format!("Configuration problem: {}", e)
            }
            _ => "Internal error, please try again later".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check the airport codes and use a YYYY-MM-DD date that is not in the past",
            ErrorCategory::Upstream => "All providers failed; check network access and provider credentials, then retry",
            ErrorCategory::Configuration => "Fix the configuration file or export the missing environment variables",
            ErrorCategory::System => "Check file permissions and disk space",
        }
    }

    /// 總失敗時的各 provider 原因
    pub fn provider_failures(&self) -> &[ProviderFailure] {
        match self {
            FlightError::CouldNotFetchFlights { failures } => failures,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, FlightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err: FlightError = ValidationError::InvalidDepartureCode.into();
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.status_code(), 400);
        assert_eq!(
            err.user_friendly_message(),
            "origin airport code must be a valid 3 letter IATA code"
        );
    }

    #[test]
    fn test_aggregate_failure_keeps_causes() {
        let err = FlightError::CouldNotFetchFlights {
            failures: vec![ProviderFailure {
                provider: "amadeus".to_string(),
                error: ProviderError::Status {
                    provider: "amadeus".to_string(),
                    status: 503,
                },
            }],
        };

        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "unable to look up flight prices");
        assert_eq!(err.provider_failures().len(), 1);
        assert_eq!(
            err.provider_failures()[0].error.to_string(),
            "amadeus: unexpected status 503"
        );
    }

    #[test]
    fn test_cancelled_request_becomes_cancelled_provider_error() {
        let err = ProviderError::from_request("sky-scanner", RequestError::Cancelled);
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "sky-scanner: request time out");

        let err = ProviderError::from_request("sky-scanner", RequestError::Failed("boom".into()));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_missing_env_message() {
        let err = FlightError::MissingConfigError {
            field: "AMADEUS_API_KEY".to_string(),
        };
        assert_eq!(err.to_string(), "missing AMADEUS_API_KEY environment variable");
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
