pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::AppConfig;

pub use crate::core::{look_up, look_up_detailed, rank, ComparisonResponse, FlightSearch, LookupOutcome};
pub use domain::context::SearchContext;
pub use domain::model::{Cabin, Info, SearchParams};
pub use domain::ports::{Provider, RawResponse, Requester};
pub use domain::query::SearchQuery;
pub use utils::error::{FlightError, ProviderError, ProviderFailure, Result, ValidationError};
