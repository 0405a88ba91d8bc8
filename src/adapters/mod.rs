// Adapters layer: requesters (http, fixtures), the OAuth token cache and one module per provider.

pub mod amadeus;
pub mod fixture;
pub mod flight_api;
pub mod http;
mod schema;
pub mod sky_scanner;
pub mod token_cache;

pub use amadeus::AmadeusProvider;
pub use fixture::FixtureRequester;
pub use flight_api::FlightApiProvider;
pub use http::HttpRequester;
pub use sky_scanner::SkyScannerProvider;
pub use token_cache::{ClientCredentials, TokenCache, TokenEntry};
