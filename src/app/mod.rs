// App layer: builds the search engine from configuration.

pub mod registry;

pub use registry::{build_providers, build_requester, build_search};
