// Domain layer: canonical offer model, search parameters, request context and ports.

pub mod context;
pub mod model;
pub mod ports;
pub mod query;
