pub mod engine;
pub mod lookup;
pub mod ranking;

pub use engine::FlightSearch;
pub use lookup::{look_up, look_up_detailed, LookupOutcome};
pub use ranking::{rank, ComparisonResponse};
