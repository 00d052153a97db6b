pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use client::{GeocodeResult, NominatimClient};
pub use error::NominatimError;
pub use types::Candidate;
