pub mod aliases;
pub mod client;
pub mod error;
pub mod normalize;
pub mod query;
pub mod rate_limit;
pub mod types;

pub use aliases::{expand_aliases, AliasScope};
pub use client::OverpassClient;
pub use error::OverpassError;
pub use normalize::{dedup_by_id, merge_overrides, normalize_element, normalize_elements};
pub use query::QueryBuilder;
pub use rate_limit::BackoffPolicy;
pub use types::{Center, ElementKind, OverpassElement, OverpassResponse};
