pub mod aggregate_service;
pub mod fetch_service;
pub mod render_service;

pub use aggregate_service::{AggregateOptions, AggregateService, Aggregation, FeedReport};
pub use fetch_service::{decode_feed, FeedFetcher, HttpFetcher};
pub use render_service::{render_atom, render_html};
