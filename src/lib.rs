//! Box Box Box - A Formula 1 News & Podcast Aggregator
//!
//! This crate fetches a fixed set of news and podcast feeds, normalizes their
//! entries into a single item model, and merges them into one list ordered by
//! recency. A feed that fails to load contributes no items instead of failing
//! the whole listing.

pub mod aggregator;
pub mod config;
pub mod fetcher;
pub mod normalize;
pub mod parser;
pub mod registry;
pub mod routes;
pub mod time_ago;
