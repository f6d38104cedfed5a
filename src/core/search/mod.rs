//! Query translation and execution.
//!
//! - **translator**: structured query to native query, filter, sort and window
//! - **service**: runs queries against the registry's writer handles

mod service;
pub mod translator;

pub use service::QueryService;
pub use translator::escape_query;
