//! # Search backend
//!
//! The same filters and handler, executed by a full-text search engine that
//! speaks SQL over HTTP. Queries are rendered to SQL text and posted as
//! `query=<sql>` to `{url}/sql?mode=raw`; both the raw result-set and the
//! hits-envelope answers are normalised into JSON records.

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod response;

pub use client::SearchClient;
pub use config::SearchConfig;
pub use error::{SearchError, SearchResult};
pub use handler::SearchQueryHandler;
