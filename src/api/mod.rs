// REST API module.
// Provides the client, response types, and query fetchers for posts and users.

pub mod client;
pub mod endpoints;
pub mod queries;
pub mod types;

pub use client::{ApiClient, DEFAULT_BASE_URL, DEFAULT_RESPONSE_DELAY};
pub use queries::{post_fetcher, post_key, posts_fetcher, posts_key, user_fetcher, user_key};
pub use types::*;
