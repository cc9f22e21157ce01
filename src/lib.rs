//! Postfeed library exports for testing

pub mod api;
pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod query;
pub mod store;
pub mod ui;
