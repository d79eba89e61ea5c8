//! HTTP request handlers
//!
//! `metrics` is the scrape endpoint mounted by [`crate::Prometheus::use_router`];
//! `health` and `widgets` back the demo server.

pub mod health;
pub mod metrics;
pub mod widgets;
