//! Request middleware

pub mod instrument;

pub use instrument::{approximate_request_size, instrument};
