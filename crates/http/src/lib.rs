//! Stockroom HTTP client
//!
//! [`client::Gateway`] is the single shared client every caller goes through.
//! It attaches credentials, recovers from an expired access credential with
//! one coordinated refresh, and replays the affected requests once.

#[macro_use]
extern crate tracing;

pub mod client;
pub mod types;

pub use client::{
    ApiErrorBody, Body, ClientError, FormPart, Gateway, GatewayBuilder, RefreshState,
    RequestOptions, Resource,
};
