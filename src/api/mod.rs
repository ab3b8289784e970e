//! REST API client module for the Callsheet service.
//!
//! This module provides the `ApiClient` for authenticating against the
//! service and submitting or listing artists and availability.
//!
//! Every request is stamped with the session's bearer token; a single
//! authorization failure per request is absorbed through the refresh
//! flow, everything else propagates to the caller unchanged.

pub mod client;
pub mod error;

pub use client::{ApiClient, Overview};
pub use error::ApiError;
