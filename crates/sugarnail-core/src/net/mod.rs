//! Network layer seen by the worker.
//!
//! This module provides the request/response types the interceptor works
//! with, the `Fetcher` seam the worker reaches the network through, and
//! `HttpFetcher`, the reqwest-backed implementation.
//!
//! Responses are classified as `Basic` (same origin as the worker), `Cors`
//! or `Opaque`; only `Basic` responses are ever cached opportunistically.

pub mod client;
pub mod request;
pub mod response;

pub use client::{Fetcher, HttpFetcher};
pub use request::{Request, RequestKey};
pub use response::{Response, ResponseType};

pub use reqwest::Method;
