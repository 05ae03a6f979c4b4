//! Core library for the Sugar Nail Art booking app.
//!
//! - `worker`: offline worker lifecycle and cache-first fetch interception
//! - `store`: versioned response cache (memory and disk backends)
//! - `manifest`: assets installed into every cache generation
//! - `net`: request/response types and the reqwest-backed fetcher
//! - `booking`: cart, order history and the WhatsApp hand-off
//! - `config`: user configuration and the worker settings derived from it

pub mod booking;
pub mod config;
pub mod error;
pub mod manifest;
pub mod net;
pub mod store;
pub mod worker;

pub use config::{CacheVersion, Config, WorkerConfig};
pub use error::{BookingError, FetchError, StoreError, WorkerError};
pub use manifest::AssetManifest;
pub use net::{Fetcher, HttpFetcher, Request, RequestKey, Response, ResponseType};
pub use store::{CacheStore, DiskCacheStore, MemoryCacheStore};
pub use worker::{ServiceWorker, WorkerEvent, WorkerState};
