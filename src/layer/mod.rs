//! Layer service layer.
//!
//! Sits between callers (the CLI, or an application holding the parsed
//! layer tree) and the archive:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        CLI / application code           │
//! └────────────────────┬────────────────────┘
//!                      │ LayerRef
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             Layer Service               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  LayerCache  │  │  decode_layer   │  │
//! │  │  (decoded    │  │  (tile stream → │  │
//! │  │   canvases)  │  │   canvas)       │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │        EntrySource (KraArchive)         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`LayerService`]: decodes on first access and serves repeats from cache
//! - [`LayerCache`]: LRU cache of decoded layers with size-based eviction
//! - [`LayerResponse`]: a decoded layer plus whether it came from cache

mod cache;
mod service;

pub use cache::{LayerCache, DEFAULT_LAYER_CACHE_CAPACITY};
pub use service::{LayerResponse, LayerService};
