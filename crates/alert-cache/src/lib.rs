//! Area fetch orchestration, zone indexing and a persistent alert cache.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        ALERT-CACHE                             │
//! │                                                                │
//! │  ┌──────────────────┐        ┌───────────────────────────┐     │
//! │  │   AreaFetcher    │        │        AlertCache         │     │
//! │  │  (AlertSource)   │◀───────│                           │     │
//! │  │                  │        │ - refresh (serialized)    │     │
//! │  │ - discover       │        │ - query / stats / health  │     │
//! │  │ - download       │        │ - live zone lookup        │     │
//! │  │ - parse          │        │ - load_from_store         │     │
//! │  └────────┬─────────┘        └─────────────┬─────────────┘     │
//! │           │                                │                   │
//! │           ▼                                ▼                   │
//! │      HttpClient                     SnapshotStore              │
//! │   (reqwest / mock)               (file / memory)               │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A refresh fetches every area concurrently, merges the results into an
//! immutable [`CacheSnapshot`] with a derived [`ZoneIndex`], swaps it in and
//! then persists it. Queries always read a complete snapshot.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use alert_cache::{AlertCache, AreaFetcher, CacheConfig, FetchConfig, FileStore};
//!
//! let fetcher = AreaFetcher::from_config(FetchConfig::default().with_api_key("key"))?;
//! let cache = AlertCache::new(
//!     Arc::new(fetcher),
//!     Arc::new(FileStore::new("./data/alerts-cache.json")),
//!     CacheConfig::default(),
//! );
//!
//! cache.load_from_store().await;
//! cache.refresh_configured().await?;
//! let result = cache.query("614102").await?;
//! ```

mod cache;
mod config;
mod error;
mod fetch;
mod http;
mod snapshot;
mod store;
mod zone;

pub use cache::{AlertCache, CacheHealth, CacheStats, RefreshReport, ZoneQuery, TOP_ZONES};
pub use config::{parse_area_list, CacheConfig, FetchConfig, DEFAULT_AREAS, DEFAULT_BASE_URL};
pub use error::{CacheError, FetchError, StoreError};
pub use fetch::{
    read_bundle, AlertSource, AreaFetcher, AreaOutcome, AreaSnapshot, Discovery, InventoryEntry,
};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use snapshot::{CacheSnapshot, PersistedSnapshot, SNAPSHOT_VERSION};
pub use store::{FileStore, MemoryStore, SnapshotStore};
pub use zone::{
    extract_zone_codes, match_zone, MatchedBy, ZoneCode, ZoneCount, ZoneIndex, ZoneMatch,
    ZONE_CODE_LEN,
};
