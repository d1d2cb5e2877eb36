//! Stream registry
//!
//! Maps stream keys to live [`RtmpVideoStream`](crate::stream::RtmpVideoStream)
//! instances so publishers and players in one process find the same relay.
//!
//! ```text
//!                     Arc<StreamRegistry>
//!                ┌──────────────────────────┐
//!                │ streams: HashMap<Key,    │
//!                │   Arc<RtmpVideoStream>>  │
//!                └────────────┬─────────────┘
//!                             │
//!         ┌───────────────────┼───────────────────┐
//!         ▼                   ▼                   ▼
//!     [Producer]           [Sink]              [Sink]
//!     ingest()             attach()            attach()
//! ```
//!
//! Each stream is an independent unit of concurrency; the registry lock is
//! only held for lookups and never while media flows.

pub mod config;
pub mod error;
pub mod key;
pub mod store;

pub use config::RegistryConfig;
pub use error::RegistryError;
pub use key::StreamKey;
pub use store::StreamRegistry;
