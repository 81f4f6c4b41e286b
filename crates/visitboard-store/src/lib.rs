//! Blob storage for the visit board.
//!
//! Every data domain (events, settings, chat topics, chat users) lives in a
//! single JSON document on a remote key-value endpoint. Documents are read and
//! written whole; the last write wins. A local SQLite cache keeps the most
//! recent copy of each document for offline reads.

pub mod blob;
pub mod cache;
pub mod error;
pub mod remote;
pub mod retry;
pub mod sync;

pub use blob::{keys, Backend, BlobStore, Collection, MemoryBackend};
pub use cache::LocalCache;
pub use error::StoreError;
pub use remote::RemoteStore;
pub use retry::RetryConfig;
pub use sync::{PollHandle, Poller};
