//! # Dualzoom I/O
//!
//! Everything that touches the object store or the filesystem: storage
//! endpoint configuration, tile-source locators, HTTP fetching, the liveness
//! probe, Deep Zoom descriptors, pyramid generation and publishing a
//! generated pyramid into a bucket.

pub mod storage;
pub mod tile_source;
pub mod fetch;
pub mod probe;
pub mod dzi;
pub mod pyramid;
pub mod publish;

pub use storage::{StorageConfig, StorageCredentials};
pub use tile_source::TileSource;
pub use fetch::{FetchError, HttpFetcher, TileFetcher};
pub use probe::{check_connectivity, spawn_connectivity_check, Health};
pub use dzi::{DziDescriptor, DziError};
pub use pyramid::{DeepZoomCreator, TileFormat};
pub use publish::{publish_dir, HttpObjectSink, ObjectSink, PublishError, PublishReport};
