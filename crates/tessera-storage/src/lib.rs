//! Tessera Storage Library
//!
//! Blob store abstraction, the local filesystem backend, and the path resolver
//! that every destination passes through before any I/O happens.
//!
//! Blobs are addressed by [`ResolvedPath`], which only [`PathResolver::resolve`]
//! can produce. A resolved path always lies strictly beneath the storage root.

pub mod factory;
pub mod local;
pub mod paths;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use local::LocalStorage;
pub use paths::{PathResolver, PathTraversal, ResolvedPath};
pub use traits::{BlobStat, BlobStore, BlobWriter, StorageError, StorageResult};
