//! 基础设施层（Infrastructure Layer）
//!
//! 持有稀缺资源（网络客户端、共享缓存、存储），只暴露能力，不认识业务流程。

pub mod artifact_cache;
pub mod blob_store;
pub mod content_source;

pub use artifact_cache::ArtifactCache;
pub use blob_store::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use content_source::{ContentSource, HttpContentSource};
