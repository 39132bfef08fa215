//! Object storage for published models.
//!
//! A bucket/key store with the four calls the pipeline and the predictor
//! need. Every object carries an ETag that changes whenever it is rewritten;
//! the predictor's model cache keys on it.

mod local;
mod memory;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Metadata returned by `head` and `put`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub etag: String,
    pub size: u64,
}

pub trait ObjectStore: Send + Sync {
    /// Metadata of an object, `None` when absent.
    fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>>;

    /// Object contents; [`ObjectNotFound`](crate::CarPriceError::ObjectNotFound) when absent.
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Create or overwrite an object.
    fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<ObjectMeta>;

    fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(self.head(bucket, key)?.is_some())
    }
}
