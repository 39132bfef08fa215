use super::{ObjectMeta, ObjectStore};
use crate::error::{CarPriceError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
struct StoredObject {
    bytes: Vec<u8>,
    meta: ObjectMeta,
}

/// In-process object store. ETags are a per-store write counter.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    writes: AtomicU64,
}

static_assertions::assert_impl_all!(MemoryObjectStore: Send, Sync);

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>> {
        let objects = self.objects.read();
        Ok(objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.meta.clone()))
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let objects = self.objects.read();
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.bytes.clone())
            .ok_or_else(|| CarPriceError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<ObjectMeta> {
        let generation = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        let meta = ObjectMeta {
            etag: format!("{generation:x}"),
            size: bytes.len() as u64,
        };
        self.objects.write().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                bytes: bytes.to_vec(),
                meta: meta.clone(),
            },
        );
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_etags() {
        let store = MemoryObjectStore::new();
        assert!(store.head("b", "k").unwrap().is_none());

        let first = store.put("b", "k", b"one").unwrap();
        let second = store.put("b", "k", b"two").unwrap();
        assert_ne!(first.etag, second.etag);
        assert_eq!(store.get("b", "k").unwrap(), b"two");
        assert_eq!(store.len(), 1);
        assert!(store.exists("b", "k").unwrap());
        assert!(!store.exists("other", "k").unwrap());
    }
}
