use super::{ObjectMeta, ObjectStore};
use crate::error::{CarPriceError, Result, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Object store on the local filesystem: `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

static_assertions::assert_impl_all!(LocalObjectStore: Send, Sync);

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let valid = |part: &str| {
            !part.is_empty()
                && Path::new(part)
                    .components()
                    .all(|c| matches!(c, std::path::Component::Normal(_)))
        };
        if !valid(bucket) || !valid(key) {
            return Err(CarPriceError::Storage(format!(
                "invalid object path '{bucket}/{key}'"
            )));
        }
        Ok(self.root.join(bucket).join(key))
    }

    /// `<len>-<mtime nanos>`, both hex.
    fn etag(meta: &fs::Metadata) -> Result<String> {
        let modified = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map_err(|e| CarPriceError::Storage(e.to_string()))?;
        Ok(format!("{:x}-{:x}", meta.len(), modified.as_nanos()))
    }
}

impl ObjectStore for LocalObjectStore {
    fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>> {
        let path = self.object_path(bucket, key)?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(Some(ObjectMeta {
                etag: Self::etag(&meta)?,
                size: meta.len(),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CarPriceError::Io(e).with_context(format!("Reading {}", path.display()))),
        }
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CarPriceError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(CarPriceError::Io(e).with_context(format!("Reading {}", path.display()))),
        }
    }

    fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<ObjectMeta> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // readers never see a half-written object
        let staging = path.with_extension("partial");
        fs::write(&staging, bytes).context(format!("Writing {}", staging.display()))?;
        fs::rename(&staging, &path).context(format!("Publishing {}", path.display()))?;

        let meta = fs::metadata(&path)?;
        Ok(ObjectMeta {
            etag: Self::etag(&meta)?,
            size: meta.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_head() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        assert!(!store.exists("bucket", "model.bin").unwrap());
        assert!(matches!(
            store.get("bucket", "model.bin"),
            Err(CarPriceError::ObjectNotFound { .. })
        ));

        let meta = store.put("bucket", "model.bin", b"weights").unwrap();
        assert_eq!(meta.size, 7);
        assert_eq!(store.get("bucket", "model.bin").unwrap(), b"weights");
        assert_eq!(store.head("bucket", "model.bin").unwrap(), Some(meta));
        assert!(dir.path().join("bucket/model.bin").exists());
    }

    #[test]
    fn test_rewrite_changes_etag() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let first = store.put("bucket", "model.bin", b"v1").unwrap();
        let second = store.put("bucket", "model.bin", b"version 2").unwrap();
        assert_ne!(first.etag, second.etag);
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        assert!(store.put("bucket", "../outside.bin", b"x").is_err());
        assert!(store.head("", "model.bin").is_err());
    }
}
