//! Document store access.
//!
//! The pipeline only needs two things from a document database: fetch a whole
//! collection as a frame, and bulk-insert a frame as records (used to seed the
//! collection). [`DocumentSource`] captures that contract; [`JsonDocumentSource`]
//! implements it over a directory holding one JSON array per collection.

use crate::error::{ProcessingError, Result, ResultExt};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Store-internal identifier removed from fetched frames.
pub const DOCUMENT_ID_FIELD: &str = "_id";

/// A read/append view of a document database.
pub trait DocumentSource: Send + Sync {
    /// Fetch every record of a collection as a frame.
    fn fetch_collection(&self, database: &str, collection: &str) -> Result<DataFrame>;

    /// Append the rows of `df` to a collection as individual records.
    fn insert_records(&self, database: &str, collection: &str, df: &DataFrame) -> Result<usize>;
}

/// Document store rooted at a directory: `<root>/<database>/<collection>.json`.
#[derive(Debug, Clone)]
pub struct JsonDocumentSource {
    root: PathBuf,
}

static_assertions::assert_impl_all!(JsonDocumentSource: Send, Sync);

impl JsonDocumentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing a collection.
    pub fn collection_path(&self, database: &str, collection: &str) -> PathBuf {
        self.root.join(database).join(format!("{collection}.json"))
    }

    fn read_file(path: &Path) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| {
            ProcessingError::Io(e).with_context(format!("Opening {}", path.display()))
        })?;
        let df = JsonReader::new(file)
            .with_json_format(JsonFormat::Json)
            .finish()
            .context(format!("Parsing {}", path.display()))?;
        Ok(df)
    }
}

impl DocumentSource for JsonDocumentSource {
    fn fetch_collection(&self, database: &str, collection: &str) -> Result<DataFrame> {
        let path = self.collection_path(database, collection);
        if !path.exists() {
            return Err(ProcessingError::Source(format!(
                "collection '{database}.{collection}' does not exist"
            )));
        }

        let mut df = Self::read_file(&path)?;
        if df.get_column_index(DOCUMENT_ID_FIELD).is_some() {
            df = df.drop(DOCUMENT_ID_FIELD)?;
        }
        info!(
            "Fetched {} records from {}.{}",
            df.height(),
            database,
            collection
        );
        Ok(df)
    }

    fn insert_records(&self, database: &str, collection: &str, df: &DataFrame) -> Result<usize> {
        let path = self.collection_path(database, collection);
        let mut combined = if path.exists() {
            let mut existing = Self::read_file(&path)?;
            existing
                .vstack_mut(df)
                .context("Appending records to existing collection")?;
            existing
        } else {
            df.clone()
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Creating directory {}", parent.display()))?;
        }
        let mut file = File::create(&path).context(format!("Creating {}", path.display()))?;
        JsonWriter::new(&mut file)
            .with_json_format(JsonFormat::Json)
            .finish(&mut combined)
            .context(format!("Writing {}", path.display()))?;

        debug!(
            "Collection {}.{} now holds {} records",
            database,
            collection,
            combined.height()
        );
        Ok(df.height())
    }
}
