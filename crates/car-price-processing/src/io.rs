//! Artifact persistence: split datasets as CSV, transformed arrays as Arrow IPC.

use crate::error::{ProcessingError, Result, ResultExt};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .context(format!("Creating directory {}", parent.display()))?;
    }
    Ok(())
}

/// Read a comma separated file with a header row.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("Opening {}", path.display()))?
        .finish()
        .context(format!("Parsing {}", path.display()))?;
    debug!("Read {} rows from {}", df.height(), path.display());
    Ok(df)
}

/// Write a frame as CSV with a header row, creating parent directories.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    create_parent_dir(path)?;
    let mut file = File::create(path).context(format!("Creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)
        .context(format!("Writing {}", path.display()))?;
    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Write a numeric frame as an Arrow IPC file.
pub fn write_array(df: &mut DataFrame, path: &Path) -> Result<()> {
    create_parent_dir(path)?;
    let mut file = File::create(path).context(format!("Creating {}", path.display()))?;
    IpcWriter::new(&mut file)
        .finish(df)
        .context(format!("Writing {}", path.display()))?;
    Ok(())
}

/// Read an Arrow IPC file written by [`write_array`].
pub fn read_array(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| {
        ProcessingError::Io(e).with_context(format!("Opening {}", path.display()))
    })?;
    let df = IpcReader::new(file)
        .finish()
        .context(format!("Reading {}", path.display()))?;
    Ok(df)
}
