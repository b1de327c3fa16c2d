use std::path::{Path, PathBuf};

use log::info;

use super::collection;
use super::model::MeasurementCollection;
use crate::colorimetry::{Cie1931, Colorimeter};
use crate::error::{CsmfError, Result};

/// Extension every measurement file carries.
pub const EXTENSION: &str = "csmf";

/// The path actually read or written: whatever suffix `path` has is
/// replaced by `.csmf`.
pub fn resolve_path(path: impl AsRef<Path>) -> PathBuf {
    path.as_ref().with_extension(EXTENSION)
}

/// Write `collection` to `<path stem>.csmf` and return that path.
///
/// The file is written in a single call; a crash mid-write can leave a
/// truncated file behind.
pub fn save(path: impl AsRef<Path>, collection: &MeasurementCollection) -> Result<PathBuf> {
    let path = resolve_path(path);
    let bytes = collection::encode(collection);
    std::fs::write(&path, &bytes).map_err(|source| CsmfError::Io {
        path: path.clone(),
        source,
    })?;
    info!("saved {} ({} bytes, {})", path.display(), bytes.len(), collection);
    Ok(path)
}

/// Read `<path stem>.csmf`.
pub fn load(path: impl AsRef<Path>, recompute: bool) -> Result<MeasurementCollection> {
    load_with(path, recompute, &Cie1931::default())
}

pub fn load_with(
    path: impl AsRef<Path>,
    recompute: bool,
    colorimeter: &dyn Colorimeter,
) -> Result<MeasurementCollection> {
    let path = resolve_path(path);
    let bytes = std::fs::read(&path).map_err(|source| CsmfError::Io {
        path: path.clone(),
        source,
    })?;
    let collection = collection::decode_with(&bytes, recompute, colorimeter)?;
    info!("loaded {} ({} bytes, {})", path.display(), bytes.len(), collection);
    Ok(collection)
}
