use std::path::{Path, PathBuf};

use ghdump_core::config::DUMP_DIR_NAME;
use ghdump_core::error::DumpError;

/// Path of the dump folder under `root`.
pub fn dump_dir(root: &Path) -> PathBuf {
    root.join(DUMP_DIR_NAME)
}

/// Create the dump folder under `root`, refusing to reuse an existing one.
///
/// `root` itself must already exist; it is not created.
pub fn prepare(root: &Path) -> Result<PathBuf, DumpError> {
    let dir = dump_dir(root);
    if dir.exists() {
        return Err(DumpError::DestinationExists { path: dir });
    }

    tracing::info!("creating folder: {}", dir.display());
    std::fs::create_dir(&dir).map_err(|source| DumpError::DestinationUncreatable {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

/// Remove a dump folder that is still empty. Anything else is left alone.
pub fn discard_if_empty(dir: &Path) {
    match std::fs::remove_dir(dir) {
        Ok(()) => tracing::debug!("removed empty dump folder {}", dir.display()),
        Err(e) => tracing::debug!("kept dump folder {}: {e}", dir.display()),
    }
}
