//! Atomic write-to-temp-then-rename helper shared by every on-disk state
//! file (spec.md §5: "state file writes are totally ordered and atomic").

use std::path::Path;

use crate::error::KeeperError;

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), KeeperError> {
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, bytes).map_err(|source| KeeperError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|source| KeeperError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, KeeperError> {
    std::fs::read(path).map_err(|source| KeeperError::Io {
        path: path.to_path_buf(),
        source,
    })
}
