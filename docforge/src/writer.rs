//! Output of rendered documents to the filesystem

use crate::error::DocumentError;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write a rendered buffer to a file
///
/// The file is created (or truncated), written in full and synced to disk.
/// The handle is released on every path, including failures. Parent
/// directories are not created.
///
/// # Parameters
/// * `buffer` - The rendered document bytes
/// * `path` - Target file path
///
/// # Returns
/// * `Ok(())` - All bytes were written and flushed
/// * `Err(DocumentError::Io)` - The file could not be created or written
pub fn write(buffer: &[u8], path: &Path) -> Result<(), DocumentError> {
    let io_error = |source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(io_error)?;
    file.write_all(buffer).map_err(io_error)?;
    file.sync_all().map_err(io_error)?;

    log::info!("Wrote {} bytes to {}", buffer.len(), path.display());
    Ok(())
}
