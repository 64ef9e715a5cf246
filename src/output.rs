use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::FetchError;

pub const SCHEMA_FILE_NAME: &str = "schema.graphql";
pub const DEFAULT_OUTPUT_DIR: &str = "build";

/// Writes `text` to `path` as UTF-8, replacing any previous content.
///
/// The text goes to a temporary file next to `path`, which is synced and then
/// renamed over `path`. A failed write leaves the previous file intact and
/// removes the temporary one. The parent directory must already exist.
pub fn persist(text: &str, path: &Path) -> Result<(), FetchError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(parent).map_err(|e| FetchError::io(path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| FetchError::io(path, e))?;
    file.as_file()
        .sync_all()
        .map_err(|e| FetchError::io(path, e))?;

    file.persist(path)
        .map_err(|e| FetchError::io(path, e.error))?;
    Ok(())
}
