//! Helper functions for tempfile usage in tests

use std::io::Write;

use anyhow::Context;

/// Create a named temp file with a helpful error message.
pub fn create_temp_file_with_suffix(suffix: &str) -> anyhow::Result<tempfile::NamedTempFile> {
    tempfile::NamedTempFile::with_suffix(suffix).context("Failed to create temporary file with suffix")
}

/// Write `contents` to a fresh `.json` temp file
pub fn write_json_file(contents: &str) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut file = create_temp_file_with_suffix(".json")?;
    file.write_all(contents.as_bytes())
        .context("Failed to write temporary JSON file")?;
    file.flush().context("Failed to flush temporary JSON file")?;
    Ok(file)
}
