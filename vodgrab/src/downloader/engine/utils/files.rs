//! Output file preparation.

use std::path::Path;

use tracing::debug;

use crate::{Error, Result};

/// Ensure the output directory exists, creating it if necessary.
pub async fn ensure_output_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| Error::io_path("creating output directory", path, e))
}

/// Make `output` writable from scratch: create its parent directory and
/// remove any file already there.
///
/// A directory at `output` is refused rather than removed.
pub async fn prepare_output_file(output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_output_dir(parent).await?;
    }

    match tokio::fs::metadata(output).await {
        Ok(meta) if meta.is_dir() => Err(Error::validation(format!(
            "output path {} is a directory",
            output.display()
        ))),
        Ok(_) => {
            tokio::fs::remove_file(output)
                .await
                .map_err(|e| Error::io_path("removing existing output", output, e))?;
            debug!(path = %output.display(), "Removed existing output file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io_path("inspecting output path", output, e)),
    }
}
