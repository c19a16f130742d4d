//! Zip packaging of a finished archive directory.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::ArchiveError;

/// Zip the contents of `root` into `dest`. Entry names are relative to `root`.
///
/// Runs on a blocking thread.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or the zip cannot be written.
pub async fn package_archive(root: &Path, dest: &Path) -> Result<PathBuf, ArchiveError> {
    let root_owned = root.to_path_buf();
    let dest_owned = dest.to_path_buf();

    let entries = tokio::task::spawn_blocking(move || write_zip(&root_owned, &dest_owned))
        .await
        .map_err(|e| ArchiveError::Package {
            path: root.to_path_buf(),
            message: format!("packaging task panicked: {e}"),
        })?
        .map_err(|e| ArchiveError::Package {
            path: root.to_path_buf(),
            message: format!("{e:#}"),
        })?;

    info!(path = %dest.display(), entries, "Archive packaged");
    Ok(dest.to_path_buf())
}

fn write_zip(root: &Path, dest: &Path) -> Result<usize> {
    let file = File::create(dest)
        .with_context(|| format!("Failed to create zip file: {}", dest.display()))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut entries = 0;
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.context("Failed to walk archive directory")?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .context("Walked outside the archive root")?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        // Zip entry names always use forward slashes.
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)
                .context("Failed to add directory entry")?;
            continue;
        }

        let data = std::fs::read(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        zip.start_file(name, options)
            .context("Failed to start ZIP entry")?;
        zip.write_all(&data)
            .context("Failed to write file data to ZIP")?;
        entries += 1;
    }

    zip.finish()
        .context("Failed to finish ZIP file")?
        .flush()
        .context("Failed to flush ZIP file")?;

    Ok(entries)
}
