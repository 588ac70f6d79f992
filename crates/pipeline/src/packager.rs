//! Batch packaging: zip a directory of rendered images, upload the
//! archive, and clean local temp state.

use std::io;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::PipelineError;

/// Zip every regular file in `dir` (flat, no recursion) into a sibling
/// archive named `{dir}.zip`. Returns the archive path.
pub fn zip_dir(dir: &Path) -> Result<PathBuf, PipelineError> {
    let archive_path = dir.with_extension("zip");
    let file = std::fs::File::create(&archive_path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        writer.start_file(entry.file_name().to_string_lossy(), options)?;
        let mut src = std::fs::File::open(&path)?;
        io::copy(&mut src, &mut writer)?;
    }

    writer.finish()?;
    Ok(archive_path)
}

/// Best-effort removal of temp files and directories.
///
/// Failures are logged and never raised; leftover temp state must not fail
/// a batch. Paths that no longer exist are skipped silently.
pub async fn cleanup(paths: &[PathBuf]) {
    for path in paths {
        let result = if path.is_dir() {
            tokio::fs::remove_dir_all(path).await
        } else if path.is_file() {
            tokio::fs::remove_file(path).await
        } else {
            continue;
        };
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "Temp cleanup failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
