//! Zip archive construction for directory downloads.

use std::fs::File;
use std::io::{self, Cursor};
use std::path::Path;

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;

/// Zip the contents of `dir` into an in-memory archive.
///
/// Entry names are relative to `dir` and always use `/`. Empty
/// directories are kept as directory entries. Blocking; call from
/// `spawn_blocking`.
pub fn zip_directory(dir: &Path) -> AppResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to walk directory for zip", e)
        })?;
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|_| AppError::internal("Walked entry escaped the archive root"))?;
        let name = archive_name(relative);

        if entry.file_type().is_dir() {
            writer
                .add_directory(format!("{name}/"), options)
                .map_err(|e| zip_error(&name, e))?;
        } else if entry.file_type().is_file() {
            writer
                .start_file(name.clone(), options)
                .map_err(|e| zip_error(&name, e))?;
            let mut source = File::open(entry.path())?;
            io::copy(&mut source, &mut writer)?;
        }
    }

    let cursor = writer
        .finish()
        .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to finish zip archive", e))?;
    Ok(cursor.into_inner())
}

fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn zip_error(name: &str, err: zip::result::ZipError) -> AppError {
    AppError::with_source(
        ErrorKind::Storage,
        format!("Failed to add '{name}' to zip archive"),
        err,
    )
}
