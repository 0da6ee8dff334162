//! File orchestration - reads, transforms, verifies and writes back each file
//!
//! Global invariants enforced:
//! - Files are processed one at a time, in the order given
//! - A failure on one file never stops the batch
//! - The full transformed text exists in memory before anything is written
//! - Writes go through a temp file and a rename, so a file is never half-written

use crate::report::{FileReport, FileStatus};
use crate::transform::Engine;
use crate::verify::verify_syntax;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct MigrateOptions {
    /// Compute results without writing anything
    pub dry_run: bool,
    /// Re-parse transformed output and refuse to write it if parsing fails
    pub verify: bool,
}

/// Migrate every path in order
pub fn migrate_files(paths: &[PathBuf], engine: &Engine, options: &MigrateOptions) -> Vec<FileReport> {
    paths
        .iter()
        .map(|path| migrate_file(path, engine, options))
        .collect()
}

/// Migrate one path, folding any error into its report
pub fn migrate_file(path: &Path, engine: &Engine, options: &MigrateOptions) -> FileReport {
    let display = path.display().to_string();

    if !path.exists() {
        return FileReport::new(display, FileStatus::NotFound);
    }

    match try_migrate_file(path, engine, options) {
        Ok(report) => report,
        Err(e) => FileReport::new(display, FileStatus::Failed).with_error(format!("{:#}", e)),
    }
}

fn try_migrate_file(path: &Path, engine: &Engine, options: &MigrateOptions) -> Result<FileReport> {
    let display = path.display().to_string();

    let src = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let transformation = engine.transform(&src);

    if transformation.text == src {
        return Ok(FileReport::new(display, FileStatus::Unchanged)
            .with_regions(&transformation.regions));
    }

    if options.verify {
        if let Err(e) = verify_syntax(&transformation.text, &display) {
            return Ok(FileReport::new(display, FileStatus::Invalid)
                .with_regions(&transformation.regions)
                .with_error(format!("{:#}", e)));
        }
    }

    if options.dry_run {
        return Ok(FileReport::new(display, FileStatus::WouldMigrate)
            .with_regions(&transformation.regions));
    }

    atomic_write(path, &transformation.text)?;

    Ok(FileReport::new(display, FileStatus::Migrated).with_regions(&transformation.regions))
}

/// Temp file used while replacing `path`, next to it so the rename stays on one filesystem
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.paramshift.tmp", name))
}

/// Atomically replace the contents of `path`
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let temp_path = temp_path_for(path);
    let written = write_then_rename(&temp_path, path, contents);
    if written.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    written
}

fn write_then_rename(temp_path: &Path, path: &Path, contents: &str) -> Result<()> {
    use std::fs;
    use std::io::Write;

    let mut file = fs::File::create(temp_path)
        .with_context(|| format!("failed to create temp file: {}", temp_path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write to temp file: {}", temp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to sync temp file: {}", temp_path.display()))?;
    drop(file);

    fs::rename(temp_path, path)
        .with_context(|| format!("failed to rename temp file to: {}", path.display()))
}
