//! paramshift core library - migrates route handlers to awaited params
//!
//! Rewrites handlers of the shape
//! `function GET(request, { params }: { params: { id: string } })` so that
//! `params` is typed as a `Promise`, resolved once after the session check,
//! and every `params.id` in the file becomes `id`.

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Text-level matching only; no syntax tree drives the rewrite
// - Each file is transformed independently and sequentially
// - No global mutable state, no threads, no async
// - A file is never partially written
// - Re-running on migrated output changes nothing

pub mod blocks;
pub mod config;
pub mod inject;
pub mod locate;
pub mod migrate;
pub mod references;
pub mod region;
pub mod report;
pub mod signature;
pub mod source;
pub mod transform;
pub mod verify;

pub use config::{Convention, ResolvedConfig, UnresolvedPolicy};
pub use locate::Locator;
pub use migrate::{migrate_file, migrate_files, MigrateOptions};
pub use report::{render_json, render_text, FileReport, FileStatus};
pub use transform::{Engine, Transformation};

use std::path::PathBuf;

/// Migrate `paths` in order under `convention`
///
/// Only an invalid convention is an error; per-file problems are reported in
/// the returned reports.
pub fn migrate(
    paths: &[PathBuf],
    convention: Convention,
    options: MigrateOptions,
) -> anyhow::Result<Vec<FileReport>> {
    let engine = Engine::new(convention)?;
    Ok(migrate_files(paths, &engine, &options))
}
