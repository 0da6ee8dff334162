//! Integration tests for paramshift migration over fixture route files

use paramshift_core::region::{RegionState, SkipReason};
use paramshift_core::{
    migrate, migrate_files, Convention, Engine, FileStatus, Locator, MigrateOptions,
};
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join("routes")
        .join(name)
}

fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).unwrap()
}

/// Copy a fixture into `dir` under `as_name` and return the new path
fn stage(dir: &Path, fixture: &str, as_name: &str) -> PathBuf {
    let path = dir.join(as_name);
    fs::write(&path, read_fixture(fixture)).unwrap();
    path
}

#[test]
fn test_items_route_migrates_to_expected_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = stage(dir.path(), "items.legacy.ts", "route.ts");

    let reports = migrate(&[path.clone()], Convention::default(), MigrateOptions::default()).unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].status, FileStatus::Migrated);
    assert_eq!(reports[0].functions.len(), 3);
    assert!(reports[0].functions.iter().all(|f| f.state == "injected"));
    assert_eq!(fs::read_to_string(&path).unwrap(), read_fixture("items.migrated.ts"));
}

#[test]
fn test_partially_convertible_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = stage(dir.path(), "suppliers.legacy.ts", "route.ts");

    let reports = migrate(&[path.clone()], Convention::default(), MigrateOptions::default()).unwrap();

    assert_eq!(reports[0].status, FileStatus::Migrated);
    let functions = &reports[0].functions;
    assert_eq!(functions[0].function, "GET");
    assert_eq!(functions[0].state, "skipped");
    assert_eq!(functions[0].reason.as_deref(), Some("anchor-not-found"));
    assert_eq!(functions[1].function, "PATCH");
    assert_eq!(functions[1].state, "injected");
    assert_eq!(reports[0].warnings().len(), 1);

    assert_eq!(fs::read_to_string(&path).unwrap(), read_fixture("suppliers.migrated.ts"));
}

#[test]
fn test_migrated_files_are_left_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let items = stage(dir.path(), "items.migrated.ts", "items.ts");
    let suppliers = stage(dir.path(), "suppliers.migrated.ts", "suppliers.ts");

    let reports = migrate(
        &[items.clone(), suppliers.clone()],
        Convention::default(),
        MigrateOptions::default(),
    )
    .unwrap();

    assert_eq!(reports[0].status, FileStatus::Unchanged);
    assert_eq!(fs::read_to_string(&items).unwrap(), read_fixture("items.migrated.ts"));
    // The public GET still has the old shape and is still skipped
    assert_eq!(reports[1].status, FileStatus::Unchanged);
    assert_eq!(
        fs::read_to_string(&suppliers).unwrap(),
        read_fixture("suppliers.migrated.ts")
    );
}

#[test]
fn test_missing_path_does_not_stop_batch() {
    let alone_dir = tempfile::tempdir().unwrap();
    let alone = stage(alone_dir.path(), "items.legacy.ts", "route.ts");
    migrate(&[alone.clone()], Convention::default(), MigrateOptions::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("app/api/missing/[id]/route.ts");
    let valid = stage(dir.path(), "items.legacy.ts", "route.ts");

    let reports = migrate(
        &[missing.clone(), valid.clone()],
        Convention::default(),
        MigrateOptions::default(),
    )
    .unwrap();

    assert_eq!(reports[0].status, FileStatus::NotFound);
    assert_eq!(reports[0].path, missing.display().to_string());
    assert_eq!(reports[1].status, FileStatus::Migrated);
    assert_eq!(
        fs::read_to_string(&valid).unwrap(),
        fs::read_to_string(&alone).unwrap()
    );
}

#[test]
fn test_no_cross_file_leakage() {
    let dir = tempfile::tempdir().unwrap();
    let a = stage(dir.path(), "items.legacy.ts", "a.ts");
    let b = stage(dir.path(), "static.ts", "b.ts");

    let engine = Engine::new(Convention::default()).unwrap();
    let reports = migrate_files(&[a, b.clone()], &engine, &MigrateOptions::default());

    assert_eq!(reports[0].status, FileStatus::Migrated);
    assert_eq!(reports[1].status, FileStatus::Unchanged);
    assert!(reports[1].functions.is_empty());
    assert_eq!(fs::read_to_string(&b).unwrap(), read_fixture("static.ts"));
}

#[test]
fn test_verified_output_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = stage(dir.path(), "items.legacy.ts", "route.ts");
    let options = MigrateOptions {
        dry_run: false,
        verify: true,
    };

    let reports = migrate(&[path.clone()], Convention::default(), options).unwrap();

    assert_eq!(reports[0].status, FileStatus::Migrated);
    assert_eq!(fs::read_to_string(&path).unwrap(), read_fixture("items.migrated.ts"));
}

#[test]
fn test_window_locator_on_long_check() {
    let convention = Convention {
        locator: Locator::Window { size: 5 },
        ..Convention::default()
    };
    let engine = Engine::new(convention).unwrap();
    let result = engine.transform(&read_fixture("items.legacy.ts"));

    assert_eq!(result.regions.len(), 3);
    assert_eq!(result.regions[0].state, RegionState::Injected);
    assert_eq!(result.regions[1].state, RegionState::Injected);
    assert_eq!(
        result.regions[2].state,
        RegionState::Skipped(SkipReason::InsertionWindowExhausted)
    );

    let delete = &result.text[result.text.find("export async function DELETE").unwrap()..];
    assert!(delete.contains("{ params }: { params: { id: string } }"));
    assert!(delete.contains("where: { id: params.id }"));
    assert!(!delete.contains("await params;"));
}

#[test]
fn test_deterministic_output() {
    let engine = Engine::new(Convention::default()).unwrap();
    let src = read_fixture("items.legacy.ts");
    assert_eq!(engine.transform(&src).text, engine.transform(&src).text);
}
