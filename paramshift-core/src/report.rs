//! Per-file migration reports
//!
//! Global invariants enforced:
//! - Reports keep the order files were supplied in
//! - Byte-for-byte identical output across runs

use crate::region::{FunctionRegion, RegionState};
use serde::{Deserialize, Serialize};

/// Outcome for one input path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileStatus {
    /// Content changed and was written back
    Migrated,
    /// Content would change (dry run, nothing written)
    WouldMigrate,
    /// No handler needed migrating
    Unchanged,
    /// Path does not exist
    NotFound,
    /// Read or write failed
    Failed,
    /// Transformed text no longer parses; nothing written
    Invalid,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Migrated => "migrated",
            FileStatus::WouldMigrate => "would-migrate",
            FileStatus::Unchanged => "unchanged",
            FileStatus::NotFound => "not-found",
            FileStatus::Failed => "failed",
            FileStatus::Invalid => "invalid",
        }
    }

    /// Whether this outcome should fail the run
    pub fn is_error(&self) -> bool {
        matches!(self, FileStatus::Failed | FileStatus::Invalid)
    }
}

/// Outcome for one matched handler
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionReport {
    pub function: String,
    /// 1-indexed declaration line in the original file
    pub line: usize,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FunctionReport {
    pub fn from_region(region: &FunctionRegion) -> Self {
        FunctionReport {
            function: region.name().to_string(),
            line: region.decl_line + 1,
            state: region.state.as_str().to_string(),
            reason: region.skip_reason().map(|r| r.as_str().to_string()),
        }
    }
}

/// Complete report for one input path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileReport {
    pub path: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub functions: Vec<FunctionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        FileReport {
            path: path.into(),
            status,
            functions: Vec::new(),
            error: None,
        }
    }

    pub fn with_regions(mut self, regions: &[FunctionRegion]) -> Self {
        self.functions = regions.iter().map(FunctionReport::from_region).collect();
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// One line per handler that did not get a resolution statement
    pub fn warnings(&self) -> Vec<String> {
        self.functions
            .iter()
            .filter_map(|f| {
                let reason = f.reason.as_deref()?;
                let action = if f.state == RegionState::SignatureRewritten.as_str() {
                    "signature rewritten without resolution"
                } else {
                    "left unmigrated"
                };
                Some(format!(
                    "{}:{}: {}: {} ({})",
                    self.path, f.line, f.function, action, reason
                ))
            })
            .collect()
    }
}

/// Render reports as text output, one status line per path plus a summary
pub fn render_text(reports: &[FileReport]) -> String {
    let mut output = String::new();

    for report in reports {
        output.push_str(&format!("{}: {}\n", report.status.as_str(), report.path));
        if let Some(ref error) = report.error {
            output.push_str(&format!("  {}\n", error));
        }
    }

    let count = |status: FileStatus| reports.iter().filter(|r| r.status == status).count();
    let injected: usize = reports
        .iter()
        .flat_map(|r| &r.functions)
        .filter(|f| f.state == RegionState::Injected.as_str())
        .count();

    output.push_str(&format!(
        "\n{} migrated, {} would migrate, {} unchanged, {} not found, {} failed, {} invalid ({} handlers updated)\n",
        count(FileStatus::Migrated),
        count(FileStatus::WouldMigrate),
        count(FileStatus::Unchanged),
        count(FileStatus::NotFound),
        count(FileStatus::Failed),
        count(FileStatus::Invalid),
        injected,
    ));

    output
}

/// Render reports as JSON output
pub fn render_json(reports: &[FileReport]) -> String {
    serde_json::to_string_pretty(reports).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<FileReport> {
        let mut migrated = FileReport::new("app/api/items/[id]/route.ts", FileStatus::Migrated);
        migrated.functions = vec![
            FunctionReport {
                function: "GET".to_string(),
                line: 9,
                state: "injected".to_string(),
                reason: None,
            },
            FunctionReport {
                function: "PUT".to_string(),
                line: 52,
                state: "skipped".to_string(),
                reason: Some("anchor-not-found".to_string()),
            },
        ];
        vec![
            migrated,
            FileReport::new("app/api/missing/route.ts", FileStatus::NotFound),
        ]
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample());
        assert!(text.starts_with(
            "migrated: app/api/items/[id]/route.ts\nnot-found: app/api/missing/route.ts\n"
        ));
        assert!(text.contains("1 migrated, 0 would migrate, 0 unchanged, 1 not found"));
        assert!(text.contains("(1 handlers updated)"));
    }

    #[test]
    fn test_render_json_is_deterministic() {
        let reports = sample();
        let json = render_json(&reports);
        assert_eq!(json, render_json(&reports));

        let parsed: Vec<FileReport> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, reports);
        assert!(json.contains("\"status\": \"not-found\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_warnings() {
        let warnings = sample()[0].warnings();
        assert_eq!(
            warnings,
            vec!["app/api/items/[id]/route.ts:52: PUT: left unmigrated (anchor-not-found)".to_string()]
        );
    }

    #[test]
    fn test_error_statuses() {
        assert!(FileStatus::Failed.is_error());
        assert!(FileStatus::Invalid.is_error());
        assert!(!FileStatus::NotFound.is_error());
        assert!(!FileStatus::Unchanged.is_error());
    }
}
