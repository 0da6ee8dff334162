//! Configuration file support for paramshift
//!
//! Loads the migration convention and the list of files to migrate from JSON.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.paramshiftrc.json` in project root
//! 3. `paramshift.config.json` in project root
//! 4. `"paramshift"` key in `package.json`
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::locate::Locator;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_PARAM: &str = "params";
pub const DEFAULT_FIELD: &str = "id";
pub const DEFAULT_WRAPPER: &str = "Promise";
pub const DEFAULT_ANCHOR: &str = "const session = await getServerSession";
pub const DEFAULT_SESSION_IDENT: &str = "session";
pub const DEFAULT_COMMENT: &str = "// Await params (Next.js 15 requirement)";
pub const DEFAULT_WINDOW: usize = 5;

/// paramshift configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamshiftConfig {
    /// Files to migrate, relative to the directory holding the config file
    #[serde(default)]
    pub files: Vec<String>,

    /// Name of the destructured params object (default: params)
    #[serde(default)]
    pub param: Option<String>,

    /// Name of the destructured route field (default: id)
    #[serde(default)]
    pub field: Option<String>,

    /// Deferred-resolution wrapper type (default: Promise)
    #[serde(default)]
    pub wrapper: Option<String>,

    /// Statement text that marks the session lookup
    #[serde(default)]
    pub anchor: Option<String>,

    /// Identifier the end of the authorization check must not mention
    #[serde(default)]
    pub session_ident: Option<String>,

    /// Number of lines scanned after the anchor by the window locator (default: 5)
    #[serde(default)]
    pub window: Option<usize>,

    /// Insertion-point strategy (default: block)
    #[serde(default)]
    pub locator: Option<LocatorKind>,

    /// What to do with a signature whose resolution statement cannot be placed
    #[serde(default)]
    pub on_unresolved: Option<UnresolvedPolicy>,

    /// Marker comment written above the injected statement
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocatorKind {
    Block,
    Window,
}

/// Handling of functions whose signature matched but got no injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Leave the whole function in its old, synchronous shape
    #[default]
    Revert,
    /// Rewrite the signature anyway
    Keep,
}

impl UnresolvedPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnresolvedPolicy::Revert => "revert",
            UnresolvedPolicy::Keep => "keep",
        }
    }
}

/// The handler convention the engine recognizes and produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convention {
    pub param: String,
    pub field: String,
    pub wrapper: String,
    pub anchor: String,
    pub session_ident: String,
    pub comment: String,
    pub locator: Locator,
    pub on_unresolved: UnresolvedPolicy,
}

impl Default for Convention {
    fn default() -> Self {
        Convention {
            param: DEFAULT_PARAM.to_string(),
            field: DEFAULT_FIELD.to_string(),
            wrapper: DEFAULT_WRAPPER.to_string(),
            anchor: DEFAULT_ANCHOR.to_string(),
            session_ident: DEFAULT_SESSION_IDENT.to_string(),
            comment: DEFAULT_COMMENT.to_string(),
            locator: Locator::Block,
            on_unresolved: UnresolvedPolicy::Revert,
        }
    }
}

impl Convention {
    /// `<param>.<field>`, the qualified reference being rewritten
    pub fn qualified_reference(&self) -> String {
        format!("{}.{}", self.param, self.field)
    }

    /// `const { <field> } = await <param>;`
    pub fn resolution_statement(&self) -> String {
        format!("const {{ {} }} = await {};", self.field, self.param)
    }
}

/// Resolved configuration ready for use
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub convention: Convention,
    /// Files to migrate, in configured order
    pub files: Vec<PathBuf>,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

/// True for a plain JavaScript identifier
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

impl ParamshiftConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("param", &self.param),
            ("field", &self.field),
            ("wrapper", &self.wrapper),
            ("session_ident", &self.session_ident),
        ] {
            if let Some(v) = value {
                if !is_identifier(v) {
                    anyhow::bail!("{} must be a plain identifier (got {:?})", name, v);
                }
            }
        }

        if let Some(ref anchor) = self.anchor {
            if anchor.trim().is_empty() {
                anyhow::bail!("anchor must not be empty");
            }
            if anchor.contains('\n') {
                anyhow::bail!("anchor must fit on a single line");
            }
        }

        if let Some(ref comment) = self.comment {
            if !comment.starts_with("//") {
                anyhow::bail!("comment must start with // (got {:?})", comment);
            }
            if comment.contains('\n') {
                anyhow::bail!("comment must fit on a single line");
            }
        }

        if self.window == Some(0) {
            anyhow::bail!("window must be at least 1");
        }

        for file in &self.files {
            if file.trim().is_empty() {
                anyhow::bail!("files must not contain empty paths");
            }
        }

        Ok(())
    }

    /// Resolve config into the form consumed by the engine
    ///
    /// Relative entries of `files` are joined onto `base_dir`.
    pub fn resolve(&self, base_dir: &Path) -> Result<ResolvedConfig> {
        self.validate()?;

        let defaults = Convention::default();
        let window = self.window.unwrap_or(DEFAULT_WINDOW);
        let locator = match self.locator.unwrap_or(LocatorKind::Block) {
            LocatorKind::Block => Locator::Block,
            LocatorKind::Window => Locator::Window { size: window },
        };

        let convention = Convention {
            param: self.param.clone().unwrap_or(defaults.param),
            field: self.field.clone().unwrap_or(defaults.field),
            wrapper: self.wrapper.clone().unwrap_or(defaults.wrapper),
            anchor: self.anchor.clone().unwrap_or(defaults.anchor),
            session_ident: self.session_ident.clone().unwrap_or(defaults.session_ident),
            comment: self.comment.clone().unwrap_or(defaults.comment),
            locator,
            on_unresolved: self.on_unresolved.unwrap_or_default(),
        };

        let files = self.files.iter().map(|f| base_dir.join(f)).collect();

        Ok(ResolvedConfig {
            convention,
            files,
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        ParamshiftConfig::default().resolve(Path::new("."))
    }
}

/// Discover and load a config file from the project root
///
/// Search order:
/// 1. `.paramshiftrc.json`
/// 2. `paramshift.config.json`
/// 3. `"paramshift"` key in `package.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(ParamshiftConfig, PathBuf)>> {
    // 1. .paramshiftrc.json
    let rc_path = project_root.join(".paramshiftrc.json");
    if rc_path.exists() {
        let config = load_config_file(&rc_path)?;
        return Ok(Some((config, rc_path)));
    }

    // 2. paramshift.config.json
    let config_path = project_root.join("paramshift.config.json");
    if config_path.exists() {
        let config = load_config_file(&config_path)?;
        return Ok(Some((config, config_path)));
    }

    // 3. package.json "paramshift" key
    let pkg_path = project_root.join("package.json");
    if pkg_path.exists() {
        if let Some(config) = load_from_package_json(&pkg_path)? {
            return Ok(Some((config, pkg_path)));
        }
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<ParamshiftConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: ParamshiftConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load paramshift config from the "paramshift" key in package.json
fn load_from_package_json(path: &Path) -> Result<Option<ParamshiftConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let pkg: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    match pkg.get("paramshift") {
        Some(value) => {
            let config: ParamshiftConfig = serde_json::from_value(value.clone())
                .with_context(|| format!("invalid paramshift config in {}", path.display()))?;
            config
                .validate()
                .with_context(|| format!("invalid paramshift config in {}", path.display()))?;
            Ok(Some(config))
        }
        None => Ok(None),
    }
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (ParamshiftConfig::default(), None),
        }
    };

    let base_dir = source_path
        .as_deref()
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(project_root);

    let mut resolved = config.resolve(base_dir)?;
    resolved.config_path = source_path;
    Ok(resolved)
}
