//! paramshift CLI - migrates route handlers to awaited Promise params

#![deny(warnings)]

// Global invariants enforced:
// - Files are processed in the order given
// - Identical input yields byte-for-byte identical output

use anyhow::Context;
use clap::{Parser, Subcommand};
use paramshift_core::config::{self, ResolvedConfig};
use paramshift_core::{migrate, render_json, render_text, Locator, MigrateOptions, UnresolvedPolicy};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "paramshift")]
#[command(about = "Rewrite Next.js route handlers to await their params")]
#[command(version = env!("PARAMSHIFT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate route handler files in place
    Migrate {
        /// Files to migrate (default: "files" from the config)
        files: Vec<PathBuf>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Project root used for config discovery (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Insertion-point strategy (overrides config file)
        #[arg(long)]
        locator: Option<LocatorArg>,

        /// Lines scanned after the anchor by the window locator (overrides config file)
        #[arg(long)]
        window: Option<usize>,

        /// Handling of handlers whose resolution statement cannot be placed
        #[arg(long)]
        on_unresolved: Option<UnresolvedArg>,

        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Re-parse transformed files and skip any that no longer parse
        #[arg(long)]
        verify: bool,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Inspect configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without migrating anything
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum LocatorArg {
    Block,
    Window,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum UnresolvedArg {
    Revert,
    Keep,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate {
            files,
            config: config_path,
            root,
            locator,
            window,
            on_unresolved,
            dry_run,
            verify,
            format,
        } => {
            let cwd = std::env::current_dir()?;
            let project_root = match root {
                Some(root) => absolutize(&cwd, root),
                None => cwd.clone(),
            };

            let mut resolved = config::load_and_resolve(&project_root, config_path.as_deref())
                .context("failed to load configuration")?;

            if let Some(config_path) = &resolved.config_path {
                eprintln!("Using config: {}", config_path.display());
            }

            apply_overrides(&mut resolved, locator, window, on_unresolved)?;

            // Paths on the command line replace the configured list
            let paths: Vec<PathBuf> = if files.is_empty() {
                resolved.files.clone()
            } else {
                files.into_iter().map(|f| absolutize(&cwd, f)).collect()
            };
            if paths.is_empty() {
                anyhow::bail!("no files to migrate (pass paths or set \"files\" in the config)");
            }

            let options = MigrateOptions { dry_run, verify };
            let reports = migrate(&paths, resolved.convention, options)?;

            for report in &reports {
                for warning in report.warnings() {
                    eprintln!("warning: {}", warning);
                }
            }

            match format {
                OutputFormat::Text => print!("{}", render_text(&reports)),
                OutputFormat::Json => println!("{}", render_json(&reports)),
            }

            if reports.iter().any(|r| r.status.is_error()) {
                std::process::exit(1);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                match config::load_and_resolve(&project_root, path.as_deref()) {
                    Ok(resolved) => {
                        if let Some(ref p) = resolved.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;
                print!("{}", describe_config(&resolved));
            }
        },
    }

    Ok(())
}

/// Apply CLI flags on top of the resolved config
fn apply_overrides(
    resolved: &mut ResolvedConfig,
    locator: Option<LocatorArg>,
    window: Option<usize>,
    on_unresolved: Option<UnresolvedArg>,
) -> anyhow::Result<()> {
    if window == Some(0) {
        anyhow::bail!("--window must be at least 1");
    }

    let convention = &mut resolved.convention;
    let current_window = match convention.locator {
        Locator::Window { size } => size,
        Locator::Block => config::DEFAULT_WINDOW,
    };

    convention.locator = match (locator, window) {
        (Some(LocatorArg::Block), _) => Locator::Block,
        (Some(LocatorArg::Window), w) => Locator::Window {
            size: w.unwrap_or(current_window),
        },
        (None, Some(size)) => Locator::Window { size },
        (None, None) => convention.locator,
    };

    if let Some(policy) = on_unresolved {
        convention.on_unresolved = match policy {
            UnresolvedArg::Revert => UnresolvedPolicy::Revert,
            UnresolvedArg::Keep => UnresolvedPolicy::Keep,
        };
    }

    Ok(())
}

fn describe_config(resolved: &ResolvedConfig) -> String {
    let c = &resolved.convention;
    let mut out = String::from("Configuration:\n");
    match resolved.config_path {
        Some(ref p) => out.push_str(&format!("  Source: {}\n", p.display())),
        None => out.push_str("  Source: defaults\n"),
    }
    out.push_str(&format!("  Reference:     {}\n", c.qualified_reference()));
    out.push_str(&format!("  Wrapper:       {}\n", c.wrapper));
    out.push_str(&format!("  Anchor:        {}\n", c.anchor));
    out.push_str(&format!("  Session ident: {}\n", c.session_ident));
    match c.locator {
        Locator::Window { size } => out.push_str(&format!("  Locator:       window ({} lines)\n", size)),
        Locator::Block => out.push_str("  Locator:       block\n"),
    }
    out.push_str(&format!("  Unresolved:    {}\n", c.on_unresolved.as_str()));
    out.push_str(&format!("  Comment:       {}\n", c.comment));
    out.push_str(&format!("  Statement:     {}\n", c.resolution_statement()));
    out.push_str(&format!("  Files:         {}\n", resolved.files.len()));
    for file in &resolved.files {
        out.push_str(&format!("    {}\n", file.display()));
    }
    out
}

fn absolutize(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        cwd.join(path)
    } else {
        path
    }
}
