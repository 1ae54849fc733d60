//! Command-line and environment configuration.

use crate::{AssetPath, prefs::JsonPreferences, statics};
use anyhow::{Context, bail};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "asset-grid")]
#[command(about = "Spreadsheet editor for typed asset records", version)]
pub struct Args {
    /// Project root holding schema.json5 and the .asset files
    #[arg(short, long, env = "ASSET_GRID_PROJECT", default_value = ".")]
    pub project: PathBuf,

    /// Initial scope, relative to the project root
    #[arg(short, long, env = "ASSET_GRID_SCOPE", default_value = "")]
    pub scope: String,

    /// Preference file (defaults to the platform config directory)
    #[arg(long, env = "ASSET_GRID_PREFS")]
    pub prefs: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "ASSET_GRID_LOG", default_value = "asset_grid=info")]
    pub log_level: String,
}

/// Resolved startup settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub project_root: PathBuf,
    pub schema_path: PathBuf,
    pub scope: AssetPath,
    pub prefs_path: PathBuf,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let project_root = args
            .project
            .canonicalize()
            .with_context(|| format!("opening project directory {:?}", args.project))?;
        if !project_root.is_dir() {
            bail!("{:?} is not a directory", project_root);
        }
        let prefs_path = match &args.prefs {
            Some(path) => path.clone(),
            None => JsonPreferences::default_path()
                .unwrap_or_else(|| project_root.join(statics::PREFS_FILE_NAME)),
        };
        Ok(Self {
            schema_path: project_root.join(statics::SCHEMA_FILE_NAME),
            project_root,
            scope: AssetPath::new(args.scope.trim().trim_matches('/')),
            prefs_path,
        })
    }
}
