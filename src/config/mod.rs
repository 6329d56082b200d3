//! Pipeline configuration management for `iconsmith.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error.rs    # ConfigError, ConfigDiagnostics
//! ├── sources.rs  # Provider table (sources.json)
//! ├── util.rs     # Config discovery, path resolution
//! └── mod.rs      # PipelineConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section       | Purpose                                          |
//! |---------------|--------------------------------------------------|
//! | `[paths]`     | Provider table, downloads, icon and data output  |
//! | `[providers]` | Extra naming-rule tables                         |
//! | `[optimize]`  | Coordinate precision, id prefixing               |
//! | `[catalog]`   | Link base, JSON formatting                       |
//!
//! Every key is optional; a missing config file means all defaults, rooted
//! at the working directory.

mod error;
mod sources;
mod util;

pub use error::{ConfigDiagnostics, ConfigError};
pub use sources::{ProviderTable, SourceEntry};
pub use util::{find_config_file, resolve_path};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::BuildArgs;
use crate::log;
use crate::provider::ProviderRegistry;
use crate::svg::NormalizeOptions;

/// Highest coordinate precision accepted in `[optimize]`.
const MAX_PRECISION: u8 = 8;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing iconsmith.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub optimize: OptimizeConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// `[paths]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Provider table written by the discovery step.
    pub sources: PathBuf,
    /// Directory holding `<ProviderId>.zip` archives.
    pub downloads: PathBuf,
    /// Icon output root; each provider gets `<output>/<short>/`.
    pub output: PathBuf,
    /// Directory receiving `icons.json` and `index.json`.
    pub data: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sources: "config/sources.json".into(),
            downloads: "downloads".into(),
            output: "svg".into(),
            data: "www/src/data".into(),
        }
    }
}

/// `[providers]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Extra rule-table file merged over the built-in tables (empty: none).
    pub rules: PathBuf,
}

/// `[optimize]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeConfig {
    pub precision: u8,
    pub prefix_ids: bool,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            precision: 3,
            prefix_ids: true,
        }
    }
}

/// `[catalog]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Prefix of `items[].links.svg`.
    pub link_base: String,
    /// Indent the emitted JSON.
    pub pretty: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            link_base: "svg".into(),
            pretty: true,
        }
    }
}

impl PipelineConfig {
    /// Load configuration, searching upward from cwd for `config_name`.
    ///
    /// The project root is the config file's parent directory, or the
    /// working directory when no config file exists.
    pub fn load(config_name: &Path) -> Result<Self, ConfigError> {
        let mut config = match find_config_file(config_name) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = path;
                config
            }
            None => Self::default(),
        };

        let root = match config.config_path.parent() {
            Some(parent) if !config.config_path.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir().map_err(|err| ConfigError::Io(PathBuf::from("."), err))?,
        };
        config.finalize(&root);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;

        if !ignored.is_empty() {
            let display_path = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("warning"; "unknown fields in {} ignored: {}", display_path, ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), toml::de::Error> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Anchor every relative path at `root`.
    pub fn finalize(&mut self, root: &Path) {
        self.root = root.to_path_buf();
        let paths = &mut self.paths;
        paths.sources = resolve_path(root, &paths.sources);
        paths.downloads = resolve_path(root, &paths.downloads);
        paths.output = resolve_path(root, &paths.output);
        paths.data = resolve_path(root, &paths.data);
        if !self.providers.rules.as_os_str().is_empty() {
            self.providers.rules = resolve_path(root, &self.providers.rules);
        }
    }

    /// Apply `build` command overrides (relative to the working directory).
    pub fn apply_build_args(&mut self, args: &BuildArgs) {
        let cwd = std::env::current_dir().unwrap_or_else(|_| self.root.clone());
        if let Some(output) = &args.output {
            self.paths.output = resolve_path(&cwd, output);
        }
        if let Some(data) = &args.data {
            self.paths.data = resolve_path(&cwd, data);
        }
    }

    /// Validate values that parse but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        if self.optimize.precision > MAX_PRECISION {
            diag.error_with_hint(
                "optimize.precision",
                format!("precision {} is out of range", self.optimize.precision),
                format!("use a value between 0 and {MAX_PRECISION}"),
            );
        }
        if self.paths.output == self.root {
            diag.error_with_hint(
                "paths.output",
                "output directory is the project root",
                "provider output areas are deleted on every build",
            );
        }
        if self.catalog.link_base.contains('\\') {
            diag.error("catalog.link_base", "links must use `/` separators");
        }

        diag.into_result()
    }

    /// Extra rule file, if configured.
    pub fn rules_path(&self) -> Option<&Path> {
        let rules = self.providers.rules.as_path();
        (!rules.as_os_str().is_empty()).then_some(rules)
    }

    /// Built-in rule tables merged with the configured extra file.
    pub fn load_registry(&self) -> Result<ProviderRegistry, ConfigError> {
        ProviderRegistry::load(self.rules_path())
    }

    /// Validated provider table.
    pub fn load_sources(&self, registry: &ProviderRegistry) -> Result<ProviderTable, ConfigError> {
        ProviderTable::load(&self.paths.sources, registry)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            precision: self.optimize.precision,
            prefix_ids: self.optimize.prefix_ids,
        }
    }
}

// ============================================================================
// tests
// ============================================================================
