//! Provider table (`sources.json`).
//!
//! Written by the discovery step as a flat JSON object:
//!
//! ```json
//! { "AWS": "https://d1.awsstatic.com/.../Asset-Package.zip", "GCP": "https://..." }
//! ```
//!
//! Key order is the provider processing order.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use url::Url;

use super::{ConfigDiagnostics, ConfigError};
use crate::provider::ProviderRegistry;

/// Archive file extension under the downloads directory.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// One provider to process and where its archive came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub id: String,
    pub url: Url,
}

impl SourceEntry {
    /// `<downloads>/<ProviderId>.zip`
    pub fn archive_path(&self, downloads: &Path) -> PathBuf {
        downloads.join(format!("{}.{ARCHIVE_EXTENSION}", self.id))
    }
}

/// Validated provider table, in file order.
#[derive(Debug, Clone, Default)]
pub struct ProviderTable {
    entries: Vec<SourceEntry>,
}

impl ProviderTable {
    /// Read and validate the table at `path`.
    pub fn load(path: &Path, registry: &ProviderRegistry) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let map: Map<String, Value> = serde_json::from_str(&content)
            .map_err(|err| ConfigError::Json(path.to_path_buf(), err))?;
        Self::from_map(map, registry)
    }

    /// Validate a parsed table, collecting every problem before failing.
    pub fn from_map(map: Map<String, Value>, registry: &ProviderRegistry) -> Result<Self, ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        if map.is_empty() {
            diag.error_with_hint(
                "sources",
                "provider table is empty",
                "run the discovery step to populate it",
            );
        }

        let mut entries = Vec::with_capacity(map.len());
        for (id, value) in map {
            let field = format!("sources.{id}");

            if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphabetic()) {
                diag.error(&field, "provider id must contain only ASCII letters");
            }
            if registry.get(&id).is_none() {
                let known: Vec<_> = registry.iter().map(|p| p.id.as_str()).collect();
                diag.error_with_hint(
                    &field,
                    "no naming rules for this provider",
                    format!("known providers: {}", known.join(", ")),
                );
            }

            let Some(raw) = value.as_str() else {
                diag.error(&field, format!("expected a URL string, found `{value}`"));
                continue;
            };
            match Url::parse(raw) {
                Ok(url) => entries.push(SourceEntry { id, url }),
                Err(err) => diag.error(&field, format!("invalid URL `{raw}`: {err}")),
            }
        }

        diag.into_result()?;
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
