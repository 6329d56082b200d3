//! Provider rule tables.
//!
//! A provider is pure data: an identity, the tokens that already name it,
//! an ordered list of naming rules and an entry filter. Onboarding a vendor
//! means adding a `[[provider]]` row, never a new code path.
//!
//! ```toml
//! [[provider]]
//! id = "GCP"
//! short = "gcp"            # default: lower-cased id
//! aliases = ["google"]     # tokens that suppress the short-id prefix
//! filter = { kind = "extension" }
//!
//! [[provider.rules]]
//! pattern = '_|-'
//! replacement = " "
//! ```
//!
//! | Module      | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `canonical` | Entry name -> canonical name                   |
//! | `namespace` | Canonical name -> unique output name           |

mod canonical;
mod namespace;

pub use canonical::{CanonicalName, canonicalize};
pub use namespace::OutputNamespace;

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;

use crate::archive::EntryFilter;
use crate::config::ConfigError;

/// Extension of the vector documents this pipeline handles.
pub const VECTOR_EXTENSION: &str = "svg";

/// Rule tables compiled into the binary.
const BUILTIN_RULES: &str = include_str!("builtin.toml");

/// One pattern -> replacement rewrite applied to an entry stem.
#[derive(Debug, Clone)]
pub struct NamingRule {
    pub pattern: Regex,
    pub replacement: String,
}

/// An icon vendor and the data needed to normalize its archive.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Identity as used in the provider table (e.g. "AWS").
    pub id: String,
    /// Disambiguating token, first tag of every catalog entry (e.g. "aws").
    pub short: String,
    /// Alternate spellings that already identify the provider in a name.
    pub aliases: Vec<String>,
    pub rules: Vec<NamingRule>,
    pub filter: EntryFilter,
}

impl Provider {
    /// Check whether a token sequence already names this provider.
    pub fn is_named_by<'a>(&self, tokens: impl IntoIterator<Item = &'a str>) -> bool {
        let id = self.id.to_lowercase();
        tokens.into_iter().any(|token| {
            token == id
                || token == self.short
                || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(token))
        })
    }

    /// Human-readable rendering of a name token.
    ///
    /// The provider token renders as the provider id (`aws` -> `AWS`),
    /// every other token is capitalised.
    pub fn display_token(&self, token: &str) -> String {
        if token == self.short {
            return self.id.clone();
        }
        let mut chars = token.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

// ============================================================================
// Rule file schema
// ============================================================================

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default, rename = "provider")]
    providers: Vec<ProviderSpec>,
}

#[derive(Debug, Deserialize)]
struct ProviderSpec {
    id: String,
    short: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    rules: Vec<RuleSpec>,
    #[serde(default)]
    filter: FilterSpec,
}

#[derive(Debug, Deserialize)]
struct RuleSpec {
    pattern: String,
    replacement: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum FilterSpec {
    #[default]
    Extension,
    Paths {
        patterns: Vec<String>,
    },
}

impl ProviderSpec {
    fn compile(self) -> Result<Provider, ConfigError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| ConfigError::Regex {
                provider: self.id.clone(),
                pattern: pattern.to_string(),
                source,
            })
        };

        let rules = self
            .rules
            .iter()
            .map(|rule| {
                Ok(NamingRule {
                    pattern: compile(&rule.pattern)?,
                    replacement: rule.replacement.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let filter = match &self.filter {
            FilterSpec::Extension => EntryFilter::Extension,
            FilterSpec::Paths { patterns } => EntryFilter::Paths(
                patterns
                    .iter()
                    .map(|p| compile(p))
                    .collect::<Result<_, _>>()?,
            ),
        };

        Ok(Provider {
            short: self
                .short
                .clone()
                .unwrap_or_else(|| self.id.to_lowercase()),
            aliases: self.aliases.iter().map(|a| a.to_lowercase()).collect(),
            id: self.id,
            rules,
            filter,
        })
    }
}

// ============================================================================
// ProviderRegistry
// ============================================================================

/// All known rule tables, loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<Provider>>,
}

impl ProviderRegistry {
    /// Registry holding only the built-in tables.
    pub fn builtin() -> Result<Self, ConfigError> {
        let mut registry = Self::default();
        registry.merge_str(BUILTIN_RULES, Path::new("<builtin>"))?;
        Ok(registry)
    }

    /// Built-in tables, extended or overridden by an optional rule file.
    pub fn load(extra: Option<&Path>) -> Result<Self, ConfigError> {
        let mut registry = Self::builtin()?;
        if let Some(path) = extra {
            let content = std::fs::read_to_string(path)
                .map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
            registry.merge_str(&content, path)?;
        }
        Ok(registry)
    }

    /// Parse a rule file and merge it; rows replace tables with the same id.
    fn merge_str(&mut self, content: &str, origin: &Path) -> Result<(), ConfigError> {
        let file: RuleFile = toml::from_str(content)
            .map_err(|err| ConfigError::Toml(origin.to_path_buf(), err))?;

        for spec in file.providers {
            let provider = Arc::new(spec.compile()?);
            match self.providers.iter_mut().find(|p| p.id == provider.id) {
                Some(slot) => *slot = provider,
                None => self.providers.push(provider),
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Provider>> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Provider>> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Built-in provider by id, for tests across the crate.
    pub(crate) fn builtin(id: &str) -> Arc<Provider> {
        ProviderRegistry::builtin().unwrap().get(id).unwrap().clone()
    }

    #[test]
    fn test_builtin_tables_load() {
        let registry = ProviderRegistry::builtin().unwrap();
        assert_eq!(registry.len(), 3);

        let aws = registry.get("AWS").unwrap();
        assert_eq!(aws.short, "aws");
        assert_eq!(aws.aliases, vec!["amazon".to_string()]);
        assert_eq!(aws.rules.len(), 2);
        assert_eq!(aws.filter.kind(), "paths");

        let gcp = registry.get("GCP").unwrap();
        assert_eq!(gcp.filter.kind(), "extension");
    }

    #[test]
    fn test_extra_file_overrides_and_extends() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(
            &path,
            r#"
[[provider]]
id = "GCP"
aliases = ["google", "cloud"]

[[provider]]
id = "Oracle"
filter = { kind = "extension" }

[[provider.rules]]
pattern = '_'
replacement = " "
"#,
        )
        .unwrap();

        let registry = ProviderRegistry::load(Some(&path)).unwrap();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get("GCP").unwrap().aliases.len(), 2);
        assert!(registry.get("GCP").unwrap().rules.is_empty());

        let oracle = registry.get("Oracle").unwrap();
        assert_eq!(oracle.short, "oracle");
        assert_eq!(oracle.rules.len(), 1);
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let mut registry = ProviderRegistry::default();
        let err = registry
            .merge_str(
                "[[provider]]\nid = \"Bad\"\n[[provider.rules]]\npattern = '('\nreplacement = ''\n",
                Path::new("bad.toml"),
            )
            .unwrap_err();
        assert!(matches!(err, ConfigError::Regex { .. }));
    }

    #[test]
    fn test_is_named_by() {
        let aws = builtin("AWS");
        assert!(aws.is_named_by(["amazon", "ec2"]));
        assert!(aws.is_named_by(["aws", "lambda"]));
        assert!(!aws.is_named_by(["simple", "storage"]));
    }

    #[test]
    fn test_display_token() {
        let aws = builtin("AWS");
        assert_eq!(aws.display_token("aws"), "AWS");
        assert_eq!(aws.display_token("lambda"), "Lambda");
        assert_eq!(aws.display_token(""), "");
    }
}
