//! Entry name canonicalization.
//!
//! Turns a raw archive entry path into a lowercase, hyphen-joined name:
//!
//! ```text
//! Architecture-Service-Icons_07312025/Arch_Storage/32/Arch_Amazon-Simple-Storage-Service_32.svg
//!   -> amazon-simple-storage-service.svg
//! icons/Storage_Account.svg (GCP)
//!   -> gcp-storage-account.svg
//! ```
//!
//! Canonicalization is total: an entry no rule matches passes through
//! unchanged apart from case, whitespace and the provider prefix.

use std::fmt;

use super::{Provider, VECTOR_EXTENSION};

/// Normalized name of one entry under one provider. Not yet unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalName(String);

impl CanonicalName {
    /// Build from a stem, appending the vector extension.
    pub fn from_stem(stem: &str) -> Self {
        Self(format!("{stem}.{VECTOR_EXTENSION}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name without the extension.
    pub fn stem(&self) -> &str {
        self.0
            .strip_suffix(VECTOR_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalize a raw entry name under a provider's naming rules.
pub fn canonicalize(provider: &Provider, raw_entry_name: &str) -> CanonicalName {
    let file_name = raw_entry_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(raw_entry_name);

    let mut name = strip_vector_extension(file_name).to_lowercase();
    for rule in &provider.rules {
        name = rule
            .pattern
            .replace_all(&name, rule.replacement.as_str())
            .into_owned();
    }

    let mut tokens: Vec<&str> = name
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|token| !token.is_empty())
        .collect();

    if !provider.is_named_by(tokens.iter().copied()) {
        tokens.insert(0, &provider.short);
    }

    CanonicalName::from_stem(&tokens.join("-"))
}

/// Strip a trailing `.svg` (any case).
fn strip_vector_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case(VECTOR_EXTENSION) => stem,
        _ => file_name,
    }
}
