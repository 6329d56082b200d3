//! Entry inclusion filters.
//!
//! Some vendors ship icon-only archives, others mix icons with PNG renders,
//! light/dark variants and several sizes of the same service icon. A filter
//! decides from the entry path alone whether an entry is worth extracting,
//! before any name is derived from it.

use regex::Regex;

/// Folder names that never contain real entries (archive tool metadata).
pub const JUNK_FOLDERS: &[&str] = &["__MACOSX"];

/// Path-shape predicate applied to every archive entry of one provider.
#[derive(Debug, Clone)]
pub enum EntryFilter {
    /// Accept every entry ending in the vector extension.
    Extension,
    /// Accept entries matching any of the patterns (searched, not anchored).
    Paths(Vec<Regex>),
}

impl EntryFilter {
    /// Check whether an entry path should be extracted.
    ///
    /// Junk folders are rejected regardless of the provider filter.
    pub fn accepts(&self, entry_path: &str) -> bool {
        if is_junk(entry_path) {
            return false;
        }
        match self {
            Self::Extension => has_vector_extension(entry_path),
            Self::Paths(patterns) => patterns.iter().any(|p| p.is_match(entry_path)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Extension => "extension",
            Self::Paths(_) => "paths",
        }
    }
}

/// Check if any path component is a junk folder.
pub fn is_junk(entry_path: &str) -> bool {
    entry_path
        .split(['/', '\\'])
        .any(|component| JUNK_FOLDERS.contains(&component))
}

#[inline]
fn has_vector_extension(entry_path: &str) -> bool {
    let ext = crate::provider::VECTOR_EXTENSION;
    entry_path.len() > ext.len()
        && entry_path
            .rsplit_once('.')
            .is_some_and(|(_, found)| found.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_filter() {
        let filter = EntryFilter::Extension;
        assert!(filter.accepts("icons/Compute/Virtual-Machine.svg"));
        assert!(filter.accepts("Storage.SVG"));
        assert!(!filter.accepts("icons/Compute/Virtual-Machine.png"));
        assert!(!filter.accepts("README"));
    }

    #[test]
    fn test_junk_folder_always_rejected() {
        let filter = EntryFilter::Extension;
        assert!(!filter.accepts("__MACOSX/icons/._Storage.svg"));
        assert!(is_junk("pack\\__MACOSX\\a.svg"));
        assert!(!is_junk("pack/MACOSX/a.svg"));
    }

    #[test]
    fn test_path_filter_fixed_depth() {
        let filter = EntryFilter::Paths(vec![
            Regex::new(r"Architecture-Service-Icons_\d+[\\/][\w-]+[\\/]32[\\/][\w-]+\.svg$").unwrap(),
        ]);
        assert!(filter.accepts(
            "Architecture-Service-Icons_07312025/Arch_Storage/32/Arch_Amazon-Simple-Storage-Service_32.svg"
        ));
        // wrong size folder
        assert!(!filter.accepts(
            "Architecture-Service-Icons_07312025/Arch_Storage/64/Arch_Amazon-Simple-Storage-Service_64.svg"
        ));
        // right shape, wrong extension
        assert!(!filter.accepts(
            "Architecture-Service-Icons_07312025/Arch_Storage/32/Arch_Amazon-Simple-Storage-Service_32.png"
        ));
    }
}
