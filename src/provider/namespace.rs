//! Output name collision resolution.
//!
//! One namespace per provider run. It is the only place output names are
//! assigned: a canonical name is returned as-is the first time it is seen,
//! later occurrences get `-alternate-<n>` appended to the stem.
//!
//! The check-then-mark sequence takes `&mut self`, so a namespace can only
//! be driven by its single owner (the provider's extraction loop).

use rustc_hash::FxHashSet;

use super::CanonicalName;

/// Suffix token inserted before the counter on collision.
const ALTERNATE: &str = "alternate";

/// Set of output names already handed out within one provider.
#[derive(Debug, Default)]
pub struct OutputNamespace {
    /// Lower-cased, so uniqueness holds case-insensitively.
    used: FxHashSet<String>,
}

impl OutputNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a unique output name for a canonical name and mark it used.
    pub fn resolve(&mut self, name: &CanonicalName) -> CanonicalName {
        if self.used.insert(name.as_str().to_lowercase()) {
            return name.clone();
        }

        let stem = name.stem();
        let mut counter = 1usize;
        loop {
            let candidate = CanonicalName::from_stem(&format!("{stem}-{ALTERNATE}-{counter}"));
            if self.used.insert(candidate.as_str().to_lowercase()) {
                return candidate;
            }
            counter += 1;
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }
}
