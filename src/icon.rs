//! Icon documents flowing through the pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use crate::provider::{CanonicalName, Provider};

/// One normalized vector document.
///
/// Created by extraction with the raw markup, rewritten in place by the
/// transformer and optimizer, and persisted at `path` as its final state.
#[derive(Debug, Clone)]
pub struct IconDocument {
    pub provider: Arc<Provider>,
    /// Unique output file name within the provider's namespace.
    pub name: CanonicalName,
    pub path: PathBuf,
    pub markup: String,
}

impl IconDocument {
    /// Output file name without extension.
    pub fn stem(&self) -> &str {
        self.name.stem()
    }

    /// Human-readable label used as the document title.
    ///
    /// `aws-simple-storage-service` -> `AWS Simple Storage Service`
    pub fn label(&self) -> String {
        self.stem()
            .split('-')
            .filter(|token| !token.is_empty())
            .map(|token| self.provider.display_token(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
