//! Vector document normalization.
//!
//! Two passes run per icon, both over the same small arena tree:
//!
//! - [`transform`]: inline class styles, drop `data-*`, inject the title
//! - [`optimize`]: usvg round trip plus viewBox, title and id fix-ups

mod ast;
mod optimize;
mod style;
mod transform;

pub use optimize::{OptimizeOptions, optimize};
pub use transform::rewrite;

use thiserror::Error;

use crate::icon::IconDocument;

/// Separator between the icon stem and a document's own id.
pub const ID_SEPARATOR: &str = "__";

/// Per-document failure. The document is dropped, the run continues.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("malformed markup: {0}")]
    Xml(String),

    #[error("root element is <{0}>, expected <svg>")]
    NotSvg(String),

    #[error("invalid stylesheet: {0}")]
    Css(String),

    #[error("optimization failed: {0}")]
    Optimize(String),
}

/// Settings shared by every document of a run.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    pub precision: u8,
    pub prefix_ids: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            precision: 3,
            prefix_ids: true,
        }
    }
}

/// Rewrite then optimize one document in place.
///
/// On error the markup is left untouched.
pub fn normalize(icon: &mut IconDocument, options: NormalizeOptions) -> Result<(), TransformError> {
    let rewritten = rewrite(&icon.markup, &icon.label())?;
    let optimize_options = OptimizeOptions {
        precision: options.precision,
        id_prefix: options
            .prefix_ids
            .then(|| format!("{}{ID_SEPARATOR}", icon.stem())),
    };
    icon.markup = optimize(&rewritten, &optimize_options)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::CanonicalName;
    use crate::provider::tests::builtin;
    use std::path::PathBuf;

    fn icon(markup: &str) -> IconDocument {
        IconDocument {
            provider: builtin("Azure"),
            name: CanonicalName::from_stem("azure-storage-account"),
            path: PathBuf::from("svg/azure/azure-storage-account.svg"),
            markup: markup.to_string(),
        }
    }

    #[test]
    fn test_normalize_vendor_icon() {
        let mut doc = icon(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 18 18" data-slug-id="x"><defs><style>.cls-1{fill:#0078d4}</style></defs><title>old</title><path class="cls-1" d="M0 0h18v18H0z"/></svg>"#,
        );
        normalize(&mut doc, NormalizeOptions::default()).unwrap();

        let markup = &doc.markup;
        assert!(markup.contains("<title id=\"azure-storage-account__icon-name\">Azure Storage Account</title>"));
        assert!(markup.contains("aria-labelledby=\"azure-storage-account__icon-name\""));
        assert!(markup.contains("viewBox="));
        assert!(!markup.contains("class="));
        assert!(!markup.contains("data-"));
        assert!(!markup.contains(">old<"));
    }

    #[test]
    fn test_normalize_keeps_source_viewbox() {
        let mut doc = icon(
            r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 18 18" width="64" height="64"><path d="M1 1h16v16H1z" fill="#0078d4"/></svg>"##,
        );
        normalize(&mut doc, NormalizeOptions::default()).unwrap();
        assert!(doc.markup.contains("viewBox=\"0 0 18 18\""), "{}", doc.markup);
        assert!(!doc.markup.contains("transform="), "{}", doc.markup);
    }

    #[test]
    fn test_lettered_icon_fails() {
        let lettered = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 18 18"><text x="1" y="14">SQL</text></svg>"#;
        let mut doc = icon(lettered);
        assert!(matches!(
            normalize(&mut doc, NormalizeOptions::default()),
            Err(TransformError::Optimize(_))
        ));
        assert_eq!(doc.markup, lettered);
    }

    #[test]
    fn test_failed_normalize_keeps_markup() {
        let mut doc = icon("<svg><path></svg>");
        assert!(matches!(
            normalize(&mut doc, NormalizeOptions::default()),
            Err(TransformError::Xml(_))
        ));
        assert_eq!(doc.markup, "<svg><path></svg>");
    }

    #[test]
    fn test_ids_untouched_without_prefix() {
        let mut doc = icon(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 4 4"><rect width="4" height="4"/></svg>"#);
        let options = NormalizeOptions {
            prefix_ids: false,
            ..Default::default()
        };
        normalize(&mut doc, options).unwrap();
        assert!(doc.markup.contains("id=\"icon-name\""));
    }
}
