//! Catalog and search index emission.
//!
//! The catalog (`icons.json`) and the index (`index.json`) are a matched
//! pair: index record `i` refers to catalog item `i`. Both are built from
//! the same ordered document list in one call and written together.

mod index;

pub use index::SearchIndex;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::icon::IconDocument;

pub const CATALOG_FILE: &str = "icons.json";
pub const INDEX_FILE: &str = "index.json";

/// Published artifact references of one icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Links {
    pub svg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Output file stem, unique within its provider.
    pub filename: String,
    /// Provider short id first, then the name tokens, deduplicated.
    pub tags: Vec<String>,
    pub links: Links,
}

/// `{ sources: {providerId: shortId}, items: [...] }`
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    pub sources: Map<String, Value>,
    pub items: Vec<CatalogEntry>,
}

/// Derive search tags from an output stem.
///
/// `derive_tags("aws", "aws-lambda-lambda")` -> `["aws", "lambda"]`
pub fn derive_tags(short: &str, stem: &str) -> Vec<String> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    seen.insert(short);

    let mut tags = vec![short.to_string()];
    for token in stem.split('-').filter(|t| !t.is_empty()) {
        if seen.insert(token) {
            tags.push(token.to_string());
        }
    }
    tags
}

/// Build the catalog and its index from documents in provider order.
///
/// `sources` lists every provider that contributed (even with zero icons).
/// Link paths are `<link_base>/<short>/<stem>.svg`.
pub fn build<'a>(
    sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    documents: &[IconDocument],
    link_base: &str,
) -> (Catalog, SearchIndex) {
    let sources = sources
        .into_iter()
        .map(|(id, short)| (id.to_string(), Value::String(short.to_string())))
        .collect();

    let base = link_base.trim_end_matches('/');
    let items: Vec<CatalogEntry> = documents
        .iter()
        .map(|doc| {
            let short = doc.provider.short.as_str();
            let stem = doc.stem();
            let svg = if base.is_empty() {
                format!("{short}/{stem}.svg")
            } else {
                format!("{base}/{short}/{stem}.svg")
            };
            CatalogEntry {
                filename: stem.to_string(),
                tags: derive_tags(short, stem),
                links: Links { svg },
            }
        })
        .collect();

    let index = SearchIndex::build(&items);
    (Catalog { sources, items }, index)
}

/// Write `icons.json` and `index.json` into `data_dir`.
///
/// Returns the two written paths.
pub fn write(
    data_dir: &Path,
    catalog: &Catalog,
    index: &SearchIndex,
    pretty: bool,
) -> io::Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(data_dir)?;
    let catalog_path = data_dir.join(CATALOG_FILE);
    let index_path = data_dir.join(INDEX_FILE);
    fs::write(&catalog_path, to_json(catalog, pretty)?)?;
    fs::write(&index_path, to_json(index, pretty)?)?;
    Ok((catalog_path, index_path))
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> io::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::CanonicalName;
    use crate::provider::tests::builtin;
    use tempfile::TempDir;

    fn doc(provider: &str, stem: &str) -> IconDocument {
        IconDocument {
            provider: builtin(provider),
            name: CanonicalName::from_stem(stem),
            path: PathBuf::from(format!("{stem}.svg")),
            markup: String::new(),
        }
    }

    #[test]
    fn test_tags_start_with_short_id() {
        let tags = derive_tags("aws", "aws-simple-storage-service");
        assert_eq!(tags, ["aws", "simple", "storage", "service"]);
    }

    #[test]
    fn test_tags_deduplicated_in_order() {
        let tags = derive_tags("azure", "azure-sql-server-sql-azure-stretch");
        assert_eq!(tags, ["azure", "sql", "server", "stretch"]);
    }

    #[test]
    fn test_tags_prepend_short_for_alias_names() {
        let tags = derive_tags("aws", "amazon-simple-storage-service");
        assert_eq!(tags[0], "aws");
        assert_eq!(tags[1], "amazon");
    }

    #[test]
    fn test_build_keeps_document_order() {
        let docs = [
            doc("GCP", "gcp-storage"),
            doc("AWS", "amazon-ec2"),
            doc("GCP", "gcp-storage-alternate-1"),
        ];
        let (catalog, index) = build([("GCP", "gcp"), ("AWS", "aws")], &docs, "svg/");

        let names: Vec<_> = catalog.items.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, ["gcp-storage", "amazon-ec2", "gcp-storage-alternate-1"]);
        assert_eq!(catalog.items[1].links.svg, "svg/aws/amazon-ec2.svg");
        assert_eq!(index.records.len(), 3);
        for (i, record) in index.records.iter().enumerate() {
            assert_eq!(record.i, i);
            assert_eq!(record.fields.filename.v, catalog.items[i].filename);
        }

        let json = serde_json::to_value(&catalog).unwrap();
        let sources: Vec<_> = json["sources"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(sources, ["GCP", "AWS"]);
    }

    #[test]
    fn test_write_pair() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("www/src/data");
        let (catalog, index) = build([("GCP", "gcp")], &[doc("GCP", "gcp-pubsub")], "svg");

        let (catalog_path, index_path) = write(&data, &catalog, &index, true).unwrap();
        let written: Value = serde_json::from_str(&fs::read_to_string(catalog_path).unwrap()).unwrap();
        assert_eq!(written["items"][0]["filename"], "gcp-pubsub");
        assert_eq!(written["items"][0]["tags"], serde_json::json!(["gcp", "pubsub"]));
        assert_eq!(written["items"][0]["links"]["svg"], "svg/gcp/gcp-pubsub.svg");
        assert!(fs::read_to_string(index_path).unwrap().contains("\"records\""));
    }
}
