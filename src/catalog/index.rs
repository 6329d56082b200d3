//! Prebuilt fuzzy-search index.
//!
//! Serializes to the exact shape Fuse.js produces with
//! `Fuse.createIndex(["filename", "tags"], items).toJSON()`, so the front end
//! loads it with `Fuse.parseIndex` and never re-indexes at query time.

use serde::{Serialize, Serializer};

use super::CatalogEntry;

/// Decimal places Fuse keeps for field-length norms.
const NORM_MANTISSA: i32 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct SearchIndex {
    pub keys: Vec<IndexKey>,
    pub records: Vec<IndexRecord>,
}

/// One indexed field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexKey {
    pub path: Vec<String>,
    pub id: String,
    pub weight: u32,
    pub src: String,
    /// Always `null`: custom getters do not survive serialization.
    pub get_fn: Option<()>,
}

impl IndexKey {
    fn new(name: &str) -> Self {
        Self {
            path: vec![name.to_string()],
            id: name.to_string(),
            weight: 1,
            src: name.to_string(),
            get_fn: None,
        }
    }
}

/// Indexed values of one catalog item.
#[derive(Debug, Clone, Serialize)]
pub struct IndexRecord {
    /// Position of the item in the catalog.
    pub i: usize,
    #[serde(rename = "$")]
    pub fields: IndexFields,
}

/// Values per key, keyed by key position.
#[derive(Debug, Clone, Serialize)]
pub struct IndexFields {
    #[serde(rename = "0")]
    pub filename: IndexValue,
    #[serde(rename = "1")]
    pub tags: Vec<IndexValue>,
}

/// One indexed string and its field-length norm.
#[derive(Debug, Clone, Serialize)]
pub struct IndexValue {
    pub v: String,
    /// Position within an array field; absent for plain string fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i: Option<usize>,
    #[serde(serialize_with = "serialize_norm")]
    pub n: f64,
}

impl SearchIndex {
    /// Index the `filename` and `tags` fields of catalog items, in order.
    pub fn build(items: &[CatalogEntry]) -> Self {
        let records = items
            .iter()
            .enumerate()
            .map(|(i, item)| IndexRecord {
                i,
                fields: IndexFields {
                    filename: IndexValue {
                        v: item.filename.clone(),
                        i: None,
                        n: norm(&item.filename),
                    },
                    tags: index_array(&item.tags),
                },
            })
            .collect();

        Self {
            keys: vec![IndexKey::new("filename"), IndexKey::new("tags")],
            records,
        }
    }
}

/// Array values are collected the way Fuse walks them: off a stack, so the
/// last element comes first. Blank strings are not indexed.
fn index_array(values: &[String]) -> Vec<IndexValue> {
    values
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(i, value)| IndexValue {
            v: value.clone(),
            i: Some(i),
            n: norm(value),
        })
        .collect()
}

/// Field-length norm: `1 / sqrt(token count)`, rounded.
pub fn norm(value: &str) -> f64 {
    let tokens = value.split(' ').filter(|t| !t.is_empty()).count().max(1);
    let scale = 10f64.powi(NORM_MANTISSA);
    (scale / (tokens as f64).sqrt()).round() / scale
}

/// Whole norms are written as integers, like a JavaScript number.
fn serialize_norm<S: Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if n.fract() == 0.0 {
        serializer.serialize_u64(*n as u64)
    } else {
        serializer.serialize_f64(*n)
    }
}
