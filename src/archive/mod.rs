//! Provider archive extraction.
//!
//! Entries are streamed out of the zip container one at a time; only the
//! central directory is held in memory. Every accepted entry is named through
//! the provider's rule table and the provider's [`OutputNamespace`], then
//! written as a raw document under the provider's output area.
//!
//! Failure scopes:
//!
//! | Error               | Scope                                   |
//! |---------------------|-----------------------------------------|
//! | [`EntryError`]      | entry skipped, counted as failed        |
//! | [`ArchiveError::Open`], [`ArchiveError::Zip`] | provider abandoned |
//! | [`ArchiveError::Write`] | run aborted                        |

mod filter;

pub use filter::EntryFilter;

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::icon::IconDocument;
use crate::pipeline::StageCounts;
use crate::provider::{OutputNamespace, Provider, canonicalize};
use crate::{debug, log};

/// Largest buffer reserved up front from an entry's declared size.
const MAX_PREALLOC: u64 = 1 << 20;

/// Error for a whole archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot open archive {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("invalid archive {}: {source}", .path.display())]
    Zip { path: PathBuf, source: ZipError },

    #[error("cannot write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

impl ArchiveError {
    /// Write failures are environment failures, not provider failures.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}

/// Error for a single archive entry.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("corrupt entry #{index}: {source}")]
    Corrupt { index: usize, source: ZipError },

    #[error("cannot read {entry}: {source}")]
    Read { entry: String, source: io::Error },

    #[error("{entry} is not valid UTF-8")]
    NotUtf8 { entry: String },
}

/// Documents extracted from one archive, in archive order.
#[derive(Debug, Default)]
pub struct Extraction {
    pub documents: Vec<IconDocument>,
    pub counts: StageCounts,
}

/// Extract every accepted entry of `archive_path` into `out_dir`.
///
/// `out_dir` must exist. The namespace is created here and dropped with the
/// extraction, so the caller owns exactly one resolver per provider run.
pub fn extract(
    archive_path: &Path,
    provider: &Arc<Provider>,
    out_dir: &Path,
) -> Result<Extraction, ArchiveError> {
    let file = File::open(archive_path).map_err(|source| ArchiveError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|source| ArchiveError::Zip {
            path: archive_path.to_path_buf(),
            source,
        })?;

    let mut namespace = OutputNamespace::new();
    let mut extraction = Extraction::default();

    for index in 0..archive.len() {
        let (entry, markup) = match read_entry(&mut archive, index, &provider.filter) {
            Ok(Some(read)) => read,
            Ok(None) => {
                extraction.counts.skipped += 1;
                continue;
            }
            Err(err) => {
                log!("skip"; "{}: {}", provider.id, err);
                extraction.counts.failed += 1;
                continue;
            }
        };

        let canonical = canonicalize(provider, &entry);
        let name = namespace.resolve(&canonical);
        debug!("extract"; "{} -> {}", entry, name);

        let path = out_dir.join(name.as_str());
        fs::write(&path, &markup).map_err(|source| ArchiveError::Write {
            path: path.clone(),
            source,
        })?;

        extraction.documents.push(IconDocument {
            provider: Arc::clone(provider),
            name,
            path,
            markup,
        });
        extraction.counts.processed += 1;
    }

    Ok(extraction)
}

/// Read one entry if the filter accepts it.
///
/// `Ok(None)` means the entry was filtered out (directory, junk, wrong shape).
fn read_entry<R: Read + io::Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    filter: &EntryFilter,
) -> Result<Option<(String, String)>, EntryError> {
    let mut file = archive
        .by_index(index)
        .map_err(|source| EntryError::Corrupt { index, source })?;

    if file.is_dir() || !filter.accepts(file.name()) {
        return Ok(None);
    }

    let entry = file.name().to_string();
    let mut bytes = Vec::with_capacity(capacity_hint(file.size()));
    file.read_to_end(&mut bytes)
        .map_err(|source| EntryError::Read {
            entry: entry.clone(),
            source,
        })?;
    let markup = String::from_utf8(bytes).map_err(|_| EntryError::NotUtf8 {
        entry: entry.clone(),
    })?;
    Ok(Some((entry, markup)))
}

/// Declared sizes come from the archive and are not trusted.
fn capacity_hint(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::provider::tests::builtin;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    pub(crate) const ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path d="M0 0h16v16H0z"/></svg>"#;

    /// Build a zip archive with the given (name, content) entries.
    ///
    /// Names ending in `/` become directory entries.
    pub(crate) fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(content).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_extract_resolves_collisions() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("GCP.zip");
        write_archive(
            &archive,
            &[
                ("icons/", b""),
                ("icons/Storage_Account.svg", ICON.as_bytes()),
                ("icons/Storage-Account.svg", ICON.as_bytes()),
                ("icons/BigQuery.svg", ICON.as_bytes()),
                ("icons/readme.txt", b"not an icon"),
                ("__MACOSX/icons/._BigQuery.svg", b"\x00\x05\x16\x07"),
            ],
        );
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();

        let extraction = extract(&archive, &builtin("GCP"), &out).unwrap();
        let names: Vec<_> = extraction
            .documents
            .iter()
            .map(|doc| doc.name.as_str())
            .collect();
        assert_eq!(
            names,
            [
                "gcp-storage-account.svg",
                "gcp-storage-account-alternate-1.svg",
                "gcp-bigquery.svg",
            ]
        );
        assert_eq!(
            extraction.counts,
            StageCounts {
                processed: 3,
                skipped: 3,
                failed: 0,
            }
        );
        for doc in &extraction.documents {
            assert_eq!(fs::read_to_string(&doc.path).unwrap(), ICON);
        }
    }

    #[test]
    fn test_path_filter_applies_before_naming() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("AWS.zip");
        write_archive(
            &archive,
            &[
                (
                    "Architecture-Service-Icons_01312023/Arch_Storage/32/Arch_Amazon-Simple-Storage-Service_32.svg",
                    ICON.as_bytes(),
                ),
                (
                    "Architecture-Service-Icons_01312023/Arch_Storage/64/Arch_Amazon-Simple-Storage-Service_64.svg",
                    ICON.as_bytes(),
                ),
                (
                    "Architecture-Service-Icons_01312023/Arch_Storage/32/Arch_Amazon-Simple-Storage-Service_32.png",
                    b"png",
                ),
            ],
        );

        let extraction = extract(&archive, &builtin("AWS"), dir.path()).unwrap();
        assert_eq!(extraction.documents.len(), 1);
        assert_eq!(
            extraction.documents[0].name.as_str(),
            "amazon-simple-storage-service.svg"
        );
        assert_eq!(extraction.counts.skipped, 2);
    }

    #[test]
    fn test_non_utf8_entry_skipped() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("GCP.zip");
        write_archive(
            &archive,
            &[
                ("Broken.svg", &[0xff, 0xfe, 0x00]),
                ("Compute.svg", ICON.as_bytes()),
            ],
        );

        let extraction = extract(&archive, &builtin("GCP"), dir.path()).unwrap();
        assert_eq!(extraction.documents.len(), 1);
        assert_eq!(extraction.counts.failed, 1);
        assert!(!dir.path().join("gcp-broken.svg").exists());
    }

    #[test]
    fn test_capacity_hint_capped() {
        assert_eq!(capacity_hint(0), 0);
        assert_eq!(capacity_hint(4096), 4096);
        assert_eq!(capacity_hint(u64::MAX), MAX_PREALLOC as usize);
    }

    #[test]
    fn test_invalid_container_is_archive_error() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("Azure.zip");
        fs::write(&archive, b"definitely not a zip").unwrap();

        let err = extract(&archive, &builtin("Azure"), dir.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::Zip { .. }));
        assert!(!err.is_write());
    }

    #[test]
    fn test_missing_archive_is_open_error() {
        let dir = TempDir::new().unwrap();
        let err = extract(&dir.path().join("none.zip"), &builtin("Azure"), dir.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::Open { .. }));
    }

    #[test]
    fn test_unwritable_output_is_write_error() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("GCP.zip");
        write_archive(&archive, &[("Compute.svg", ICON.as_bytes())]);

        let err = extract(&archive, &builtin("GCP"), &dir.path().join("missing")).unwrap_err();
        assert!(err.is_write());
    }
}
