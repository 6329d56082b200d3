//! Normalization pipeline driver.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ setup: <output>/<short>/ recreated, data dir created      │
//! └──────────────────────────────────────────────────────────┘
//!        │ one branch per provider (rayon, order kept)
//!        ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │ extract (sequential, owns the namespace)                  │
//! │   -> normalize (par_iter per document) -> persist         │
//! └──────────────────────────────────────────────────────────┘
//!        │ fold outcomes in provider order
//!        ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │ catalog + index (icons.json, index.json)                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Entry and document failures are counted and logged inside a branch.
//! An archive failure ends its branch only. Write failures abort the run.

mod error;
mod report;

pub use error::PipelineError;
pub use report::{ProviderReport, ProviderStatus, RunReport, StageCounts};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::archive;
use crate::catalog;
use crate::config::{ConfigDiagnostics, PipelineConfig, SourceEntry};
use crate::icon::IconDocument;
use crate::provider::{Provider, ProviderRegistry};
use crate::svg::{self, NormalizeOptions};
use crate::utils::plural_count;
use crate::{debug, log};

/// One provider's unit of work.
#[derive(Debug, Clone)]
struct Branch {
    source: SourceEntry,
    provider: Arc<Provider>,
    archive: PathBuf,
    out_dir: PathBuf,
}

/// What a branch hands back to the driver.
#[derive(Debug)]
struct BranchOutcome {
    report: ProviderReport,
    documents: Vec<IconDocument>,
}

/// Run the whole pipeline.
///
/// `jobs` caps the worker pool; `None` uses the global rayon pool.
/// Returns `Err` only for run-scoped failures; a failed provider shows up
/// in the report.
pub fn run(config: &PipelineConfig, jobs: Option<usize>) -> Result<RunReport, PipelineError> {
    let registry = config.load_registry()?;
    let sources = config.load_sources(&registry)?;
    let branches = plan(config, &registry, sources.entries())?;

    setup_output(config, &branches)?;

    let options = config.normalize_options();
    let outcomes: Vec<Result<BranchOutcome, PipelineError>> = match jobs {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
            pool.install(|| run_branches(&branches, options))
        }
        None => run_branches(&branches, options),
    };

    let mut report = RunReport::default();
    let mut documents = Vec::new();
    let mut sources = Vec::new();
    for (branch, outcome) in branches.iter().zip(outcomes) {
        let outcome = outcome?;
        if outcome.report.is_completed() {
            sources.push((branch.provider.id.as_str(), branch.provider.short.as_str()));
        }
        documents.extend(outcome.documents);
        report.providers.push(outcome.report);
    }

    let (catalog, index) = catalog::build(sources, &documents, &config.catalog.link_base);
    let (catalog_path, _) = catalog::write(&config.paths.data, &catalog, &index, config.catalog.pretty)
        .map_err(|err| PipelineError::write(&config.paths.data, err))?;
    report.cataloged = catalog.items.len();
    log!("catalog"; "{} written to {}", plural_count(report.cataloged, "icon"), catalog_path.display());

    Ok(report)
}

fn run_branches(
    branches: &[Branch],
    options: NormalizeOptions,
) -> Vec<Result<BranchOutcome, PipelineError>> {
    branches
        .par_iter()
        .map(|branch| run_branch(branch, options))
        .collect()
}

/// Pair every table entry with its rule table and paths.
///
/// Entries are already checked against the registry; here every provider
/// must also own a distinct output area.
fn plan(
    config: &PipelineConfig,
    registry: &ProviderRegistry,
    entries: &[SourceEntry],
) -> Result<Vec<Branch>, PipelineError> {
    let mut diag = ConfigDiagnostics::new();
    let mut claimed: FxHashMap<&str, &str> = FxHashMap::default();
    let mut branches = Vec::with_capacity(entries.len());
    for (source, provider) in entries
        .iter()
        .filter_map(|source| registry.get(&source.id).map(|provider| (source, provider)))
    {
        if let Some(owner) = claimed.insert(provider.short.as_str(), provider.id.as_str()) {
            diag.error_with_hint(
                format!("sources.{}", source.id),
                format!("short id `{}` is already used by {}", provider.short, owner),
                "give one of the rule tables a distinct `short`",
            );
            continue;
        }
        branches.push(Branch {
            archive: source.archive_path(&config.paths.downloads),
            out_dir: config.paths.output.join(&provider.short),
            provider: Arc::clone(provider),
            source: source.clone(),
        });
    }
    diag.into_result()?;
    Ok(branches)
}

/// Recreate every provider output area and the data directory.
fn setup_output(config: &PipelineConfig, branches: &[Branch]) -> Result<(), PipelineError> {
    for branch in branches {
        recreate_dir(&branch.out_dir).map_err(|source| PipelineError::Setup {
            path: branch.out_dir.clone(),
            source,
        })?;
    }
    fs::create_dir_all(&config.paths.data).map_err(|source| PipelineError::Setup {
        path: config.paths.data.clone(),
        source,
    })
}

fn recreate_dir(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    fs::create_dir_all(dir)
}

// ============================================================================
// Provider branch
// ============================================================================

fn run_branch(branch: &Branch, options: NormalizeOptions) -> Result<BranchOutcome, PipelineError> {
    let id = branch.provider.id.as_str();
    let mut report = ProviderReport::new(id);
    debug!("extract"; "{}: {} from {}", id, branch.archive.display(), branch.source.url);

    let extraction = match archive::extract(&branch.archive, &branch.provider, &branch.out_dir) {
        Ok(extraction) => extraction,
        Err(archive::ArchiveError::Write { path, source }) => {
            return Err(PipelineError::Write { path, source });
        }
        Err(err) => {
            log!("error"; "{}: {}", id, err);
            report.status = ProviderStatus::Failed(err.to_string());
            return Ok(BranchOutcome {
                report,
                documents: Vec::new(),
            });
        }
    };
    report.extract = extraction.counts;
    log!("extract"; "{}: {}", id, report.extract);

    let (documents, counts) = normalize_all(extraction.documents, options)?;
    report.transform = counts;
    log!("transform"; "{}: {}", id, report.transform);

    Ok(BranchOutcome { report, documents })
}

/// Normalize documents in parallel, persist survivors, drop failures.
///
/// Extraction order is kept. A failed document's raw file is removed so
/// the output area only holds cataloged icons.
fn normalize_all(
    documents: Vec<IconDocument>,
    options: NormalizeOptions,
) -> Result<(Vec<IconDocument>, StageCounts), PipelineError> {
    let results: Vec<_> = documents
        .into_par_iter()
        .map(|mut doc| match svg::normalize(&mut doc, options) {
            Ok(()) => Ok(doc),
            Err(err) => Err((doc, err)),
        })
        .collect();

    let mut counts = StageCounts::default();
    let mut kept = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(doc) => {
                fs::write(&doc.path, &doc.markup)
                    .map_err(|err| PipelineError::write(&doc.path, err))?;
                counts.processed += 1;
                kept.push(doc);
            }
            Err((doc, err)) => {
                log!("failed"; "{}: {}", doc.name, err);
                match fs::remove_file(&doc.path) {
                    Ok(()) => {}
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => return Err(PipelineError::write(&doc.path, err)),
                }
                counts.failed += 1;
            }
        }
    }
    Ok((kept, counts))
}
