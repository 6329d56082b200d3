//! Pipeline run for the `build` command.
//!
//! Phases:
//! - **Setup** - provider output areas recreated, data directory created
//! - **Extract** - archives streamed per provider, names resolved
//! - **Normalize** - documents rewritten and optimized in parallel
//! - **Catalog** - `icons.json` and `index.json` written as a pair
//! - **Verdict** - pass only if every provider completed

use anyhow::{Result, bail};

use crate::cli::BuildArgs;
use crate::config::PipelineConfig;
use crate::logger::{self, verdict};
use crate::pipeline::{self, RunReport};
use crate::{debug, log};

/// Run the pipeline and print the verdict.
///
/// A failed provider fails the command after the catalog is written.
pub fn build_icons(config: &mut PipelineConfig, args: &BuildArgs) -> Result<RunReport> {
    logger::set_verbose(args.verbose);
    config.apply_build_args(args);
    config.validate()?;
    debug!("build"; "output {}", config.paths.output.display());
    debug!("build"; "data {}", config.paths.data.display());

    let report = match pipeline::run(config, args.jobs.map(usize::from)) {
        Ok(report) => report,
        Err(err) => {
            verdict(false, "run aborted");
            return Err(err.into());
        }
    };

    for failed in report.failed_providers() {
        log!("failed"; "{}: provider not published", failed.id);
    }
    verdict(report.passed(), &report.summary());

    if !report.passed() {
        bail!(
            "{} of {} providers failed",
            report.failed_providers().count(),
            report.providers.len()
        );
    }
    Ok(report)
}
