//! Run outcomes.
//!
//! Every unit of work returns an outcome instead of skipping ahead; these
//! types fold them into per-stage counts, per-provider reports and finally
//! the run verdict.

use std::fmt;

use crate::utils::plural_count;

/// Counters of one stage for one provider.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageCounts {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl StageCounts {
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }
}

impl std::ops::AddAssign for StageCounts {
    fn add_assign(&mut self, other: Self) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

impl fmt::Display for StageCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {} / skipped {} / failed {}",
            self.processed, self.skipped, self.failed
        )
    }
}

/// Terminal state of one provider branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Completed,
    /// Archive could not be opened or read; nothing was published.
    Failed(String),
}

/// Outcome of one provider branch.
#[derive(Debug, Clone)]
pub struct ProviderReport {
    pub id: String,
    pub extract: StageCounts,
    pub transform: StageCounts,
    pub status: ProviderStatus,
}

impl ProviderReport {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            extract: StageCounts::default(),
            transform: StageCounts::default(),
            status: ProviderStatus::Completed,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProviderStatus::Completed
    }
}

/// Aggregate of every provider branch plus the catalog stage.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub providers: Vec<ProviderReport>,
    /// Number of catalog items written (0 when nothing was emitted).
    pub cataloged: usize,
}

impl RunReport {
    /// A run passes only when every provider completed.
    pub fn passed(&self) -> bool {
        self.providers.iter().all(ProviderReport::is_completed)
    }

    pub fn failed_providers(&self) -> impl Iterator<Item = &ProviderReport> {
        self.providers.iter().filter(|p| !p.is_completed())
    }

    /// One-line verdict detail, e.g. `2 of 3 providers, 512 icons`.
    pub fn summary(&self) -> String {
        let completed = self.providers.iter().filter(|p| p.is_completed()).count();
        format!(
            "{} of {}, {}",
            completed,
            plural_count(self.providers.len(), "provider"),
            plural_count(self.cataloged, "icon")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_counts_display_and_sum() {
        let mut counts = StageCounts {
            processed: 3,
            skipped: 1,
            failed: 0,
        };
        counts += StageCounts {
            processed: 1,
            skipped: 0,
            failed: 2,
        };
        assert_eq!(counts.total(), 7);
        assert_eq!(counts.to_string(), "processed 4 / skipped 1 / failed 2");
    }

    #[test]
    fn test_run_verdict() {
        let mut report = RunReport::default();
        report.providers.push(ProviderReport::new("AWS"));
        report.cataloged = 1;
        assert!(report.passed());
        assert_eq!(report.summary(), "1 of 1 provider, 1 icon");

        let mut failed = ProviderReport::new("GCP");
        failed.status = ProviderStatus::Failed("invalid archive".into());
        report.providers.push(failed);
        assert!(!report.passed());
        assert_eq!(report.failed_providers().count(), 1);
        assert_eq!(report.summary(), "1 of 2 providers, 1 icon");
    }

    #[test]
    fn test_empty_run_passes() {
        assert!(RunReport::default().passed());
    }
}
