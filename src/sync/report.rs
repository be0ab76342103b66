use std::{fmt, time::Duration};

use tabled::Table;

use crate::types::{BatchTableRow, ReportTableRow, TrackId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Committed,
    Failed(String),
    /// Not sent because the run was a dry run.
    DryRun,
}

/// What happened to one batch of the like phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// 0-based position of the batch.
    pub index: usize,
    pub ids: Vec<TrackId>,
    pub status: BatchStatus,
}

impl BatchOutcome {
    pub fn is_committed(&self) -> bool {
        self.status == BatchStatus::Committed
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, BatchStatus::Failed(_))
    }
}

/// Summary of one run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub albums_scanned: usize,
    /// Album tracks left after removing skiplisted ones.
    pub candidate_tracks: usize,
    pub skipped: usize,
    pub already_liked: usize,
    pub batches: Vec<BatchOutcome>,
    pub dry_run: bool,
    pub elapsed: Duration,
}

impl RunReport {
    /// Tracks in committed batches only.
    pub fn newly_liked(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.is_committed())
            .map(|b| b.ids.len())
            .sum()
    }

    /// Tracks that would have been liked; only non-zero for dry runs.
    pub fn would_like(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.status == BatchStatus::DryRun)
            .map(|b| b.ids.len())
            .sum()
    }

    pub fn failed_tracks(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.is_failed())
            .map(|b| b.ids.len())
            .sum()
    }

    pub fn failed_batches(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.batches.iter().filter(|b| b.is_failed())
    }

    /// Whether the process should exit non-zero: there was something to like and
    /// every batch failed.
    pub fn all_batches_failed(&self) -> bool {
        !self.batches.is_empty() && self.batches.iter().all(BatchOutcome::is_failed)
    }

    fn summary_rows(&self) -> Vec<ReportTableRow> {
        let liked_label = if self.dry_run {
            ("would like", self.would_like())
        } else {
            ("newly liked", self.newly_liked())
        };

        let mut rows = vec![
            ReportTableRow {
                metric: "albums scanned".to_string(),
                count: self.albums_scanned,
            },
            ReportTableRow {
                metric: "candidate tracks".to_string(),
                count: self.candidate_tracks,
            },
            ReportTableRow {
                metric: liked_label.0.to_string(),
                count: liked_label.1,
            },
            ReportTableRow {
                metric: "skipped (skiplist)".to_string(),
                count: self.skipped,
            },
            ReportTableRow {
                metric: "already liked".to_string(),
                count: self.already_liked,
            },
        ];

        if self.failed_tracks() > 0 {
            rows.push(ReportTableRow {
                metric: "failed to like".to_string(),
                count: self.failed_tracks(),
            });
        }
        rows
    }

    fn batch_rows(&self) -> Vec<BatchTableRow> {
        self.batches
            .iter()
            .map(|b| BatchTableRow {
                batch: b.index + 1,
                tracks: b.ids.len(),
                status: match &b.status {
                    BatchStatus::Committed => "committed".to_string(),
                    BatchStatus::Failed(reason) => format!("failed: {reason}"),
                    BatchStatus::DryRun => "dry run".to_string(),
                },
            })
            .collect()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", Table::new(self.summary_rows()))?;
        if !self.batches.is_empty() {
            writeln!(f, "{}", Table::new(self.batch_rows()))?;
        }
        Ok(())
    }
}
