//! Batch donor search.
//!
//! A blocking producer drains the donor source into a bounded channel while a
//! fixed set of worker tasks filter, expand, match and score donors. Each
//! donor is evaluated independently, so results arrive in no particular order
//! until [`SearchOutcome::ranked`] sorts them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::core::donor::{DonorId, DonorRecord};
use crate::core::phenotype::RawPhenotype;
use crate::matching::criteria::{DonorFilter, MatchCriteria};
use crate::matching::engine::{DonorEvaluation, MatchingEngine};
use crate::matching::expansion::{ExpandedPhenotype, ExpansionError, PhenotypeExpander};
use crate::search::source::{DonorSource, DonorSourceError};

/// Default channel depth between the donor producer and the workers
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Patient phenotype cannot be expanded: {0}")]
    Patient(#[from] ExpansionError),

    #[error("Donor source failed: {0}")]
    Source(#[from] DonorSourceError),

    #[error("Search task failed: {0}")]
    Task(String),
}

/// Tuning for a batch search
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of concurrent donor workers
    pub workers: usize,
    /// Donors buffered between the source and the workers
    pub queue_capacity: usize,
    /// Keep evaluations of rejected donors in the outcome
    pub include_rejected: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            include_rejected: false,
        }
    }
}

/// Cooperative cancellation shared between a search and its caller.
///
/// Checked between donors; a donor already being evaluated finishes.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A donor whose typings could not be expanded
#[derive(Debug, Clone, Serialize)]
pub struct DonorFailure {
    pub donor_id: DonorId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchOutcome {
    /// Accepted donors, plus rejected ones when configured
    pub results: Vec<DonorEvaluation>,
    /// Donors received from the source
    pub donors_considered: usize,
    /// Donors refused by the eligibility filter
    pub filtered_count: usize,
    /// Donors rejected by the mismatch ceilings
    pub rejected_count: usize,
    pub failures: Vec<DonorFailure>,
    pub cancelled: bool,
}

impl SearchOutcome {
    /// Sort results best first
    #[must_use]
    pub fn ranked(mut self) -> Self {
        self.results.sort_by(DonorEvaluation::cmp_rank);
        self
    }

    pub fn accepted_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_accepted()).count()
    }

    fn merge(&mut self, other: SearchOutcome) {
        self.results.extend(other.results);
        self.donors_considered += other.donors_considered;
        self.filtered_count += other.filtered_count;
        self.rejected_count += other.rejected_count;
        self.failures.extend(other.failures);
    }
}

/// Everything a worker needs, shared read-only across workers
struct SearchContext {
    expander: PhenotypeExpander,
    patient: ExpandedPhenotype,
    criteria: Arc<MatchCriteria>,
    filter: DonorFilter,
    include_rejected: bool,
}

impl SearchContext {
    fn process(&self, donor: &DonorRecord, tally: &mut SearchOutcome) {
        tally.donors_considered += 1;
        if !self.filter.admits(donor) {
            tally.filtered_count += 1;
            return;
        }

        let candidate = match self.expander.expand_donor(donor) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("Skipping donor {}: {}", donor.id, e);
                tally.failures.push(DonorFailure {
                    donor_id: donor.id.clone(),
                    reason: e.to_string(),
                });
                return;
            }
        };

        let evaluation = MatchingEngine::new(&self.patient, &self.criteria).evaluate(&candidate);
        if evaluation.is_accepted() {
            tally.results.push(evaluation);
        } else {
            tally.rejected_count += 1;
            if self.include_rejected {
                tally.results.push(evaluation);
            }
        }
    }
}

/// Runs searches against donor sources for one nomenclature version
pub struct SearchRunner {
    expander: PhenotypeExpander,
    config: SearchConfig,
}

impl SearchRunner {
    pub fn new(expander: PhenotypeExpander, config: SearchConfig) -> Self {
        Self { expander, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Evaluate every donor from `source` against `patient`
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Patient` if the patient cannot be expanded, and
    /// `SearchError::Source` if the donor source fails. Individual donors that
    /// cannot be expanded are recorded in [`SearchOutcome::failures`] instead.
    pub async fn run(
        &self,
        patient: &RawPhenotype,
        criteria: Arc<MatchCriteria>,
        filter: DonorFilter,
        source: Arc<dyn DonorSource>,
        cancel: CancellationFlag,
    ) -> Result<SearchOutcome, SearchError> {
        info!(
            "Starting {} donor search (nomenclature {}, {} workers)",
            filter.donor_type,
            self.expander.nomenclature_version(),
            self.config.workers.max(1)
        );

        let context = Arc::new(SearchContext {
            expander: self.expander.clone(),
            patient: self.expander.expand(patient)?,
            criteria,
            filter,
            include_rejected: self.config.include_rejected,
        });

        let (tx, rx) = mpsc::channel::<DonorRecord>(self.config.queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let producer_cancel = cancel.clone();
        let producer = tokio::task::spawn_blocking(move || -> Result<(), DonorSourceError> {
            for donor in source.candidates(&filter)? {
                if producer_cancel.is_cancelled() {
                    debug!("Donor producer stopped by cancellation");
                    break;
                }
                if tx.blocking_send(donor).is_err() {
                    break;
                }
            }
            Ok(())
        });

        let mut workers = Vec::with_capacity(self.config.workers.max(1));
        for _ in 0..self.config.workers.max(1) {
            let context = Arc::clone(&context);
            let rx = Arc::clone(&rx);
            let cancel = cancel.clone();
            workers.push(tokio::spawn(async move {
                let mut tally = SearchOutcome::default();
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let next = rx.lock().await.recv().await;
                    let Some(donor) = next else {
                        break;
                    };
                    context.process(&donor, &mut tally);
                }
                tally
            }));
        }

        let mut outcome = SearchOutcome::default();
        for worker in workers {
            let tally = worker
                .await
                .map_err(|e| SearchError::Task(e.to_string()))?;
            outcome.merge(tally);
        }

        // Workers may stop early on cancellation; closing the channel releases the producer
        drop(rx);
        producer
            .await
            .map_err(|e| SearchError::Task(e.to_string()))??;

        outcome.cancelled = cancel.is_cancelled();
        info!(
            "Search finished: {} considered, {} filtered, {} rejected, {} accepted, {} failed",
            outcome.donors_considered,
            outcome.filtered_count,
            outcome.rejected_count,
            outcome.accepted_count(),
            outcome.failures.len()
        );
        Ok(outcome)
    }
}
