//! Booking request validation and submission.
//!
//! The composer checks a request's business rules, expands recurring requests
//! into candidate dates, and relays the store's per-date answer. It never
//! retries and never decides exclusivity itself.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classifier::Viewer;
use crate::config::EngineConfig;
use crate::error::{Result, StoreError, ValidationError};
use crate::model::{Booking, BookingId, BookingStatus, BookingTemplate, CivilDate, SlotKey};
use crate::recurrence::{expand_recurrence, RecurrenceSpec};
use crate::store::{BatchWriteResult, BookingStore};

/// A booking request as submitted by a user or administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub template: BookingTemplate,
    #[serde(default)]
    pub recurrence: Option<RecurrenceSpec>,
}

/// Check the business rules of a single booking.
///
/// # Errors
/// `ValidationError::HeadcountOutOfRange` or `ValidationError::MissingPurpose`.
pub fn validate_template(template: &BookingTemplate) -> std::result::Result<(), ValidationError> {
    let room = template.slot.room;
    if template.headcount == 0 || template.headcount > room.max_capacity() {
        return Err(ValidationError::HeadcountOutOfRange {
            headcount: template.headcount,
            max: room.max_capacity(),
            room: room.label(),
        });
    }
    if template.status == BookingStatus::InternalBlock
        && template.purpose.as_deref().is_none_or(|p| p.trim().is_empty())
    {
        return Err(ValidationError::MissingPurpose);
    }
    Ok(())
}

/// Candidate dates for a recurring request, ready to be sent as one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPlan {
    pub template: BookingTemplate,
    /// Dates that will be sent to the store, in order.
    pub candidates: Vec<CivilDate>,
    /// Dates dropped because a known booking already holds the slot.
    pub skipped_known: Vec<CivilDate>,
}

impl SeriesPlan {
    pub fn slots(&self) -> Vec<SlotKey> {
        self.candidates
            .iter()
            .map(|d| self.template.slot.on(*d))
            .collect()
    }
}

/// Validate a recurring request and expand it from the template's date.
///
/// `known` holds bookings the caller has already loaded; candidates whose slot
/// is held by one of them are not proposed.
///
/// # Errors
/// `EngineError::Validation` for any broken rule, before anything is sent.
/// A rule that yields no date at all from this anchor is reported as
/// `ValidationError::NoCandidateDates`.
pub fn compose_series(
    template: &BookingTemplate,
    spec: &RecurrenceSpec,
    known: &[Booking],
    max_repeat_count: u32,
) -> Result<SeriesPlan> {
    validate_template(template)?;
    spec.validate(max_repeat_count)?;

    let held: HashSet<SlotKey> = known
        .iter()
        .filter(|b| b.status.occupies_slot())
        .map(|b| b.slot)
        .collect();

    let dates = expand_recurrence(template.slot.date, spec)?;
    if dates.is_empty() {
        return Err(ValidationError::NoCandidateDates.into());
    }

    let (skipped_known, candidates): (Vec<CivilDate>, Vec<CivilDate>) = dates
        .into_iter()
        .partition(|date| held.contains(&template.slot.on(*date)));

    Ok(SeriesPlan {
        template: template.clone(),
        candidates,
        skipped_known,
    })
}

/// How a batch write turned out, from the user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    AllInserted,
    Partial,
    NothingInserted,
}

/// The store's answer to a series submission, plus client-side pruning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesReport {
    pub inserted: Vec<CivilDate>,
    pub conflicts: Vec<CivilDate>,
    pub skipped_known: Vec<CivilDate>,
}

impl SeriesReport {
    /// Classification based on both lists, never on `inserted` alone.
    pub fn outcome(&self) -> BatchOutcome {
        let rejected = self.conflicts.len() + self.skipped_known.len();
        match (self.inserted.is_empty(), rejected == 0) {
            (false, true) => BatchOutcome::AllInserted,
            (false, false) => BatchOutcome::Partial,
            (true, _) => BatchOutcome::NothingInserted,
        }
    }
}

impl fmt::Display for SeriesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conflicts = self.conflicts.len() + self.skipped_known.len();
        match self.outcome() {
            BatchOutcome::AllInserted => write!(f, "created {} bookings", self.inserted.len()),
            BatchOutcome::Partial => write!(
                f,
                "created {} bookings; {} dates were unavailable",
                self.inserted.len(),
                conflicts
            ),
            BatchOutcome::NothingInserted => {
                write!(f, "nothing was created; {conflicts} dates were unavailable")
            }
        }
    }
}

/// Check the store's batch answer against what was sent.
fn check_batch(
    candidates: &[CivilDate],
    result: &BatchWriteResult,
) -> std::result::Result<(), StoreError> {
    let sent: HashSet<&CivilDate> = candidates.iter().collect();
    let inserted: HashSet<&CivilDate> = result.inserted.iter().collect();
    let conflicts: HashSet<&CivilDate> = result.conflicts.iter().collect();
    let answered: HashSet<&CivilDate> = inserted.union(&conflicts).copied().collect();

    // Every candidate exactly once: no repeats within a list, no overlap
    // between lists, and the same set of dates that was sent.
    let consistent = result.inserted.len() + result.conflicts.len() == candidates.len()
        && inserted.len() == result.inserted.len()
        && conflicts.len() == result.conflicts.len()
        && inserted.is_disjoint(&conflicts)
        && answered == sent;

    if consistent {
        Ok(())
    } else {
        Err(StoreError::Transport(format!(
            "inconsistent batch response: sent {}, inserted {}, conflicts {}",
            candidates.len(),
            result.inserted.len(),
            result.conflicts.len()
        )))
    }
}

/// Validates requests and talks to a [`BookingStore`].
pub struct Composer<S> {
    store: S,
    config: EngineConfig,
}

impl<S: BookingStore> Composer<S> {
    pub const fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Validate and create a single booking.
    ///
    /// # Errors
    /// `EngineError::Validation` before any store call, or the store's error.
    pub async fn submit_single(&self, template: BookingTemplate) -> Result<Booking> {
        validate_template(&template)?;
        let booking = self.store.create(template).await?;
        info!(id = %booking.id, slot = ?booking.slot, "booking created");
        Ok(booking)
    }

    /// Validate, expand, and submit a recurring request as one batch.
    ///
    /// # Errors
    /// `EngineError::Validation` before any store call, or the store's error.
    /// A batch answer that does not account for every candidate exactly once
    /// is reported as `StoreError::Transport`.
    pub async fn submit_series(
        &self,
        template: &BookingTemplate,
        spec: &RecurrenceSpec,
        known: &[Booking],
    ) -> Result<SeriesReport> {
        let plan = compose_series(template, spec, known, self.config.max_repeat_count)?;

        if plan.candidates.is_empty() {
            warn!(skipped = plan.skipped_known.len(), "no candidate dates left to submit");
            return Ok(SeriesReport {
                inserted: Vec::new(),
                conflicts: Vec::new(),
                skipped_known: plan.skipped_known,
            });
        }

        let result = self
            .store
            .create_batch(plan.template.clone(), plan.candidates.clone())
            .await?;
        check_batch(&plan.candidates, &result)?;

        let report = SeriesReport {
            inserted: result.inserted,
            conflicts: result.conflicts,
            skipped_known: plan.skipped_known,
        };
        match report.outcome() {
            BatchOutcome::AllInserted => info!(inserted = report.inserted.len(), "series created"),
            outcome => warn!(
                ?outcome,
                inserted = report.inserted.len(),
                conflicts = report.conflicts.len(),
                skipped = report.skipped_known.len(),
                "series only partly created"
            ),
        }
        Ok(report)
    }

    /// [`Self::submit_series`], abandoned as soon as `cancel` completes.
    ///
    /// Once cancelled, the caller must assume nothing was persisted; the
    /// store's answer, if it ever arrives, is never read.
    ///
    /// # Errors
    /// `StoreError::Cancelled` when `cancel` wins, otherwise the same as
    /// [`Self::submit_series`].
    pub async fn submit_series_until<F>(
        &self,
        template: &BookingTemplate,
        spec: &RecurrenceSpec,
        known: &[Booking],
        cancel: F,
    ) -> Result<SeriesReport>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancel => {
                warn!("series submission cancelled before the store answered");
                Err(StoreError::Cancelled.into())
            }
            report = self.submit_series(template, spec, known) => report,
        }
    }

    /// Submit either kind of request.
    ///
    /// # Errors
    /// Same as [`Self::submit_single`] and [`Self::submit_series`].
    pub async fn submit(
        &self,
        request: &BookingRequest,
        known: &[Booking],
    ) -> Result<SeriesReport> {
        match &request.recurrence {
            Some(spec) => self.submit_series(&request.template, spec, known).await,
            None => {
                let booking = self.submit_single(request.template.clone()).await?;
                Ok(SeriesReport {
                    inserted: vec![booking.slot.date],
                    conflicts: Vec::new(),
                    skipped_known: Vec::new(),
                })
            }
        }
    }

    /// Validate and apply an edit to an existing booking.
    ///
    /// # Errors
    /// `EngineError::Validation` before any store call, or the store's error.
    pub async fn update(
        &self,
        id: BookingId,
        template: BookingTemplate,
        actor: &Viewer,
    ) -> Result<Booking> {
        validate_template(&template)?;
        Ok(self.store.update(id, template, actor).await?)
    }

    /// # Errors
    /// The store's `NotFound` or `NotPermitted` error.
    pub async fn delete(&self, id: BookingId, actor: &Viewer) -> Result<()> {
        self.store.delete(id, actor).await?;
        info!(%id, "booking deleted");
        Ok(())
    }
}
