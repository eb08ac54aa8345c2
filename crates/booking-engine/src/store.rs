//! The remote booking store boundary.
//!
//! The store is the sole authority on slot exclusivity: a batch write decides,
//! per candidate date, whether the booking is inserted or reported as a
//! conflict. [`MemoryStore`] is a reference implementation used by the CLI and
//! the test suite.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::availability::{exclusion_for, ExclusionFeed};
use crate::calendar::MonthRef;
use crate::classifier::Viewer;
use crate::error::StoreError;
use crate::model::{
    Booking, BookingId, BookingStatus, BookingTemplate, CivilDate, ExclusionFact, RoomKind, SlotKey,
};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Per-date result of a batch write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchWriteResult {
    pub inserted: Vec<CivilDate>,
    pub conflicts: Vec<CivilDate>,
}

/// Everything the engine needs from a booking store.
///
/// Dropping a returned future abandons the request; callers must then assume
/// nothing was persisted.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Whole-day exclusions for a month, as fetched for one room.
    async fn exclusions(&self, month: MonthRef, room: RoomKind) -> StoreResult<ExclusionFeed>;

    /// Existing bookings of one room in a month.
    async fn bookings(&self, month: MonthRef, room: RoomKind) -> StoreResult<Vec<Booking>>;

    /// Create a single booking.
    async fn create(&self, template: BookingTemplate) -> StoreResult<Booking>;

    /// Replace the fields of an existing booking.
    async fn update(
        &self,
        id: BookingId,
        template: BookingTemplate,
        actor: &Viewer,
    ) -> StoreResult<Booking>;

    /// Create one booking per candidate date, in a single request.
    async fn create_batch(
        &self,
        template: BookingTemplate,
        dates: Vec<CivilDate>,
    ) -> StoreResult<BatchWriteResult>;

    async fn delete(&self, id: BookingId, actor: &Viewer) -> StoreResult<()>;
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    bookings: BTreeMap<BookingId, Booking>,
    exclusions: BTreeMap<CivilDate, ExclusionFact>,
}

impl MemoryState {
    fn is_taken(&self, slot: &SlotKey, ignore: Option<BookingId>) -> bool {
        exclusion_for(slot.date, &self.exclusions).is_some()
            || self
                .bookings
                .values()
                .any(|b| Some(b.id) != ignore && b.slot == *slot && b.status.occupies_slot())
    }

    fn insert(&mut self, template: BookingTemplate) -> Booking {
        self.next_id += 1;
        let booking = template.into_booking(BookingId(self.next_id));
        self.bookings.insert(booking.id, booking.clone());
        booking
    }
}

/// In-process store with the same arbitration rules a remote store applies.
///
/// Weekends and feed exclusions count as conflicts, as do slots already held
/// by a pending, approved, or internal-block booking.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store. Identities of seeded bookings are kept as given.
    pub fn with_data(
        bookings: impl IntoIterator<Item = Booking>,
        exclusions: BTreeMap<CivilDate, ExclusionFact>,
    ) -> Self {
        let bookings: BTreeMap<BookingId, Booking> =
            bookings.into_iter().map(|b| (b.id, b)).collect();
        let next_id = bookings.keys().next_back().map_or(0, |id| id.0);
        Self {
            state: Mutex::new(MemoryState {
                next_id,
                bookings,
                exclusions,
            }),
        }
    }

    /// All bookings currently held, ordered by id.
    pub fn snapshot(&self) -> Vec<Booking> {
        self.state.lock().bookings.values().cloned().collect()
    }
}

fn check_owner(booking: &Booking, actor: &Viewer) -> StoreResult<()> {
    match actor {
        Viewer::Administrator => Ok(()),
        Viewer::Requester(me)
            if booking.is_owned_by(me) && booking.status == BookingStatus::Pending =>
        {
            Ok(())
        }
        Viewer::Requester(me) if booking.is_owned_by(me) => Err(StoreError::NotPermitted(format!(
            "booking {} is no longer pending",
            booking.id
        ))),
        Viewer::Requester(_) => Err(StoreError::NotPermitted(format!(
            "booking {} belongs to someone else",
            booking.id
        ))),
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn exclusions(&self, month: MonthRef, room: RoomKind) -> StoreResult<ExclusionFeed> {
        let state = self.state.lock();
        let facts = state
            .exclusions
            .iter()
            .filter(|(date, _)| month.contains(**date))
            .map(|(date, fact)| (*date, fact.clone()))
            .collect();
        Ok(ExclusionFeed {
            source: room.label().to_string(),
            facts,
        })
    }

    async fn bookings(&self, month: MonthRef, room: RoomKind) -> StoreResult<Vec<Booking>> {
        let state = self.state.lock();
        Ok(state
            .bookings
            .values()
            .filter(|b| b.slot.room == room && month.contains(b.slot.date))
            .cloned()
            .collect())
    }

    async fn create(&self, template: BookingTemplate) -> StoreResult<Booking> {
        let mut state = self.state.lock();
        if state.is_taken(&template.slot, None) {
            return Err(StoreError::Validation(format!(
                "{} {} on {} is not available",
                template.slot.room, template.slot.period, template.slot.date
            )));
        }
        Ok(state.insert(template))
    }

    async fn update(
        &self,
        id: BookingId,
        template: BookingTemplate,
        actor: &Viewer,
    ) -> StoreResult<Booking> {
        let mut state = self.state.lock();
        let current = state.bookings.get(&id).ok_or(StoreError::NotFound(id.0))?;
        check_owner(current, actor)?;
        if let Viewer::Requester(me) = actor {
            if template.status != BookingStatus::Pending {
                return Err(StoreError::NotPermitted(
                    "requesters cannot change the status".to_string(),
                ));
            }
            if template.requester.as_ref() != Some(me) {
                return Err(StoreError::NotPermitted(
                    "requesters cannot hand a booking to someone else".to_string(),
                ));
            }
        }
        if template.status.occupies_slot() && state.is_taken(&template.slot, Some(id)) {
            return Err(StoreError::Validation(format!(
                "{} {} on {} is not available",
                template.slot.room, template.slot.period, template.slot.date
            )));
        }
        let updated = template.into_booking(id);
        state.bookings.insert(id, updated.clone());
        Ok(updated)
    }

    async fn create_batch(
        &self,
        template: BookingTemplate,
        dates: Vec<CivilDate>,
    ) -> StoreResult<BatchWriteResult> {
        let mut state = self.state.lock();
        let mut result = BatchWriteResult::default();
        for date in dates {
            let candidate = template.on(date);
            if state.is_taken(&candidate.slot, None) {
                result.conflicts.push(date);
            } else {
                state.insert(candidate);
                result.inserted.push(date);
            }
        }
        Ok(result)
    }

    async fn delete(&self, id: BookingId, actor: &Viewer) -> StoreResult<()> {
        let mut state = self.state.lock();
        let current = state.bookings.get(&id).ok_or(StoreError::NotFound(id.0))?;
        check_owner(current, actor)?;
        state.bookings.remove(&id);
        Ok(())
    }
}
