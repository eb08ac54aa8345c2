//! Month availability assembly with view-dependent visibility.
//!
//! Combines the calendar grid, the per-room exclusion feeds, and the month's
//! bookings into one per-day, per-room, per-period status matrix. The same
//! inputs yield the administrator view or a requester view depending on the
//! [`Viewer`] passed in; nothing is cached between calls.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calendar::{build_month_grid, is_weekend, MonthGrid, MonthRef};
use crate::classifier::{classify_slot, SlotStatus, Viewer};
use crate::model::{Booking, BookingId, CivilDate, ExclusionFact, Period, RoomKind, SlotKey};

/// Exclusion facts for one month as reported by a single feed.
///
/// Feeds are queried per room but are expected to agree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionFeed {
    /// Opaque identifier of the feed (e.g., the room it was fetched for).
    pub source: String,
    pub facts: BTreeMap<CivilDate, ExclusionFact>,
}

/// One room/period cell of a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub period: Period,
    pub room: RoomKind,
    pub status: SlotStatus,
    /// Present for administrators and for the requester who owns the booking.
    pub booking: Option<BookingId>,
}

/// All slots of one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: CivilDate,
    pub exclusion: Option<ExclusionFact>,
    pub slots: Vec<SlotView>,
}

/// The full status matrix of a month for one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthAvailability {
    pub viewer: Viewer,
    pub grid: MonthGrid,
    pub days: Vec<DayAvailability>,
}

impl MonthAvailability {
    pub fn day(&self, date: CivilDate) -> Option<&DayAvailability> {
        self.days.iter().find(|d| d.date == date)
    }

    pub fn status(&self, key: &SlotKey) -> Option<&SlotStatus> {
        self.day(key.date)?
            .slots
            .iter()
            .find(|s| s.period == key.period && s.room == key.room)
            .map(|s| &s.status)
    }

    /// Slots a new booking could be placed on, in date order.
    pub fn bookable_slots(&self) -> impl Iterator<Item = SlotKey> + '_ {
        self.days.iter().flat_map(|day| {
            day.slots
                .iter()
                .filter(|s| s.status.is_bookable())
                .map(move |s| SlotKey::new(day.date, s.period, s.room))
        })
    }
}

/// Merge exclusion feeds into one fact per date.
///
/// Empty feeds contribute nothing, so a month where only one feed returned
/// data uses that feed. When feeds claim different facts for the same date
/// the higher-precedence fact (weekend, then holiday, then admin block) wins
/// and a warning is logged.
pub fn merge_exclusion_feeds(feeds: &[ExclusionFeed]) -> BTreeMap<CivilDate, ExclusionFact> {
    let mut merged: BTreeMap<CivilDate, ExclusionFact> = BTreeMap::new();

    for feed in feeds.iter().filter(|f| !f.facts.is_empty()) {
        for (date, fact) in &feed.facts {
            match merged.get(date) {
                Some(existing) if existing == fact => {}
                Some(existing) => {
                    let winner = existing.clone().min_by_rank(fact.clone());
                    warn!(%date, source = %feed.source, kept = ?winner, "exclusion feeds disagree");
                    merged.insert(*date, winner);
                }
                None => {
                    merged.insert(*date, fact.clone());
                }
            }
        }
    }

    merged
}

/// The exclusion that applies to `date`: weekends first, then the feeds.
pub fn exclusion_for(
    date: CivilDate,
    merged: &BTreeMap<CivilDate, ExclusionFact>,
) -> Option<ExclusionFact> {
    if is_weekend(date) {
        Some(ExclusionFact::Weekend)
    } else {
        merged.get(&date).cloned()
    }
}

/// Build the availability matrix of `month` for `viewer`.
///
/// Bookings outside the month are ignored. When several bookings share a
/// slot, one that still occupies it (pending, approved, internal block) is
/// shown in preference to rejected or cancelled ones; ties go to the highest
/// booking id.
pub fn assemble_month(
    month: MonthRef,
    viewer: &Viewer,
    feeds: &[ExclusionFeed],
    bookings: &[Booking],
) -> MonthAvailability {
    let merged = merge_exclusion_feeds(feeds);
    let by_slot = index_bookings(month, bookings);

    let days: Vec<DayAvailability> = month
        .dates()
        .map(|date| {
            let exclusion = exclusion_for(date, &merged);
            let slots = RoomKind::ALL
                .into_iter()
                .flat_map(|room| {
                    Period::ALL
                        .into_iter()
                        .map(move |period| SlotKey::new(date, period, room))
                })
                .map(|key| {
                    let booking = by_slot.get(&key).copied();
                    let status = classify_slot(&key, exclusion.as_ref(), booking, viewer);
                    let visible = match viewer {
                        Viewer::Administrator => true,
                        Viewer::Requester(me) => booking.is_some_and(|b| b.is_owned_by(me)),
                    };
                    SlotView {
                        period: key.period,
                        room: key.room,
                        booking: booking.filter(|_| visible).map(|b| b.id),
                        status,
                    }
                })
                .collect();
            DayAvailability {
                date,
                exclusion,
                slots,
            }
        })
        .collect();

    debug!(
        year = month.year(),
        month_index = month.month_index(),
        bookings = by_slot.len(),
        excluded_days = days.iter().filter(|d| d.exclusion.is_some()).count(),
        "assembled month availability"
    );

    MonthAvailability {
        viewer: viewer.clone(),
        grid: build_month_grid(month),
        days,
    }
}

fn index_bookings(month: MonthRef, bookings: &[Booking]) -> HashMap<SlotKey, &Booking> {
    let mut by_slot: HashMap<SlotKey, &Booking> = HashMap::new();
    for booking in bookings.iter().filter(|b| month.contains(b.slot.date)) {
        let replace = by_slot.get(&booking.slot).is_none_or(|current| {
            let rank = |b: &Booking| (b.status.occupies_slot(), b.id);
            rank(booking) > rank(*current)
        });
        if replace {
            by_slot.insert(booking.slot, booking);
        }
    }
    by_slot
}
