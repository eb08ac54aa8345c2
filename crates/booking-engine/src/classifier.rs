//! Slot classification -- one authoritative status per (date, period, room).
//!
//! Rules are applied in a fixed order and the first match wins:
//!
//! 1. a whole-day exclusion suppresses the slot regardless of bookings;
//! 2. no booking means the slot is free;
//! 3. rejected or cancelled bookings free the slot (administrators still see them);
//! 4. internal blocks are never bookable by requesters;
//! 5. requesters see other people's bookings only as "occupied";
//! 6. otherwise the booking shows as pending or approved.

use serde::{Deserialize, Serialize};

use crate::model::{Booking, BookingStatus, ExclusionFact, RequesterId, SlotKey};

/// Who is looking at the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Viewer {
    Administrator,
    Requester(RequesterId),
}

/// Status of a single slot as shown to a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotStatus {
    DayExcluded(ExclusionFact),
    Free,
    OwnPending,
    OwnApproved,
    /// Booked by someone else. Carries no details about the other requester.
    OccupiedByOther,
    /// `purpose` is only filled in for administrators.
    AdminInternalBlock { purpose: Option<String> },
    /// Administrator view only; bookable again.
    Rejected,
    /// Administrator view only; bookable again.
    Cancelled,
}

impl SlotStatus {
    /// Whether a new booking may be placed on the slot.
    pub const fn is_bookable(&self) -> bool {
        matches!(self, Self::Free | Self::Rejected | Self::Cancelled)
    }
}

/// Classify one slot.
///
/// `booking` is ignored unless it sits on `slot`, so callers may pass the
/// result of a loose lookup.
pub fn classify_slot(
    slot: &SlotKey,
    exclusion: Option<&ExclusionFact>,
    booking: Option<&Booking>,
    viewer: &Viewer,
) -> SlotStatus {
    if let Some(fact) = exclusion {
        return SlotStatus::DayExcluded(fact.clone());
    }

    let Some(booking) = booking.filter(|b| b.slot == *slot) else {
        return SlotStatus::Free;
    };

    let is_admin = matches!(viewer, Viewer::Administrator);

    match booking.status {
        BookingStatus::Rejected if is_admin => SlotStatus::Rejected,
        BookingStatus::Cancelled if is_admin => SlotStatus::Cancelled,
        BookingStatus::Rejected | BookingStatus::Cancelled => SlotStatus::Free,
        BookingStatus::InternalBlock => SlotStatus::AdminInternalBlock {
            purpose: if is_admin {
                booking.purpose.clone()
            } else {
                None
            },
        },
        BookingStatus::Pending | BookingStatus::Approved => {
            if let Viewer::Requester(me) = viewer {
                if !booking.is_owned_by(me) {
                    return SlotStatus::OccupiedByOther;
                }
            }
            if booking.status == BookingStatus::Pending {
                SlotStatus::OwnPending
            } else {
                SlotStatus::OwnApproved
            }
        }
    }
}
