//! Core data model: rooms, periods, slot coordinates, bookings, and exclusions.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A calendar-only date with no time of day or zone.
pub type CivilDate = NaiveDate;

/// One of the two fixed daily halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Morning,
    Afternoon,
}

impl Period {
    pub const ALL: [Self; 2] = [Self::Morning, Self::Afternoon];
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Morning => f.write_str("morning"),
            Self::Afternoon => f.write_str("afternoon"),
        }
    }
}

/// A bookable room. Capacities are static facts, never stored per booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Auditorium,
    MeetingRoom,
}

impl RoomKind {
    pub const ALL: [Self; 2] = [Self::Auditorium, Self::MeetingRoom];

    /// Headcount the room seats comfortably.
    pub const fn comfort_capacity(self) -> u32 {
        match self {
            Self::Auditorium => 50,
            Self::MeetingRoom => 25,
        }
    }

    /// Hard upper bound on headcount.
    pub const fn max_capacity(self) -> u32 {
        match self {
            Self::Auditorium => 60,
            Self::MeetingRoom => 30,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Auditorium => "auditorium",
            Self::MeetingRoom => "meeting_room",
        }
    }
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The unique (date, period, room) coordinate of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub date: CivilDate,
    pub period: Period,
    pub room: RoomKind,
}

impl SlotKey {
    pub const fn new(date: CivilDate, period: Period, room: RoomKind) -> Self {
        Self { date, period, room }
    }

    /// Same period and room on another date.
    #[must_use]
    pub const fn on(self, date: CivilDate) -> Self {
        Self { date, ..self }
    }
}

/// Store-assigned booking identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub u64);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identity of an end user who requests bookings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequesterId(pub String);

impl From<&str> for RequesterId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    InternalBlock,
}

impl BookingStatus {
    /// Whether a booking in this status keeps the slot from being booked again.
    pub const fn occupies_slot(self) -> bool {
        matches!(self, Self::Pending | Self::Approved | Self::InternalBlock)
    }
}

/// A persisted booking as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub slot: SlotKey,
    pub status: BookingStatus,
    /// `None` for internal blocks created by an administrator.
    pub requester: Option<RequesterId>,
    pub headcount: u32,
    pub purpose: Option<String>,
    pub coffee_break: bool,
}

impl Booking {
    pub fn is_owned_by(&self, requester: &RequesterId) -> bool {
        self.requester.as_ref() == Some(requester)
    }
}

/// A booking before the store has assigned it an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingTemplate {
    pub slot: SlotKey,
    pub status: BookingStatus,
    #[serde(default)]
    pub requester: Option<RequesterId>,
    pub headcount: u32,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub coffee_break: bool,
}

impl BookingTemplate {
    /// The same template moved to another date.
    #[must_use]
    pub fn on(&self, date: CivilDate) -> Self {
        Self {
            slot: self.slot.on(date),
            ..self.clone()
        }
    }

    pub fn into_booking(self, id: BookingId) -> Booking {
        Booking {
            id,
            slot: self.slot,
            status: self.status,
            requester: self.requester,
            headcount: self.headcount,
            purpose: self.purpose,
            coffee_break: self.coffee_break,
        }
    }
}

/// Whole-day reason a date cannot be booked in any room or period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum ExclusionFact {
    Weekend,
    Holiday(String),
    AdminBlocked(String),
}

impl ExclusionFact {
    /// Lower ranks win when several sources claim the same date.
    pub(crate) const fn rank(&self) -> u8 {
        match self {
            Self::Weekend => 0,
            Self::Holiday(_) => 1,
            Self::AdminBlocked(_) => 2,
        }
    }

    /// Whichever of the two facts takes precedence.
    #[must_use]
    pub fn min_by_rank(self, other: Self) -> Self {
        if other.rank() < self.rank() {
            other
        } else {
            self
        }
    }
}
