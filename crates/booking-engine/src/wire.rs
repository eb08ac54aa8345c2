//! JSON adapter for booking and exclusion records coming from external feeds.
//!
//! Feeds disagree on field names and spellings. Everything is normalized here
//! so the rest of the engine only sees the typed model.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::availability::ExclusionFeed;
use crate::error::WireError;
use crate::model::{
    Booking, BookingId, BookingStatus, CivilDate, ExclusionFact, Period, RequesterId, RoomKind,
    SlotKey,
};

/// A booking record in any of the accepted shapes.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRecord {
    #[serde(alias = "booking_id", alias = "reservation_id")]
    pub id: u64,
    #[serde(alias = "day", alias = "booking_date")]
    pub date: CivilDate,
    #[serde(alias = "shift", alias = "slot")]
    pub period: String,
    #[serde(alias = "space", alias = "room_kind")]
    pub room: String,
    #[serde(alias = "state")]
    pub status: String,
    #[serde(default, alias = "requester", alias = "user_id", alias = "owner")]
    pub requester_id: Option<String>,
    #[serde(default, alias = "attendees", alias = "participants")]
    pub headcount: u32,
    #[serde(default, alias = "justification", alias = "reason")]
    pub purpose: Option<String>,
    #[serde(default, alias = "has_coffee_break")]
    pub coffee_break: bool,
}

impl TryFrom<BookingRecord> for Booking {
    type Error = WireError;

    fn try_from(record: BookingRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: BookingId(record.id),
            slot: SlotKey::new(
                record.date,
                parse_period(&record.period)?,
                parse_room(&record.room)?,
            ),
            status: parse_status(&record.status)?,
            requester: record
                .requester_id
                .filter(|r| !r.is_empty())
                .map(RequesterId),
            headcount: record.headcount,
            purpose: record.purpose.filter(|p| !p.trim().is_empty()),
            coffee_break: record.coffee_break,
        })
    }
}

/// An exclusion record in any of the accepted shapes.
#[derive(Debug, Clone, Deserialize)]
pub struct ExclusionRecord {
    #[serde(alias = "day")]
    pub date: CivilDate,
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(default, alias = "name", alias = "reason")]
    pub label: Option<String>,
}

impl TryFrom<ExclusionRecord> for ExclusionFact {
    type Error = WireError;

    fn try_from(record: ExclusionRecord) -> Result<Self, Self::Error> {
        let label = record.label.unwrap_or_default();
        match normalize(&record.kind).as_str() {
            "weekend" => Ok(Self::Weekend),
            "holiday" | "feriado" => Ok(Self::Holiday(label)),
            "blocked" | "admin_blocked" | "admin_block" | "bloqueio" => {
                Ok(Self::AdminBlocked(label))
            }
            _ => Err(WireError::UnknownExclusion(record.kind)),
        }
    }
}

/// A month's worth of store data: bookings plus one exclusion feed per source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default, alias = "reservations")]
    pub bookings: Vec<BookingRecord>,
    #[serde(default, alias = "blocked_dates")]
    pub exclusions: BTreeMap<String, Vec<ExclusionRecord>>,
}

impl Snapshot {
    /// Normalize every record.
    ///
    /// # Errors
    /// The first record that cannot be mapped.
    pub fn into_parts(self) -> Result<(Vec<Booking>, Vec<ExclusionFeed>), WireError> {
        let bookings = self
            .bookings
            .into_iter()
            .map(Booking::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let feeds = self
            .exclusions
            .into_iter()
            .map(|(source, records)| -> Result<ExclusionFeed, WireError> {
                let facts = records
                    .into_iter()
                    .map(|r| -> Result<_, WireError> { Ok((r.date, ExclusionFact::try_from(r)?)) })
                    .collect::<Result<BTreeMap<_, _>, WireError>>()?;
                Ok(ExclusionFeed { source, facts })
            })
            .collect::<Result<Vec<_>, WireError>>()?;

        Ok((bookings, feeds))
    }
}

/// Parse a JSON snapshot document.
///
/// # Errors
/// `WireError::Json` for malformed JSON, or the first unmappable record.
pub fn decode_snapshot(json: &str) -> Result<(Vec<Booking>, Vec<ExclusionFeed>), WireError> {
    let snapshot: Snapshot = serde_json::from_str(json)?;
    snapshot.into_parts()
}

/// Parse a JSON array of booking records.
///
/// # Errors
/// `WireError::Json` for malformed JSON, or the first unmappable record.
pub fn decode_bookings(json: &str) -> Result<Vec<Booking>, WireError> {
    let records: Vec<BookingRecord> = serde_json::from_str(json)?;
    records.into_iter().map(Booking::try_from).collect()
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['-', ' '], "_")
}

/// # Errors
/// `WireError::UnknownPeriod` for unrecognized spellings.
pub fn parse_period(raw: &str) -> Result<Period, WireError> {
    match normalize(raw).as_str() {
        "morning" | "am" | "manha" | "manhã" => Ok(Period::Morning),
        "afternoon" | "pm" | "tarde" => Ok(Period::Afternoon),
        _ => Err(WireError::UnknownPeriod(raw.to_string())),
    }
}

/// # Errors
/// `WireError::UnknownRoom` for unrecognized spellings.
pub fn parse_room(raw: &str) -> Result<RoomKind, WireError> {
    match normalize(raw).as_str() {
        "auditorium" | "auditorio" | "auditório" => Ok(RoomKind::Auditorium),
        "meeting_room"
        | "meetingroom"
        | "meeting"
        | "sala_de_reuniao"
        | "sala_de_reunião"
        | "sala_reuniao" => Ok(RoomKind::MeetingRoom),
        _ => Err(WireError::UnknownRoom(raw.to_string())),
    }
}

/// # Errors
/// `WireError::UnknownStatus` for unrecognized spellings.
pub fn parse_status(raw: &str) -> Result<BookingStatus, WireError> {
    match normalize(raw).as_str() {
        "pending" | "pendente" => Ok(BookingStatus::Pending),
        "approved" | "aprovado" | "aprovada" => Ok(BookingStatus::Approved),
        "rejected" | "rejeitado" | "rejeitada" => Ok(BookingStatus::Rejected),
        "cancelled" | "canceled" | "cancelado" | "cancelada" => Ok(BookingStatus::Cancelled),
        "internal_block" | "internal" | "blocked" | "bloqueado" => Ok(BookingStatus::InternalBlock),
        _ => Err(WireError::UnknownStatus(raw.to_string())),
    }
}
