//! Tests for the JSON adapter that normalizes external feed records.

use booking_engine::wire::{
    decode_bookings, decode_snapshot, parse_period, parse_room, parse_status,
};
use booking_engine::{
    BookingId, BookingStatus, ExclusionFact, Period, RequesterId, RoomKind, WireError,
};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn canonical_record_decodes() {
    let json = r#"[{
        "id": 12,
        "date": "2025-01-06",
        "period": "morning",
        "room": "auditorium",
        "status": "approved",
        "requester_id": "alice",
        "headcount": 35,
        "purpose": "Lecture",
        "coffee_break": true
    }]"#;
    let bookings = decode_bookings(json).expect("should decode");

    assert_eq!(bookings.len(), 1);
    let b = &bookings[0];
    assert_eq!(b.id, BookingId(12));
    assert_eq!(b.slot.date, date(2025, 1, 6));
    assert_eq!(b.slot.period, Period::Morning);
    assert_eq!(b.slot.room, RoomKind::Auditorium);
    assert_eq!(b.status, BookingStatus::Approved);
    assert_eq!(b.requester, Some(RequesterId::from("alice")));
    assert_eq!(b.headcount, 35);
    assert_eq!(b.purpose.as_deref(), Some("Lecture"));
    assert!(b.coffee_break);
}

#[test]
fn alternate_field_names_decode_to_same_model() {
    let json = r#"[{
        "reservation_id": 3,
        "booking_date": "2025-02-10",
        "shift": "PM",
        "space": "Meeting Room",
        "state": "internal",
        "justification": "Audit",
        "attendees": 4,
        "has_coffee_break": false
    }]"#;
    let bookings = decode_bookings(json).expect("should decode");
    let b = &bookings[0];

    assert_eq!(b.id, BookingId(3));
    assert_eq!(b.slot.period, Period::Afternoon);
    assert_eq!(b.slot.room, RoomKind::MeetingRoom);
    assert_eq!(b.status, BookingStatus::InternalBlock);
    assert_eq!(b.requester, None);
    assert_eq!(b.purpose.as_deref(), Some("Audit"));
    assert_eq!(b.headcount, 4);
}

#[test]
fn empty_requester_and_blank_purpose_become_none() {
    let json = r#"[{"id":1,"date":"2025-01-06","period":"am","room":"auditorio","status":"pendente","owner":"","reason":"  "}]"#;
    let b = &decode_bookings(json).unwrap()[0];
    assert_eq!(b.requester, None);
    assert_eq!(b.purpose, None);
    assert_eq!(b.status, BookingStatus::Pending);
}

#[test]
fn spelling_variants() {
    assert_eq!(parse_period("Manhã").unwrap(), Period::Morning);
    assert_eq!(parse_period("tarde").unwrap(), Period::Afternoon);
    assert_eq!(parse_room("meeting-room").unwrap(), RoomKind::MeetingRoom);
    assert_eq!(parse_status("Canceled").unwrap(), BookingStatus::Cancelled);
    assert_eq!(parse_status("REJECTED").unwrap(), BookingStatus::Rejected);
}

#[test]
fn unknown_values_are_errors() {
    assert!(matches!(parse_period("evening"), Err(WireError::UnknownPeriod(_))));
    assert!(matches!(parse_room("gym"), Err(WireError::UnknownRoom(_))));
    assert!(matches!(parse_status("maybe"), Err(WireError::UnknownStatus(_))));
}

#[test]
fn malformed_json_is_reported() {
    assert!(matches!(decode_bookings("[{"), Err(WireError::Json(_))));
}

#[test]
fn snapshot_splits_into_bookings_and_feeds() {
    let json = r#"{
        "reservations": [
            {"id": 1, "day": "2025-01-07", "slot": "morning", "room_kind": "auditorium", "status": "pending", "user_id": "bob", "participants": 10}
        ],
        "exclusions": {
            "auditorium": [{"date": "2025-01-01", "type": "holiday", "name": "New Year"}],
            "meeting_room": []
        }
    }"#;
    let (bookings, feeds) = decode_snapshot(json).expect("should decode");

    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].requester, Some(RequesterId::from("bob")));
    assert_eq!(feeds.len(), 2);
    assert_eq!(feeds[0].source, "auditorium");
    assert_eq!(
        feeds[0].facts[&date(2025, 1, 1)],
        ExclusionFact::Holiday("New Year".to_string())
    );
    assert!(feeds[1].facts.is_empty());
}

#[test]
fn unknown_exclusion_kind_is_an_error() {
    let json = r#"{"exclusions": {"auditorium": [{"date": "2025-01-01", "kind": "party"}]}}"#;
    assert!(matches!(decode_snapshot(json), Err(WireError::UnknownExclusion(_))));
}
