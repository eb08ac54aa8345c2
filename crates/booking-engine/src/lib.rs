//! # booking-engine
//!
//! Availability classification and recurring-series expansion for bookable rooms.
//!
//! The engine answers three questions for an auditorium and a meeting room that
//! are booked by half-day periods: what a month looks like as a calendar grid,
//! what status every (date, period, room) slot has for a given viewer, and which
//! dates a recurring booking request expands to. Persistence and final conflict
//! arbitration belong to a [`store::BookingStore`].
//!
//! ## Modules
//!
//! - [`calendar`]: Month handles and the Sunday-first week grid
//! - [`recurrence`]: Anchored recurrence rule → ordered candidate dates
//! - [`classifier`]: One authoritative status per slot, per viewer
//! - [`availability`]: Month status matrix from feeds and bookings
//! - [`composer`]: Request validation and batch submission
//! - [`store`]: Store boundary trait and in-memory store
//! - [`wire`]: JSON adapter for heterogeneous feed records
//! - [`model`]: Rooms, periods, slots, bookings, exclusions
//! - [`config`]: TOML configuration
//! - [`error`]: Error types

pub mod availability;
pub mod calendar;
pub mod classifier;
pub mod composer;
pub mod config;
pub mod error;
pub mod model;
pub mod recurrence;
pub mod store;
pub mod wire;

pub use availability::{assemble_month, merge_exclusion_feeds, ExclusionFeed, MonthAvailability};
pub use calendar::{build_month_grid, MonthGrid, MonthRef};
pub use classifier::{classify_slot, SlotStatus, Viewer};
pub use composer::{
    compose_series, validate_template, BatchOutcome, BookingRequest, Composer, SeriesReport,
};
pub use config::EngineConfig;
pub use error::{EngineError, StoreError, ValidationError, WireError};
pub use model::{
    Booking, BookingId, BookingStatus, BookingTemplate, CivilDate, ExclusionFact, Period,
    RequesterId, RoomKind, SlotKey,
};
pub use recurrence::{expand_recurrence, MonthlyMode, RecurrenceSpec};
pub use store::{BatchWriteResult, BookingStore, MemoryStore};
