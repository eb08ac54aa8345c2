//! Error types for booking-engine operations.

use thiserror::Error;

/// Business-rule violations caught before anything is sent to the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("headcount {headcount} outside 1..={max} for {room}")]
    HeadcountOutOfRange {
        headcount: u32,
        max: u32,
        room: &'static str,
    },

    #[error("internal blocks require a purpose text")]
    MissingPurpose,

    #[error("weekly recurrence needs at least one weekday")]
    EmptyWeekdaySet,

    #[error("yearly recurrence needs at least one month")]
    EmptyMonthSet,

    #[error("repeat count must be between 1 and {max}, got {got}")]
    RepeatCount { got: u32, max: u32 },

    #[error("week interval must be between 1 and 52, got {0}")]
    IntervalWeeks(u32),

    #[error("month limit must be between 1 and 120, got {0}")]
    MonthLimit(u32),

    #[error("the recurrence rule yields no dates from this anchor")]
    NoCandidateDates,

    #[error("invalid month index {0} (expected 0..=11)")]
    MonthIndex(u32),

    #[error("year {0} is outside the supported calendar range")]
    Year(i32),
}

/// Failures reported by (or while talking to) the booking store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("booking {0} not found")]
    NotFound(u64),

    #[error("not permitted: {0}")]
    NotPermitted(String),

    #[error("store rejected the request: {0}")]
    Validation(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request cancelled before the store answered")]
    Cancelled,
}

/// Records from an external feed that cannot be mapped onto the typed model.
#[derive(Error, Debug)]
pub enum WireError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown period '{0}'")]
    UnknownPeriod(String),

    #[error("unknown room '{0}'")]
    UnknownRoom(String),

    #[error("unknown booking status '{0}'")]
    UnknownStatus(String),

    #[error("unknown exclusion kind '{0}'")]
    UnknownExclusion(String),
}

/// Umbrella error for engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("recurrence computation failed: {0}")]
    RecurrenceCompute(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
