use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};

/// Local wall-clock time, no offset, minute resolution.
pub type Timestamp = NaiveDateTime;

/// Canonical textual form, used for every timestamp the crate writes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

const ACCEPTED_FORMATS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse a local timestamp, truncating anything below the minute.
pub fn parse_timestamp(input: &str) -> Option<Timestamp> {
    let input = input.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(truncate_to_minute)
}

pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn truncate_to_minute(ts: Timestamp) -> Timestamp {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Serde adapter for timestamps in canonical form.
pub mod minute_format {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_timestamp, parse_timestamp, Timestamp};

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

// ── Interval comparisons ─────────────────────────────────────────

/// True iff the two half-open intervals share at least one instant.
/// Touching intervals (one ends where the other starts) do not overlap.
pub fn overlaps(a: &Span, b: &Span) -> bool {
    a.start < b.end && b.start < a.end
}

pub fn is_chronologically_valid(start: Timestamp, end: Timestamp) -> bool {
    start < end
}

/// Starting exactly at `now` is allowed.
pub fn is_not_in_past(start: Timestamp, now: Timestamp) -> bool {
    start >= now
}

/// Half-open interval `[start, end)`. Deserializing rejects `start >= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    #[serde(with = "minute_format")]
    pub start: Timestamp,
    #[serde(with = "minute_format")]
    pub end: Timestamp,
}

impl<'de> Deserialize<'de> for Span {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RawSpan {
            #[serde(with = "crate::model::minute_format")]
            start: Timestamp,
            #[serde(with = "crate::model::minute_format")]
            end: Timestamp,
        }

        let raw = RawSpan::deserialize(deserializer)?;
        Span::try_new(raw.start, raw.end).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "start {} must precede end {}",
                format_timestamp(&raw.start),
                format_timestamp(&raw.end)
            ))
        })
    }
}

impl Span {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    /// `None` unless `start < end`.
    pub fn try_new(start: Timestamp, end: Timestamp) -> Option<Self> {
        is_chronologically_valid(start, end).then_some(Self { start, end })
    }

    pub fn duration(&self) -> chrono::TimeDelta {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        overlaps(self, other)
    }

    pub fn contains_instant(&self, t: Timestamp) -> bool {
        self.start <= t && t < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            format_timestamp(&self.start),
            format_timestamp(&self.end)
        )
    }
}

// ── Identity ─────────────────────────────────────────────────────

/// Store-assigned reservation id. Never reused, even after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(pub u64);

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who created a reservation. Only used to tell "mine" from "theirs".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub u64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Records ──────────────────────────────────────────────────────

/// A committed reservation. Only the admission engine creates these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ReservationId,
    pub name: String,
    #[serde(flatten)]
    pub span: Span,
    pub created_by: OwnerId,
}

impl Reservation {
    pub fn start(&self) -> Timestamp {
        self.span.start
    }

    pub fn end(&self) -> Timestamp {
        self.span.end
    }
}

/// Raw booking candidate, before admission. Fields stay textual so that
/// missing or unparseable input is reported by admission, not by serde.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReservationRequest {
    pub name: String,
    pub start: String,
    pub end: String,
    pub created_by: Option<OwnerId>,
}

impl ReservationRequest {
    pub fn new(name: impl Into<String>, span: Span, created_by: OwnerId) -> Self {
        Self {
            name: name.into(),
            start: format_timestamp(&span.start),
            end: format_timestamp(&span.end),
            created_by: Some(created_by),
        }
    }

    /// Build a request from separate date and time inputs. Blank inputs
    /// produce blank fields.
    pub fn from_form(
        name: &str,
        date: &str,
        start_time: &str,
        end_time: &str,
        created_by: OwnerId,
    ) -> Self {
        let join = |date: &str, time: &str| {
            let (date, time) = (date.trim(), time.trim());
            if date.is_empty() || time.is_empty() {
                String::new()
            } else {
                format!("{date} {time}")
            }
        };
        Self {
            name: name.trim().to_string(),
            start: join(date, start_time),
            end: join(date, end_time),
            created_by: Some(created_by),
        }
    }
}

/// Reservations sorted by `span.start`. Callers keep the contents
/// pairwise non-overlapping, which also makes the ends sorted.
#[derive(Debug, Clone, Default)]
pub struct ReservationSet {
    reservations: Vec<Reservation>,
}

impl ReservationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.iter()
    }

    pub fn as_slice(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn get(&self, id: ReservationId) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: ReservationId) -> bool {
        self.get(id).is_some()
    }

    /// Insert after any reservation with the same start.
    pub fn insert(&mut self, reservation: Reservation) {
        let pos = self
            .reservations
            .partition_point(|r| r.span.start <= reservation.span.start);
        self.reservations.insert(pos, reservation);
    }

    pub fn remove(&mut self, id: ReservationId) -> Option<Reservation> {
        let pos = self.reservations.iter().position(|r| r.id == id)?;
        Some(self.reservations.remove(pos))
    }

    /// Reservations overlapping `query`, found by binary search on both ends.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &Reservation> {
        // Everything at index >= right starts at or after query.end.
        let right = self
            .reservations
            .partition_point(|r| r.span.start < query.end);
        // Everything before left ends at or before query.start.
        let left = self.reservations[..right].partition_point(|r| r.span.end <= query.start);
        self.reservations[left..right]
            .iter()
            .filter(move |r| r.span.end > query.start)
    }
}

/// Mutation notifications, published after a change is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReservationEvent {
    Created { reservation: Reservation },
    Removed { id: ReservationId },
}
