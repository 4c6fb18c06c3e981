//! Read-only projections of a reservation snapshot: the day filter, the
//! table ordering, and the timeline styling. Nothing here mutates its input
//! or keeps state between calls; callers re-run these on every change.

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::engine::free_slots;
use crate::model::*;

// ── Table ordering ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

pub fn toggle_sort_direction(current: SortDirection) -> SortDirection {
    current.toggle()
}

/// Stable sort by start; reservations with equal starts keep their input order
/// in both directions.
pub fn sort_by_start(reservations: &[Reservation], direction: SortDirection) -> Vec<Reservation> {
    let mut sorted = reservations.to_vec();
    match direction {
        SortDirection::Ascending => sorted.sort_by(|a, b| a.span.start.cmp(&b.span.start)),
        SortDirection::Descending => sorted.sort_by(|a, b| b.span.start.cmp(&a.span.start)),
    }
    sorted
}

// ── Day filter ───────────────────────────────────────────────────

/// Reservations starting on `date`, in input order.
pub fn filter_by_date(reservations: &[Reservation], date: NaiveDate) -> Vec<Reservation> {
    reservations
        .iter()
        .filter(|r| r.span.start.date() == date)
        .cloned()
        .collect()
}

/// `[date 00:00, date+1 00:00)`.
pub fn day_window(date: NaiveDate) -> Span {
    let start = date.and_time(NaiveTime::MIN);
    Span::new(start, start + TimeDelta::days(1))
}

/// Shift `window` earlier by `percentage` of its width; negative values
/// shift it later. The width is preserved. `None` if the shifted window
/// falls outside the representable calendar.
pub fn pan(window: &Span, percentage: f64) -> Option<Span> {
    let width = window.duration().num_minutes() as f64;
    let minutes = (width * percentage).round();
    if !minutes.is_finite() || minutes.abs() >= i64::MAX as f64 {
        return None;
    }
    let shift = TimeDelta::try_minutes(minutes as i64)?;
    let start = window.start.checked_sub_signed(shift)?;
    let end = window.end.checked_sub_signed(shift)?;
    Some(Span::new(start, end))
}

/// The date a visible window reports as current.
pub fn reference_date(window: &Span) -> NaiveDate {
    window.start.date()
}

// ── Ownership styling ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleToken {
    /// Empty slot. A view default, never derived from a reservation.
    Available,
    Reserved,
    MyReservation,
}

impl StyleToken {
    pub fn class(self) -> &'static str {
        match self {
            StyleToken::Available => "available",
            StyleToken::Reserved => "reserved",
            StyleToken::MyReservation => "my-reservation",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            StyleToken::Available => "#e8f4fd",
            StyleToken::Reserved => "#fff48c",
            StyleToken::MyReservation => "#91feb5",
        }
    }

    pub fn css(self) -> String {
        format!("background-color: {}; border-color: {};", self.color(), self.color())
    }
}

pub fn style_for(reservation: &Reservation, viewer: OwnerId) -> StyleToken {
    if reservation.created_by == viewer {
        StyleToken::MyReservation
    } else {
        StyleToken::Reserved
    }
}

/// Legend entries in display order.
pub fn legend() -> [StyleToken; 3] {
    [
        StyleToken::Available,
        StyleToken::Reserved,
        StyleToken::MyReservation,
    ]
}

// ── Timeline ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineItem {
    pub id: ReservationId,
    pub content: String,
    #[serde(flatten)]
    pub span: Span,
    #[serde(rename = "className")]
    pub token: StyleToken,
    pub style: String,
}

pub fn timeline_item(reservation: &Reservation, viewer: OwnerId) -> TimelineItem {
    let token = style_for(reservation, viewer);
    TimelineItem {
        id: reservation.id,
        content: reservation.name.clone(),
        span: reservation.span,
        token,
        style: token.css(),
    }
}

pub fn timeline_items(reservations: &[Reservation], viewer: OwnerId) -> Vec<TimelineItem> {
    reservations.iter().map(|r| timeline_item(r, viewer)).collect()
}

/// Everything a day screen shows, derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayView {
    pub date: NaiveDate,
    pub direction: SortDirection,
    pub rows: Vec<Reservation>,
    pub timeline: Vec<TimelineItem>,
    pub free: Vec<Span>,
}

pub fn day_view(
    reservations: &[Reservation],
    date: NaiveDate,
    direction: SortDirection,
    viewer: OwnerId,
) -> DayView {
    let today = filter_by_date(reservations, date);
    DayView {
        date,
        direction,
        rows: sort_by_start(&today, direction),
        timeline: timeline_items(&today, viewer),
        free: free_slots(&today, &day_window(date)),
    }
}
