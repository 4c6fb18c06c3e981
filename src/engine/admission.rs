use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::*;

use super::conflict::{check_no_conflict, parse_fields, validate_span};
use super::AdmissionError;

/// Hands out reservation ids.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> ReservationId;
}

/// Monotonic ids starting at a given value; an id is never handed out twice.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl SequentialIds {
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Continue after the largest id already in use. `None` when that id
    /// is `u64::MAX` and nothing is left to hand out.
    pub fn after(existing: &[Reservation]) -> Option<Self> {
        let max = existing.iter().map(|r| r.id.0).max().unwrap_or(0);
        max.checked_add(1).map(Self::starting_at)
    }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> ReservationId {
        ReservationId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// A candidate that passed every admission check but has no id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admitted {
    pub name: String,
    pub span: Span,
    pub created_by: OwnerId,
}

impl Admitted {
    pub fn into_reservation(self, id: ReservationId) -> Reservation {
        Reservation {
            id,
            name: self.name,
            span: self.span,
            created_by: self.created_by,
        }
    }
}

/// Decide admissibility of `candidate` against a snapshot.
///
/// Checks run in order and the first failure wins:
/// 1. required fields present and parseable (`MalformedInput`)
/// 2. `start < end` (`InvalidOrder`)
/// 3. `start >= now` (`PastStart`)
/// 4. no overlap with any reservation in `existing` (`Conflict`)
///
/// Pure: the same inputs always give the same result.
pub fn admit(
    candidate: &ReservationRequest,
    existing: &[Reservation],
    now: Timestamp,
) -> Result<Admitted, AdmissionError> {
    let (name, start, end, created_by) = parse_fields(candidate)?;
    let span = validate_span(start, end, now)?;
    check_no_conflict(existing, &span)?;
    Ok(Admitted {
        name,
        span,
        created_by,
    })
}

/// `admit`, then assign a fresh id. The caller inserts the result; proposal
/// and insertion must happen under the same exclusion (see `Scheduler`).
pub fn propose_reservation(
    candidate: &ReservationRequest,
    existing: &[Reservation],
    now: Timestamp,
    ids: &dyn IdSource,
) -> Result<Reservation, AdmissionError> {
    let admitted = admit(candidate, existing, now)?;
    Ok(admitted.into_reservation(ids.next_id()))
}

/// Check that `id` exists in `existing`. The caller performs the removal.
pub fn remove_reservation(
    id: ReservationId,
    existing: &[Reservation],
) -> Result<ReservationId, AdmissionError> {
    if existing.iter().any(|r| r.id == id) {
        Ok(id)
    } else {
        Err(AdmissionError::NotFound(id))
    }
}
