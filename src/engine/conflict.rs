use crate::model::*;

use super::AdmissionError;

/// Current local time truncated to the minute. Only read at the outer
/// edge (binary, bench); the engine always takes `now` as a parameter.
pub fn local_now() -> Timestamp {
    truncate_to_minute(chrono::Local::now().naive_local())
}

/// Required fields present and parseable.
pub(crate) fn parse_fields(
    request: &ReservationRequest,
) -> Result<(String, Timestamp, Timestamp, OwnerId), AdmissionError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AdmissionError::MalformedInput("name"));
    }
    let start = parse_timestamp(&request.start).ok_or(AdmissionError::MalformedInput("start"))?;
    let end = parse_timestamp(&request.end).ok_or(AdmissionError::MalformedInput("end"))?;
    let created_by = request
        .created_by
        .ok_or(AdmissionError::MalformedInput("createdBy"))?;
    Ok((name.to_string(), start, end, created_by))
}

/// Order first, then past-start.
pub(crate) fn validate_span(start: Timestamp, end: Timestamp, now: Timestamp) -> Result<Span, AdmissionError> {
    let span = Span::try_new(start, end).ok_or(AdmissionError::InvalidOrder)?;
    if !is_not_in_past(span.start, now) {
        return Err(AdmissionError::PastStart);
    }
    Ok(span)
}

/// First reservation in `existing` (input order) overlapping `span`.
pub(crate) fn check_no_conflict(existing: &[Reservation], span: &Span) -> Result<(), AdmissionError> {
    match existing.iter().find(|r| overlaps(&r.span, span)) {
        Some(r) => Err(AdmissionError::Conflict(r.id)),
        None => Ok(()),
    }
}

/// Sorted-set variant used at the storage boundary.
pub(crate) fn first_overlap(set: &ReservationSet, span: &Span) -> Option<ReservationId> {
    set.overlapping(span).next().map(|r| r.id)
}
