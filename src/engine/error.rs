use crate::model::ReservationId;

/// Why a reservation could not be admitted or removed. All of these are
/// ordinary business outcomes; the caller decides how to surface them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// A required field is missing or unparseable.
    MalformedInput(&'static str),
    InvalidOrder,
    PastStart,
    /// Overlaps the carried reservation.
    Conflict(ReservationId),
    NotFound(ReservationId),
    /// The storage collaborator failed for a reason other than overlap or absence.
    Storage(String),
}

impl AdmissionError {
    /// Machine-readable kind, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            AdmissionError::MalformedInput(_) => "malformed_input",
            AdmissionError::InvalidOrder => "invalid_order",
            AdmissionError::PastStart => "past_start",
            AdmissionError::Conflict(_) => "conflict",
            AdmissionError::NotFound(_) => "not_found",
            AdmissionError::Storage(_) => "storage",
        }
    }

    pub fn conflicting_id(&self) -> Option<ReservationId> {
        match self {
            AdmissionError::Conflict(id) => Some(*id),
            _ => None,
        }
    }
}

impl std::fmt::Display for AdmissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdmissionError::MalformedInput(field) => write!(f, "malformed input: {field}"),
            AdmissionError::InvalidOrder => write!(f, "start must precede end"),
            AdmissionError::PastStart => write!(f, "start cannot be earlier than now"),
            AdmissionError::Conflict(id) => {
                write!(f, "overlaps an existing reservation: {id}")
            }
            AdmissionError::NotFound(id) => write!(f, "reservation not found: {id}"),
            AdmissionError::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for AdmissionError {}

/// Failures reported by a `ReservationStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Overlap detected at commit time against the then-current set.
    Conflict(ReservationId),
    NotFound(ReservationId),
    AlreadyExists(ReservationId),
    /// The record's start does not precede its end.
    InvalidSpan(ReservationId),
    /// No further ids can be allocated above the seed.
    IdsExhausted,
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Conflict(id) => write!(f, "conflict with reservation: {id}"),
            StoreError::NotFound(id) => write!(f, "not found: {id}"),
            StoreError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            StoreError::InvalidSpan(id) => write!(f, "start must precede end: {id}"),
            StoreError::IdsExhausted => write!(f, "reservation ids exhausted"),
            StoreError::Unavailable(e) => write!(f, "store unavailable: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for AdmissionError {
    fn from(e: StoreError) -> Self {
        match e {
            // A race lost at commit time is the same overlap the caller
            // would have seen with a fresher snapshot.
            StoreError::Conflict(id) => AdmissionError::Conflict(id),
            StoreError::NotFound(id) => AdmissionError::NotFound(id),
            other @ (StoreError::AlreadyExists(_)
            | StoreError::InvalidSpan(_)
            | StoreError::IdsExhausted
            | StoreError::Unavailable(_)) => AdmissionError::Storage(other.to_string()),
        }
    }
}
