use crate::engine::AdmissionError;

/// Counter: booking attempts. Labels: outcome.
pub const ADMISSIONS_TOTAL: &str = "roomslot_admissions_total";

/// Counter: cancellation attempts. Labels: outcome.
pub const CANCELLATIONS_TOTAL: &str = "roomslot_cancellations_total";

/// Histogram: time from booking request to commit or rejection, in seconds.
pub const ADMISSION_DURATION_SECONDS: &str = "roomslot_admission_duration_seconds";

/// Gauge: reservations currently stored.
pub const RESERVATIONS_ACTIVE: &str = "roomslot_reservations_active";

/// `ok` or the error kind.
pub fn outcome_label<T>(result: &Result<T, AdmissionError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    }
}
