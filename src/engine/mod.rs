mod admission;
mod availability;
mod conflict;
mod error;
mod store;
#[cfg(test)]
mod tests;

pub use admission::{admit, propose_reservation, remove_reservation, Admitted, IdSource, SequentialIds};
pub use availability::{free_slots, merge_overlapping, subtract_intervals};
pub use conflict::local_now;
pub use error::{AdmissionError, StoreError};
pub use store::{InMemoryStore, ReservationStore};

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::model::*;
use crate::notify::NotifyHub;
use crate::observability;
use crate::view::{self, DayView, SortDirection};

/// Gate for every mutation of a reservation store.
///
/// Check and insert run under one async mutex, and the store re-validates
/// overlap at commit time, so a snapshot that went stale between the two
/// still cannot produce overlapping reservations.
pub struct Scheduler {
    store: Arc<dyn ReservationStore>,
    ids: Arc<dyn IdSource>,
    notify: Arc<NotifyHub>,
    admission: Mutex<()>,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        ids: Arc<dyn IdSource>,
        notify: Arc<NotifyHub>,
    ) -> Self {
        Self {
            store,
            ids,
            notify,
            admission: Mutex::new(()),
        }
    }

    /// Scheduler over an in-memory store seeded with `seed`.
    pub fn in_memory(seed: Vec<Reservation>) -> Result<Self, StoreError> {
        let ids = Arc::new(SequentialIds::after(&seed).ok_or(StoreError::IdsExhausted)?);
        let store = Arc::new(InMemoryStore::with_reservations(seed)?);
        Ok(Self::new(store, ids, Arc::new(NotifyHub::new())))
    }

    pub fn notify(&self) -> &Arc<NotifyHub> {
        &self.notify
    }

    /// Snapshot read. Runs concurrently with other reads.
    pub async fn reservations(&self) -> Result<Vec<Reservation>, AdmissionError> {
        Ok(self.store.list_all().await?)
    }

    /// Admit and commit a new reservation. `now` is the caller's clock reading.
    pub async fn book(
        &self,
        request: &ReservationRequest,
        now: Timestamp,
    ) -> Result<Reservation, AdmissionError> {
        let started = Instant::now();
        let _guard = self.admission.lock().await;

        let result = self.book_locked(request, now).await;

        metrics::histogram!(observability::ADMISSION_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        metrics::counter!(observability::ADMISSIONS_TOTAL, "outcome" => observability::outcome_label(&result))
            .increment(1);

        match &result {
            Ok(reservation) => {
                info!(
                    id = %reservation.id,
                    span = %reservation.span,
                    created_by = %reservation.created_by,
                    "reservation booked"
                );
                self.notify.send(&ReservationEvent::Created {
                    reservation: reservation.clone(),
                });
            }
            Err(AdmissionError::Storage(e)) => warn!("booking failed in store: {e}"),
            Err(e) => debug!(kind = e.kind(), "booking rejected: {e}"),
        }
        result
    }

    async fn book_locked(
        &self,
        request: &ReservationRequest,
        now: Timestamp,
    ) -> Result<Reservation, AdmissionError> {
        let snapshot = self.store.list_all().await?;
        let reservation = propose_reservation(request, &snapshot, now, self.ids.as_ref())?;
        let committed = self.store.insert(reservation).await?;
        metrics::gauge!(observability::RESERVATIONS_ACTIVE).set((snapshot.len() + 1) as f64);
        Ok(committed)
    }

    /// Remove a reservation by id.
    pub async fn cancel(&self, id: ReservationId) -> Result<ReservationId, AdmissionError> {
        let _guard = self.admission.lock().await;

        let result = self.cancel_locked(id).await;

        metrics::counter!(observability::CANCELLATIONS_TOTAL, "outcome" => observability::outcome_label(&result))
            .increment(1);

        match &result {
            Ok(id) => {
                info!(%id, "reservation cancelled");
                self.notify.send(&ReservationEvent::Removed { id: *id });
            }
            Err(AdmissionError::Storage(e)) => warn!("cancellation failed in store: {e}"),
            Err(e) => debug!(kind = e.kind(), "cancellation rejected: {e}"),
        }
        result
    }

    async fn cancel_locked(&self, id: ReservationId) -> Result<ReservationId, AdmissionError> {
        let snapshot = self.store.list_all().await?;
        remove_reservation(id, &snapshot)?;
        let removed = self.store.remove_by_id(id).await?;
        metrics::gauge!(observability::RESERVATIONS_ACTIVE).set(snapshot.len().saturating_sub(1) as f64);
        Ok(removed)
    }

    /// Derived views for one day, computed from a fresh snapshot.
    pub async fn day_view(
        &self,
        date: NaiveDate,
        direction: SortDirection,
        viewer: OwnerId,
    ) -> Result<DayView, AdmissionError> {
        let snapshot = self.reservations().await?;
        Ok(view::day_view(&snapshot, date, direction, viewer))
    }
}
