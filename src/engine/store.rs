use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::model::*;

use super::conflict::first_overlap;
use super::StoreError;

/// Storage collaborator. A remote implementation must re-check overlap at
/// commit time and reject with `StoreError::Conflict`.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Snapshot of every stored reservation.
    async fn list_all(&self) -> Result<Vec<Reservation>, StoreError>;

    /// Insert if no stored reservation overlaps.
    async fn insert(&self, reservation: Reservation) -> Result<Reservation, StoreError>;

    async fn remove_by_id(&self, id: ReservationId) -> Result<ReservationId, StoreError>;
}

pub struct InMemoryStore {
    reservations: RwLock<ReservationSet>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            reservations: RwLock::new(ReservationSet::new()),
        }
    }

    /// Seed the store. Fails on duplicate ids, inverted or empty spans, and
    /// overlapping seeds.
    pub fn with_reservations(
        seed: impl IntoIterator<Item = Reservation>,
    ) -> Result<Self, StoreError> {
        let mut set = ReservationSet::new();
        for reservation in seed {
            insert_checked(&mut set, reservation)?;
        }
        Ok(Self {
            reservations: RwLock::new(set),
        })
    }

    pub async fn len(&self) -> usize {
        self.reservations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.reservations.read().await.is_empty()
    }
}

fn insert_checked(set: &mut ReservationSet, reservation: Reservation) -> Result<(), StoreError> {
    if set.contains(reservation.id) {
        return Err(StoreError::AlreadyExists(reservation.id));
    }
    if !is_chronologically_valid(reservation.start(), reservation.end()) {
        return Err(StoreError::InvalidSpan(reservation.id));
    }
    if let Some(existing) = first_overlap(set, &reservation.span) {
        return Err(StoreError::Conflict(existing));
    }
    set.insert(reservation);
    Ok(())
}

#[async_trait]
impl ReservationStore for InMemoryStore {
    async fn list_all(&self) -> Result<Vec<Reservation>, StoreError> {
        Ok(self.reservations.read().await.as_slice().to_vec())
    }

    async fn insert(&self, reservation: Reservation) -> Result<Reservation, StoreError> {
        let mut guard = self.reservations.write().await;
        insert_checked(&mut guard, reservation.clone())?;
        Ok(reservation)
    }

    async fn remove_by_id(&self, id: ReservationId) -> Result<ReservationId, StoreError> {
        let mut guard = self.reservations.write().await;
        guard
            .remove(id)
            .map(|r| r.id)
            .ok_or(StoreError::NotFound(id))
    }
}
