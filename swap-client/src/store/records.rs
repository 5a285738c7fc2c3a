//! Persisted booking and station records.

use std::sync::Arc;

use crate::domain::{Booking, BookingId, StationSummary};

use super::{Store, StoreError, keys};

/// Typed access to the booking-related entries of the [`Store`].
///
/// Each booking is stored under its own key; `booking:current` only
/// points at the id of the booking this client created or loaded last.
#[derive(Debug, Clone)]
pub struct BookingRecords {
    store: Arc<Store>,
}

impl BookingRecords {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// The current booking, if one is recorded and its copy still exists.
    pub async fn current(&self) -> Result<Option<Booking>, StoreError> {
        let Some(id) = self.store.get::<BookingId>(keys::CURRENT_BOOKING).await? else {
            return Ok(None);
        };
        self.get(id).await
    }

    pub async fn get(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        self.store.get(&keys::booking(id)).await
    }

    /// Store a booking copy without changing which booking is current.
    pub async fn save(&self, booking: &Booking) -> Result<(), StoreError> {
        self.store.set(&keys::booking(booking.id), booking).await
    }

    /// Store a booking copy and make it the current booking.
    pub async fn save_current(&self, booking: &Booking) -> Result<(), StoreError> {
        let value = serde_json::to_value(booking).map_err(|e| StoreError::Json {
            key: keys::booking(booking.id),
            message: e.to_string(),
        })?;
        let id = booking.id;
        self.store
            .update(move |entries| {
                entries.insert(keys::booking(id), value);
                entries.insert(keys::CURRENT_BOOKING.to_string(), id.0.into());
            })
            .await
    }

    /// Remember a draft whose payment link could not be obtained.
    pub async fn record_orphan(&self, id: BookingId) -> Result<(), StoreError> {
        let mut orphans = self.orphans().await?;
        if !orphans.contains(&id) {
            orphans.push(id);
        }
        self.store.set(keys::ORPHANED_DRAFTS, &orphans).await
    }

    /// Drafts awaiting manual reconciliation, oldest first.
    pub async fn orphans(&self) -> Result<Vec<BookingId>, StoreError> {
        Ok(self
            .store
            .get(keys::ORPHANED_DRAFTS)
            .await?
            .unwrap_or_default())
    }

    pub async fn select_station(&self, station: &StationSummary) -> Result<(), StoreError> {
        self.store.set(keys::SELECTED_STATION, station).await
    }

    pub async fn selected_station(&self) -> Result<Option<StationSummary>, StoreError> {
        self.store.get(keys::SELECTED_STATION).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookingState, sample_booking, sample_station};
    use tempfile::tempdir;

    fn records(dir: &tempfile::TempDir) -> BookingRecords {
        BookingRecords::new(Arc::new(Store::open(dir.path().join("store.json"))))
    }

    #[tokio::test]
    async fn no_current_booking_initially() {
        let dir = tempdir().unwrap();
        assert!(records(&dir).current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_current_then_load() {
        let dir = tempdir().unwrap();
        let records = records(&dir);
        let booking = sample_booking(42, BookingState::Confirmed);

        records.save_current(&booking).await.unwrap();
        assert_eq!(records.current().await.unwrap(), Some(booking.clone()));
        assert_eq!(records.get(BookingId(42)).await.unwrap(), Some(booking));
    }

    #[tokio::test]
    async fn save_keeps_current_pointer() {
        let dir = tempdir().unwrap();
        let records = records(&dir);

        records
            .save_current(&sample_booking(42, BookingState::Confirmed))
            .await
            .unwrap();
        records
            .save(&sample_booking(99, BookingState::Confirmed))
            .await
            .unwrap();

        assert_eq!(records.current().await.unwrap().unwrap().id, BookingId(42));
        assert!(records.get(BookingId(99)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn bookings_do_not_overwrite_each_other() {
        let dir = tempdir().unwrap();
        let records = records(&dir);

        records
            .save_current(&sample_booking(1, BookingState::Confirmed))
            .await
            .unwrap();
        records
            .save_current(&sample_booking(2, BookingState::CheckedIn))
            .await
            .unwrap();

        assert_eq!(
            records.get(BookingId(1)).await.unwrap().unwrap().state(),
            BookingState::Confirmed
        );
        assert_eq!(records.current().await.unwrap().unwrap().id, BookingId(2));
    }

    #[tokio::test]
    async fn orphans_are_deduplicated() {
        let dir = tempdir().unwrap();
        let records = records(&dir);

        records.record_orphan(BookingId(5)).await.unwrap();
        records.record_orphan(BookingId(6)).await.unwrap();
        records.record_orphan(BookingId(5)).await.unwrap();

        assert_eq!(
            records.orphans().await.unwrap(),
            vec![BookingId(5), BookingId(6)]
        );
    }

    #[tokio::test]
    async fn selected_station_roundtrip() {
        let dir = tempdir().unwrap();
        let records = records(&dir);
        let station = sample_station("7", "Downtown Hub", "123 Main St");

        records.select_station(&station).await.unwrap();
        assert_eq!(records.selected_station().await.unwrap(), Some(station));
    }
}
