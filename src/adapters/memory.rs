use crate::domain::model::PortalReservation;
use crate::domain::ports::ReservationStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::RwLock;

/// 記憶體內的預約資料表，測試與示範用
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationStore {
    reservations: Arc<RwLock<Vec<PortalReservation>>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reservations(reservations: Vec<PortalReservation>) -> Self {
        Self {
            reservations: Arc::new(RwLock::new(reservations)),
        }
    }

    pub async fn insert(&self, reservation: PortalReservation) {
        self.reservations.write().await.push(reservation);
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn confirmed_overlapping(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PortalReservation>> {
        let reservations = self.reservations.read().await;
        Ok(reservations
            .iter()
            .filter(|r| {
                (r.checkin_date >= start && r.checkin_date <= end)
                    || (r.checkout_date >= start && r.checkout_date <= end)
                    || (r.checkin_date <= start && r.checkout_date >= end)
            })
            .cloned()
            .collect())
    }
}
