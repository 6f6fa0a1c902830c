use crate::domain::model::PortalReservation;
use crate::domain::ports::ReservationStore;
use crate::utils::error::{AvailabilityError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Row};
use std::path::Path;
use tracing::instrument;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reservations (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT    NOT NULL,
    phone         TEXT,
    checkin_date  TEXT    NOT NULL,
    checkout_date TEXT    NOT NULL,
    guest_count   INTEGER,
    meal_option   TEXT,
    notes         TEXT,
    status        TEXT    NOT NULL DEFAULT 'confirmed'
);
CREATE INDEX IF NOT EXISTS idx_reservations_stay
    ON reservations (status, checkin_date, checkout_date);
";

/// 寫入用的預約資料（id 由資料庫產生）
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub name: String,
    pub phone: Option<String>,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    pub guest_count: Option<u32>,
    pub meal_option: Option<String>,
    pub notes: Option<String>,
    pub status: String,
}

/// SQLite 上的入口網站預約資料表
#[derive(Clone)]
pub struct SqliteReservationStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteReservationStore {
    pub fn open<P: AsRef<Path>>(path: P, pool_size: u32) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(pool_size).build(manager)?;
        let store = Self { pool };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub async fn insert(&self, reservation: NewReservation) -> Result<i64> {
        let pool = self.pool.clone();
        run_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO reservations
                    (name, phone, checkin_date, checkout_date, guest_count, meal_option, notes, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    reservation.name,
                    reservation.phone,
                    reservation.checkin_date.to_string(),
                    reservation.checkout_date.to_string(),
                    reservation.guest_count,
                    reservation.meal_option,
                    reservation.notes,
                    reservation.status,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }
}

#[async_trait]
impl ReservationStore for SqliteReservationStore {
    #[instrument(skip(self))]
    async fn confirmed_overlapping(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PortalReservation>> {
        let pool = self.pool.clone();
        run_blocking(move || {
            let conn = pool.get()?;
            // ISO 日期字串可直接做字典序比較
            let mut stmt = conn.prepare(
                "SELECT id, name, phone, checkin_date, checkout_date, guest_count, meal_option, notes
                 FROM reservations
                 WHERE status = 'confirmed'
                   AND ((checkin_date BETWEEN ?1 AND ?2)
                     OR (checkout_date BETWEEN ?1 AND ?2)
                     OR (checkin_date <= ?1 AND checkout_date >= ?2))
                 ORDER BY checkin_date, id",
            )?;

            let rows = stmt.query_map(params![start.to_string(), end.to_string()], map_row)?;
            let reservations = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            tracing::debug!(count = reservations.len(), "confirmed reservations queried");
            Ok(reservations)
        })
        .await
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<PortalReservation> {
    Ok(PortalReservation {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        checkin_date: parse_date_column(row, 3)?,
        checkout_date: parse_date_column(row, 4)?,
        guest_count: row.get(5)?,
        meal_option: row.get(6)?,
        notes: row.get(7)?,
    })
}

fn parse_date_column(row: &Row<'_>, index: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(index)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

async fn run_blocking<T, F>(job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| AvailabilityError::store(format!("blocking task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn new_reservation(
        name: &str,
        checkin: NaiveDate,
        checkout: NaiveDate,
        status: &str,
    ) -> NewReservation {
        NewReservation {
            name: name.to_string(),
            phone: Some("090-1234-5678".to_string()),
            checkin_date: checkin,
            checkout_date: checkout,
            guest_count: Some(2),
            meal_option: Some("dinner".to_string()),
            notes: None,
            status: status.to_string(),
        }
    }

    #[tokio::test]
    async fn test_confirmed_overlapping_applies_month_rule_and_status() {
        let dir = TempDir::new().unwrap();
        let store = SqliteReservationStore::open(dir.path().join("portal.sqlite3"), 2).unwrap();

        store
            .insert(new_reservation("Inside", date(3, 10), date(3, 12), "confirmed"))
            .await
            .unwrap();
        store
            .insert(new_reservation("Arriving", date(2, 27), date(3, 2), "confirmed"))
            .await
            .unwrap();
        store
            .insert(new_reservation("Spanning", date(2, 1), date(4, 30), "confirmed"))
            .await
            .unwrap();
        store
            .insert(new_reservation("April", date(4, 1), date(4, 3), "confirmed"))
            .await
            .unwrap();
        store
            .insert(new_reservation("Cancelled", date(3, 5), date(3, 6), "cancelled"))
            .await
            .unwrap();

        let found = store
            .confirmed_overlapping(date(3, 1), date(3, 31))
            .await
            .unwrap();

        let names: Vec<&str> = found.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Spanning", "Arriving", "Inside"]);
        assert_eq!(found[2].checkout_date, date(3, 12));
        assert_eq!(found[2].guest_count, Some(2));
    }

    #[tokio::test]
    async fn test_reopening_keeps_existing_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("portal.sqlite3");

        let id = {
            let store = SqliteReservationStore::open(&path, 1).unwrap();
            store
                .insert(new_reservation("Kept", date(3, 1), date(3, 3), "confirmed"))
                .await
                .unwrap()
        };

        let store = SqliteReservationStore::open(&path, 1).unwrap();
        let found = store.confirmed_overlapping(date(3, 1), date(3, 31)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
    }
}
