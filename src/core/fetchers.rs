use crate::core::cache::{CacheKey, CacheOrigin, CacheRead, ExternalSourceCache};
use crate::core::calendar::MonthPeriod;
use crate::core::merger::SourceSnapshot;
use crate::domain::model::{
    FetchState, FormSubmission, OccupancyMap, OverlayEntry, PortalReservation,
    ReservationSummary, SourceOverlay, SourceTag,
};
use crate::domain::ports::{BookingCalendarSource, FormSource, ReservationStore};
use crate::utils::error::{ExternalFetchError, Result};
use chrono::{Days, NaiveDate};
use std::sync::Arc;
use std::time::Duration;

/// 入口網站預約：權威來源，失敗即整個請求失敗
pub struct InternalReservationFetcher {
    store: Arc<dyn ReservationStore>,
}

impl InternalReservationFetcher {
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        Self { store }
    }

    pub async fn fetch(&self, period: MonthPeriod) -> Result<SourceSnapshot> {
        let reservations = self
            .store
            .confirmed_overlapping(period.first_day(), period.last_day())
            .await?;

        tracing::debug!(period = %period, count = reservations.len(), "portal reservations loaded");
        Ok(SourceSnapshot::new(
            portal_overlay(period, &reservations),
            FetchState::Fresh,
        ))
    }
}

/// 入住表單（試算表），經由快取讀取
pub struct FormReservationFetcher {
    source: Arc<dyn FormSource>,
    cache: Arc<ExternalSourceCache<Vec<FormSubmission>>>,
    ttl: Duration,
}

impl FormReservationFetcher {
    pub fn new(
        source: Arc<dyn FormSource>,
        cache: Arc<ExternalSourceCache<Vec<FormSubmission>>>,
        ttl: Duration,
    ) -> Self {
        Self { source, cache, ttl }
    }

    pub async fn fetch(&self, period: MonthPeriod) -> SourceSnapshot {
        let key = CacheKey::new(SourceTag::Form, period.year(), period.month());
        let read = self
            .cache
            .get(key, self.ttl, move || async move {
                let rows = self.source.fetch_all().await?;
                Ok::<_, ExternalFetchError>(
                    rows.into_iter()
                        .filter(|row| period.overlaps_stay(row.checkin_date, form_checkout(row)))
                        .collect::<Vec<_>>(),
                )
            })
            .await;

        snapshot_from_cache(SourceTag::Form, period, read, |rows| {
            form_overlay(period, rows)
        })
    }
}

/// 第三方訂房網站的每日佔用，經由快取讀取
pub struct BookingSiteAvailabilityFetcher {
    source: Arc<dyn BookingCalendarSource>,
    cache: Arc<ExternalSourceCache<OccupancyMap>>,
    ttl: Duration,
    placeholder_name: String,
}

impl BookingSiteAvailabilityFetcher {
    pub fn new(
        source: Arc<dyn BookingCalendarSource>,
        cache: Arc<ExternalSourceCache<OccupancyMap>>,
        ttl: Duration,
        placeholder_name: impl Into<String>,
    ) -> Self {
        Self {
            source,
            cache,
            ttl,
            placeholder_name: placeholder_name.into(),
        }
    }

    pub async fn fetch(&self, period: MonthPeriod) -> SourceSnapshot {
        let key = CacheKey::new(SourceTag::External, period.year(), period.month());
        let read = self
            .cache
            .get(key, self.ttl, move || {
                self.source.fetch_month(period.year(), period.month())
            })
            .await;

        snapshot_from_cache(SourceTag::External, period, read, |occupancy| {
            booking_overlay(period, occupancy, &self.placeholder_name)
        })
    }
}

fn snapshot_from_cache<T>(
    source: SourceTag,
    period: MonthPeriod,
    read: std::result::Result<CacheRead<T>, ExternalFetchError>,
    build: impl FnOnce(&T) -> SourceOverlay,
) -> SourceSnapshot {
    match read {
        Ok(read) => {
            let state = match read.origin {
                CacheOrigin::Fetched => FetchState::Fresh,
                CacheOrigin::Hit => FetchState::Cached,
                CacheOrigin::Stale => FetchState::Stale,
            };
            if let Some(err) = &read.error {
                tracing::warn!(
                    source = %source,
                    period = %period,
                    error = %err,
                    "⚠️ serving stale data for degraded source"
                );
            }
            SourceSnapshot::new(build(&read.value), state)
        }
        Err(err) => {
            tracing::warn!(
                source = %source,
                period = %period,
                error = %err,
                "⚠️ source unavailable, contributing nothing"
            );
            SourceSnapshot::unavailable(source)
        }
    }
}

/// 表單沒填退房日（或退房日不在入住日之後）時視為住一晚
pub fn form_checkout(row: &FormSubmission) -> NaiveDate {
    row.checkout_date
        .filter(|checkout| *checkout > row.checkin_date)
        .unwrap_or_else(|| row.checkin_date + Days::new(1))
}

pub fn portal_overlay(period: MonthPeriod, reservations: &[PortalReservation]) -> SourceOverlay {
    let entries = reservations
        .iter()
        .map(|r| OverlayEntry {
            summary: ReservationSummary {
                id: Some(r.id),
                source: SourceTag::Portal,
                name: r.name.clone(),
                phone: r.phone.clone(),
                checkin_date: r.checkin_date,
                checkout_date: Some(r.checkout_date),
                guest_count: r.guest_count,
                meal_option: r.meal_option.clone(),
                notes: r.notes.clone(),
            },
            dates: period.nights_within(r.checkin_date, r.checkout_date),
        })
        .collect();

    SourceOverlay {
        source: SourceTag::Portal,
        entries,
    }
}

pub fn form_overlay(period: MonthPeriod, rows: &[FormSubmission]) -> SourceOverlay {
    let entries = rows
        .iter()
        .filter_map(|row| {
            let checkout = form_checkout(row);
            if !period.overlaps_stay(row.checkin_date, checkout) {
                return None;
            }

            Some(OverlayEntry {
                summary: ReservationSummary {
                    id: None,
                    source: SourceTag::Form,
                    name: row.name.clone(),
                    phone: row.phone.clone(),
                    checkin_date: row.checkin_date,
                    checkout_date: Some(checkout),
                    guest_count: row.guest_count,
                    meal_option: row.meal_option.clone(),
                    notes: row.notes.clone(),
                },
                dates: period.nights_within(row.checkin_date, checkout),
            })
        })
        .collect();

    SourceOverlay {
        source: SourceTag::Form,
        entries,
    }
}

/// 只有明確回報為已訂、且落在本月的日子才會覆蓋
pub fn booking_overlay(
    period: MonthPeriod,
    occupancy: &OccupancyMap,
    placeholder_name: &str,
) -> SourceOverlay {
    let entries = occupancy
        .iter()
        .filter(|(date, booked)| **booked && period.contains(**date))
        .map(|(date, _)| OverlayEntry {
            summary: ReservationSummary {
                id: None,
                source: SourceTag::External,
                name: placeholder_name.to_string(),
                phone: None,
                checkin_date: *date,
                checkout_date: None,
                guest_count: None,
                meal_option: None,
                notes: None,
            },
            dates: vec![*date],
        })
        .collect();

    SourceOverlay {
        source: SourceTag::External,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::CacheSettings;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn march() -> MonthPeriod {
        MonthPeriod::new(2025, 3).unwrap()
    }

    fn form_row(name: &str, checkin: NaiveDate, checkout: Option<NaiveDate>) -> FormSubmission {
        FormSubmission {
            name: name.to_string(),
            phone: None,
            checkin_date: checkin,
            checkout_date: checkout,
            guest_count: Some(2),
            meal_option: None,
            notes: None,
        }
    }

    struct MockFormSource {
        rows: Mutex<std::result::Result<Vec<FormSubmission>, ExternalFetchError>>,
        calls: AtomicUsize,
    }

    impl MockFormSource {
        fn new(rows: Vec<FormSubmission>) -> Self {
            Self {
                rows: Mutex::new(Ok(rows)),
                calls: AtomicUsize::new(0),
            }
        }

        fn fail(&self) {
            *self.rows.lock().unwrap() = Err(ExternalFetchError::Status {
                origin: SourceTag::Form,
                status: 500,
            });
        }
    }

    #[async_trait]
    impl FormSource for MockFormSource {
        async fn fetch_all(&self) -> std::result::Result<Vec<FormSubmission>, ExternalFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rows.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_portal_overlay_marks_nights_only() {
        let reservation = PortalReservation {
            id: 42,
            name: "Tanaka".to_string(),
            phone: Some("090-0000-0000".to_string()),
            checkin_date: date(3, 10),
            checkout_date: date(3, 12),
            guest_count: Some(3),
            meal_option: Some("dinner".to_string()),
            notes: None,
        };

        let overlay = portal_overlay(march(), &[reservation]);

        assert_eq!(overlay.entries.len(), 1);
        assert_eq!(overlay.entries[0].dates, vec![date(3, 10), date(3, 11)]);
        assert_eq!(overlay.entries[0].summary.id, Some(42));
        assert_eq!(overlay.entries[0].summary.checkout_date, Some(date(3, 12)));
    }

    #[test]
    fn test_form_row_without_checkout_is_single_night() {
        let overlay = form_overlay(march(), &[form_row("Suzuki", date(3, 15), None)]);

        assert_eq!(overlay.entries[0].dates, vec![date(3, 15)]);
        assert_eq!(overlay.entries[0].summary.checkout_date, Some(date(3, 16)));
        assert_eq!(overlay.entries[0].summary.id, None);
    }

    #[test]
    fn test_form_rows_outside_month_are_dropped() {
        let rows = vec![
            form_row("February", date(2, 10), Some(date(2, 12))),
            form_row("Crossing", date(2, 27), Some(date(3, 2))),
            form_row("April", date(4, 1), None),
        ];

        let overlay = form_overlay(march(), &rows);

        assert_eq!(overlay.entries.len(), 1);
        assert_eq!(overlay.entries[0].summary.name, "Crossing");
        assert_eq!(overlay.entries[0].dates, vec![date(3, 1)]);
    }

    #[test]
    fn test_form_checkout_before_checkin_falls_back_to_one_night() {
        let row = form_row("Typo", date(3, 20), Some(date(3, 18)));
        assert_eq!(form_checkout(&row), date(3, 21));
    }

    #[test]
    fn test_booking_overlay_uses_only_booked_days_in_month() {
        let occupancy: OccupancyMap = [
            (date(3, 20), true),
            (date(3, 21), false),
            (date(4, 1), true),
        ]
        .into_iter()
        .collect();

        let overlay = booking_overlay(march(), &occupancy, "External booking");

        assert_eq!(overlay.entries.len(), 1);
        let entry = &overlay.entries[0];
        assert_eq!(entry.dates, vec![date(3, 20)]);
        assert_eq!(entry.summary.id, None);
        assert_eq!(entry.summary.guest_count, None);
        assert_eq!(entry.summary.checkout_date, None);
        assert_eq!(entry.summary.name, "External booking");
        assert_eq!(entry.summary.source, SourceTag::External);
    }

    #[tokio::test]
    async fn test_form_fetcher_caches_per_month_and_degrades() {
        let source = Arc::new(MockFormSource::new(vec![
            form_row("Suzuki", date(3, 15), None),
            form_row("Ito", date(4, 2), None),
        ]));
        let cache = Arc::new(ExternalSourceCache::new(CacheSettings::default()));
        let fetcher = FormReservationFetcher::new(
            source.clone(),
            cache.clone(),
            Duration::from_secs(300),
        );

        let first = fetcher.fetch(march()).await;
        assert_eq!(first.state, FetchState::Fresh);
        assert_eq!(first.overlay.entries.len(), 1);

        let second = fetcher.fetch(march()).await;
        assert_eq!(second.state, FetchState::Cached);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        // 換月份是另一個快取鍵
        let april = fetcher.fetch(MonthPeriod::new(2025, 4).unwrap()).await;
        assert_eq!(april.overlay.entries[0].summary.name, "Ito");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        source.fail();
        cache.invalidate(SourceTag::Form);
        let stale = fetcher.fetch(march()).await;
        assert_eq!(stale.state, FetchState::Stale);
        assert_eq!(stale.overlay.entries.len(), 1);

        let never_seen = fetcher.fetch(MonthPeriod::new(2025, 5).unwrap()).await;
        assert_eq!(never_seen.state, FetchState::Unavailable);
        assert!(never_seen.overlay.entries.is_empty());
    }
}
