use crate::core::cache::{CacheSettings, ExternalSourceCache};
use crate::core::calendar::{MonthCalendar, MonthPeriod};
use crate::core::fetchers::{
    BookingSiteAvailabilityFetcher, FormReservationFetcher, InternalReservationFetcher,
};
use crate::core::merger::AvailabilityMerger;
use crate::core::refresh::RefreshCommand;
use crate::domain::model::{AvailabilityReport, FormSubmission, OccupancyMap, SourceTag};
use crate::domain::ports::{BookingCalendarSource, FormSource, ReservationStore};
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub form_ttl: Duration,
    pub booking_ttl: Duration,
    pub cache: CacheSettings,
    pub placeholder_name: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            form_ttl: Duration::from_secs(300),
            booking_ttl: Duration::from_secs(600),
            cache: CacheSettings::default(),
            placeholder_name: "External booking".to_string(),
        }
    }
}

pub struct AvailabilityEngine {
    internal: InternalReservationFetcher,
    form: FormReservationFetcher,
    external: BookingSiteAvailabilityFetcher,
    refresh: RefreshCommand,
}

impl AvailabilityEngine {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        form_source: Arc<dyn FormSource>,
        booking_source: Arc<dyn BookingCalendarSource>,
        settings: EngineSettings,
    ) -> Self {
        let form_cache: Arc<ExternalSourceCache<Vec<FormSubmission>>> =
            Arc::new(ExternalSourceCache::new(settings.cache));
        let booking_cache: Arc<ExternalSourceCache<OccupancyMap>> =
            Arc::new(ExternalSourceCache::new(settings.cache));

        let refresh = RefreshCommand::new()
            .with_target(SourceTag::Form, form_cache.clone())
            .with_target(SourceTag::External, booking_cache.clone());

        Self {
            internal: InternalReservationFetcher::new(store),
            form: FormReservationFetcher::new(form_source, form_cache, settings.form_ttl),
            external: BookingSiteAvailabilityFetcher::new(
                booking_source,
                booking_cache,
                settings.booking_ttl,
                settings.placeholder_name,
            ),
            refresh,
        }
    }

    /// 查詢某年某月的每日空房狀態與預約清單
    ///
    /// 三個來源同時抓取；只有入口網站資料表失敗會讓整個請求失敗，
    /// 外部來源失敗時改用過期快取或直接略過。
    pub async fn availability(&self, year: i32, month: u32) -> Result<AvailabilityReport> {
        let period = MonthPeriod::new(year, month)?;
        let calendar = MonthCalendar::empty(period);
        let started = Instant::now();

        let (portal, form, external) = tokio::join!(
            self.internal.fetch(period),
            self.form.fetch(period),
            self.external.fetch(period),
        );

        let portal = portal.map_err(|e| {
            tracing::error!(period = %period, error = %e, "❌ portal reservation query failed");
            e
        })?;

        let report = AvailabilityMerger::merge(calendar, &portal, &form, &external);

        tracing::info!(
            period = %period,
            booked_days = report.data.values().filter(|d| d.is_booked()).count(),
            reservations = report.reservations.len(),
            form = ?form.state,
            external = ?external.state,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "availability assembled"
        );

        Ok(report)
    }

    pub fn refresh_command(&self) -> &RefreshCommand {
        &self.refresh
    }
}
