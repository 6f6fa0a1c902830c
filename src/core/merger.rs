use crate::core::calendar::MonthCalendar;
use crate::domain::model::{
    AvailabilityReport, FetchState, ReservationSummary, SourceOverlay, SourceTag,
};

/// 三個來源的覆蓋資料與各自的取得狀態
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    pub overlay: SourceOverlay,
    pub state: FetchState,
}

impl SourceSnapshot {
    pub fn new(overlay: SourceOverlay, state: FetchState) -> Self {
        Self { overlay, state }
    }

    pub fn unavailable(source: SourceTag) -> Self {
        Self::new(SourceOverlay::empty(source), FetchState::Unavailable)
    }
}

/// 把單一來源覆蓋到日曆上
///
/// 只會把日子標成 booked，從不清除；月外的日期直接忽略。
pub fn apply_overlay(mut calendar: MonthCalendar, overlay: &SourceOverlay) -> MonthCalendar {
    for entry in &overlay.entries {
        for date in &entry.dates {
            if let Some(day) = calendar.day_mut(*date) {
                day.book(entry.summary.clone());
            }
        }
    }
    calendar
}

/// 依固定順序 portal → form → external 合併三個來源
pub struct AvailabilityMerger;

impl AvailabilityMerger {
    pub fn merge(
        calendar: MonthCalendar,
        portal: &SourceSnapshot,
        form: &SourceSnapshot,
        external: &SourceSnapshot,
    ) -> AvailabilityReport {
        let period = calendar.period();
        let snapshots = [portal, form, external];

        let calendar = snapshots
            .iter()
            .fold(calendar, |calendar, snapshot| {
                apply_overlay(calendar, &snapshot.overlay)
            });

        let reservations = Self::flatten_reservations(snapshots.iter().map(|s| &s.overlay));

        let degraded = snapshots
            .iter()
            .filter(|s| s.state.is_degraded())
            .map(|s| s.overlay.source)
            .collect();

        AvailabilityReport {
            success: true,
            year: period.year(),
            month: period.month(),
            data: calendar.into_days(),
            reservations,
            degraded,
        }
    }

    /// 攤平所有摘要並依入住日排序；同日時保留來源順序（穩定排序）
    pub fn flatten_reservations<'a>(
        overlays: impl IntoIterator<Item = &'a SourceOverlay>,
    ) -> Vec<ReservationSummary> {
        let mut reservations: Vec<ReservationSummary> = overlays
            .into_iter()
            .flat_map(|overlay| overlay.summaries().cloned())
            .collect();

        reservations.sort_by_key(|summary| summary.checkin_date);
        reservations
    }
}
