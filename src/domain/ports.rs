use crate::domain::model::{FormSubmission, OccupancyMap, PortalReservation};
use crate::utils::error::{ExternalFetchError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;

/// 入口網站自己的預約資料表（權威來源）
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// 回傳 `[checkin, checkout)` 與 `[start, end]` 相交的已確認預約
    async fn confirmed_overlapping(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PortalReservation>>;
}

/// 入住表單試算表：只提供「全部提交資料」，篩選由引擎自行處理
#[async_trait]
pub trait FormSource: Send + Sync {
    async fn fetch_all(&self) -> std::result::Result<Vec<FormSubmission>, ExternalFetchError>;
}

/// 第三方訂房網站的日曆
#[async_trait]
pub trait BookingCalendarSource: Send + Sync {
    async fn fetch_month(
        &self,
        year: i32,
        month: u32,
    ) -> std::result::Result<OccupancyMap, ExternalFetchError>;
}
