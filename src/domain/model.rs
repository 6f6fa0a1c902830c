use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 預約資料的來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Portal,
    Form,
    External,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Portal => "portal",
            SourceTag::Form => "form",
            SourceTag::External => "external",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Available,
    Booked,
}

/// 每日來源的有序集合：插入時去重，保留插入順序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceSet(Vec<SourceTag>);

impl SourceSet {
    pub fn insert(&mut self, tag: SourceTag) -> bool {
        if self.0.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    pub fn contains(&self, tag: SourceTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn as_slice(&self) -> &[SourceTag] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationSummary {
    pub id: Option<i64>,
    pub source: SourceTag,
    pub name: String,
    pub phone: Option<String>,
    pub checkin_date: NaiveDate,
    pub checkout_date: Option<NaiveDate>,
    pub guest_count: Option<u32>,
    pub meal_option: Option<String>,
    pub notes: Option<String>,
}

/// 單日的空房狀態
///
/// `status` 與 `details` 只能透過 [`DayAvailability::book`] 一起變動，
/// 因此 `booked` 與 `details` 非空永遠同時成立，且一旦 booked 不會回到 available。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayAvailability {
    #[serde(skip)]
    date: NaiveDate,
    status: DayStatus,
    sources: SourceSet,
    details: Vec<ReservationSummary>,
}

impl DayAvailability {
    pub fn available(date: NaiveDate) -> Self {
        Self {
            date,
            status: DayStatus::Available,
            sources: SourceSet::default(),
            details: Vec::new(),
        }
    }

    pub fn book(&mut self, summary: ReservationSummary) {
        self.sources.insert(summary.source);
        self.details.push(summary);
        self.status = DayStatus::Booked;
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn status(&self) -> DayStatus {
        self.status
    }

    pub fn is_booked(&self) -> bool {
        self.status == DayStatus::Booked
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    pub fn details(&self) -> &[ReservationSummary] {
        &self.details
    }
}

/// 入口網站資料表中的已確認預約
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalReservation {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    pub guest_count: Option<u32>,
    pub meal_option: Option<String>,
    pub notes: Option<String>,
}

/// 入住表單（試算表）的一列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub name: String,
    pub phone: Option<String>,
    pub checkin_date: NaiveDate,
    pub checkout_date: Option<NaiveDate>,
    pub guest_count: Option<u32>,
    pub meal_option: Option<String>,
    pub notes: Option<String>,
}

/// 訂房網站回報的每日佔用狀態（true = 已訂）
pub type OccupancyMap = BTreeMap<NaiveDate, bool>;

/// 單一來源對日曆的覆蓋結果：每筆摘要與它在當月佔用的日期
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOverlay {
    pub source: SourceTag,
    pub entries: Vec<OverlayEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayEntry {
    pub summary: ReservationSummary,
    pub dates: Vec<NaiveDate>,
}

impl SourceOverlay {
    pub fn empty(source: SourceTag) -> Self {
        Self {
            source,
            entries: Vec::new(),
        }
    }

    pub fn summaries(&self) -> impl Iterator<Item = &ReservationSummary> {
        self.entries.iter().map(|entry| &entry.summary)
    }
}

/// 外部來源在本次請求中的取得狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchState {
    /// 剛從來源抓取
    Fresh,
    /// TTL 內的快取
    Cached,
    /// 抓取失敗，改用過期快取
    Stale,
    /// 抓取失敗且沒有可用快取，本次不貢獻任何資料
    Unavailable,
}

impl FetchState {
    pub fn is_degraded(&self) -> bool {
        matches!(self, FetchState::Stale | FetchState::Unavailable)
    }
}

/// 可用性查詢的回應本體
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub success: bool,
    pub year: i32,
    pub month: u32,
    pub data: BTreeMap<NaiveDate, DayAvailability>,
    pub reservations: Vec<ReservationSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<SourceTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshOutcome {
    pub success: bool,
    pub message: String,
}
