use crate::domain::model::{OccupancyMap, SourceTag};
use crate::domain::ports::BookingCalendarSource;
use crate::utils::error::ExternalFetchError;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// 訂房網站回傳的單日狀態：布林值或狀態字串
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DayValue {
    Flag(bool),
    Label(String),
}

impl DayValue {
    fn is_occupied(&self) -> bool {
        match self {
            DayValue::Flag(flag) => *flag,
            DayValue::Label(label) => matches!(
                label.trim().to_ascii_lowercase().as_str(),
                "booked" | "occupied" | "reserved" | "closed" | "full"
            ),
        }
    }
}

/// `{"days": {...}}` 包裝或直接回傳日期物件都接受
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CalendarPayload {
    Wrapped { days: BTreeMap<String, DayValue> },
    Bare(BTreeMap<String, DayValue>),
}

impl CalendarPayload {
    fn into_days(self) -> BTreeMap<String, DayValue> {
        match self {
            CalendarPayload::Wrapped { days } => days,
            CalendarPayload::Bare(days) => days,
        }
    }
}

/// 第三方訂房網站的日曆 API
pub struct HttpBookingCalendar {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpBookingCalendar {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl BookingCalendarSource for HttpBookingCalendar {
    async fn fetch_month(&self, year: i32, month: u32) -> Result<OccupancyMap, ExternalFetchError> {
        tracing::debug!(year, month, "Requesting booking site calendar: {}", self.endpoint);

        let mut request = self
            .client
            .get(&self.endpoint)
            .query(&[("year", year.to_string()), ("month", month.to_string())]);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExternalFetchError::http(SourceTag::External, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExternalFetchError::Status {
                origin: SourceTag::External,
                status: status.as_u16(),
            });
        }

        let payload: CalendarPayload = response
            .json()
            .await
            .map_err(|e| ExternalFetchError::decode(SourceTag::External, e.to_string()))?;

        decode_days(payload.into_days())
    }
}

fn decode_days(days: BTreeMap<String, DayValue>) -> Result<OccupancyMap, ExternalFetchError> {
    days.into_iter()
        .map(|(raw, value)| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(|date| (date, value.is_occupied()))
                .map_err(|e| {
                    let message = format!("bad date '{raw}': {e}");
                    ExternalFetchError::decode(SourceTag::External, message)
                })
        })
        .collect()
}
