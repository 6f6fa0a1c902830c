use crate::domain::model::{FormSubmission, SourceTag};
use crate::domain::ports::FormSource;
use crate::utils::error::ExternalFetchError;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%m/%d/%Y"];

/// 試算表欄位名稱對應
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormColumns {
    pub name: String,
    pub phone: String,
    pub checkin_date: String,
    pub checkout_date: String,
    pub guest_count: String,
    pub meal_option: String,
    pub notes: String,
}

impl Default for FormColumns {
    fn default() -> Self {
        Self {
            name: "name".to_string(),
            phone: "phone".to_string(),
            checkin_date: "checkin_date".to_string(),
            checkout_date: "checkout_date".to_string(),
            guest_count: "guest_count".to_string(),
            meal_option: "meal_option".to_string(),
            notes: "notes".to_string(),
        }
    }
}

/// 以 CSV 匯出網址讀取入住表單
pub struct SheetFormSource {
    client: Client,
    endpoint: String,
    columns: FormColumns,
}

impl SheetFormSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, columns: FormColumns) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: endpoint.into(),
            columns,
        }
    }

    async fn download(&self) -> Result<String, ExternalFetchError> {
        tracing::debug!("Downloading form sheet from: {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| ExternalFetchError::http(SourceTag::Form, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExternalFetchError::Status {
                origin: SourceTag::Form,
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ExternalFetchError::http(SourceTag::Form, &e))
    }
}

#[async_trait]
impl FormSource for SheetFormSource {
    async fn fetch_all(&self) -> Result<Vec<FormSubmission>, ExternalFetchError> {
        let body = self.download().await?;
        parse_sheet(&body, &self.columns)
    }
}

/// 解析 CSV 內容；無法解析的列略過並記錄警告
pub fn parse_sheet(
    body: &str,
    columns: &FormColumns,
) -> Result<Vec<FormSubmission>, ExternalFetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ExternalFetchError::decode(SourceTag::Form, e.to_string()))?
        .clone();
    let index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();

    let checkin_col = *index.get(columns.checkin_date.as_str()).ok_or_else(|| {
        ExternalFetchError::decode(
            SourceTag::Form,
            format!("missing column '{}'", columns.checkin_date),
        )
    })?;

    let column = |name: &str| index.get(name).copied();
    let name_col = column(&columns.name);
    let phone_col = column(&columns.phone);
    let checkout_col = column(&columns.checkout_date);
    let guests_col = column(&columns.guest_count);
    let meal_col = column(&columns.meal_option);
    let notes_col = column(&columns.notes);

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(line = line + 2, error = %e, "⚠️ Skipping unreadable form row");
                continue;
            }
        };

        let cell = |col: Option<usize>| {
            col.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let Some(checkin_date) = record.get(checkin_col).and_then(parse_date) else {
            tracing::warn!(line = line + 2, "⚠️ Skipping form row without a valid check-in date");
            continue;
        };

        rows.push(FormSubmission {
            name: cell(name_col).unwrap_or_default(),
            phone: cell(phone_col),
            checkin_date,
            checkout_date: cell(checkout_col).as_deref().and_then(parse_date),
            guest_count: cell(guests_col).and_then(|v| v.parse().ok()),
            meal_option: cell(meal_col),
            notes: cell(notes_col),
        });
    }

    tracing::debug!("Parsed {} form submissions", rows.len());
    Ok(rows)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // 試算表時間戳記可能帶時間，只取日期部分
    let date_part = raw.split_whitespace().next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}
