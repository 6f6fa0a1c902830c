//! 由設定檔組裝實際的轉接器與引擎

use crate::adapters::{HttpBookingCalendar, SheetFormSource, SqliteReservationStore};
use crate::config::AppConfig;
use crate::core::engine::AvailabilityEngine;
use crate::utils::error::Result;
use std::path::Path;
use std::sync::Arc;

/// 開啟資料庫、建立兩個 HTTP 來源並組成引擎
pub fn build_engine(config: &AppConfig) -> Result<AvailabilityEngine> {
    if let Some(parent) = Path::new(&config.database.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let store = SqliteReservationStore::open(&config.database.path, config.database.pool_size)?;
    tracing::info!("📂 Reservation database: {}", config.database.path);

    let form = SheetFormSource::new(
        config.form.endpoint.clone(),
        config.form_timeout(),
        config.form.columns.clone(),
    );
    let booking = HttpBookingCalendar::new(
        config.booking_site.endpoint.clone(),
        config.booking_timeout(),
        config.booking_site.api_key.clone(),
    );

    Ok(AvailabilityEngine::new(
        Arc::new(store),
        Arc::new(form),
        Arc::new(booking),
        config.engine_settings(),
    ))
}
