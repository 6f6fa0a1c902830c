use crate::domain::model::DayAvailability;
use crate::utils::error::{AvailabilityError, Result};
use chrono::{Datelike, Days, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;

/// 經過驗證的年月
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthPeriod {
    year: i32,
    month: u32,
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl MonthPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        let invalid = || AvailabilityError::InvalidRange { year, month };

        if year <= 0 || !(1..=12).contains(&month) {
            return Err(invalid());
        }

        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let next_month = first_day
            .checked_add_months(chrono::Months::new(1))
            .ok_or_else(invalid)?;
        let last_day = next_month.pred_opt().ok_or_else(invalid)?;

        Ok(Self {
            year,
            month,
            first_day,
            last_day,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day && date <= self.last_day
    }

    pub fn day_count(&self) -> u32 {
        self.last_day.day()
    }

    /// 住宿區間 `[checkin, checkout)` 是否與本月相交
    ///
    /// 入住日在月內、退房日在月內、或整段跨越本月，三者之一成立即可。
    pub fn overlaps_stay(&self, checkin: NaiveDate, checkout: NaiveDate) -> bool {
        self.contains(checkin)
            || self.contains(checkout)
            || (checkin <= self.first_day && checkout >= self.last_day)
    }

    /// 住宿區間 `[checkin, checkout)` 落在本月內的每一天；退房日本身不計
    pub fn nights_within(&self, checkin: NaiveDate, checkout: NaiveDate) -> Vec<NaiveDate> {
        let start = checkin.max(self.first_day);
        let end = checkout.min(self.last_day + Days::new(1));

        start
            .iter_days()
            .take_while(|day| *day < end)
            .collect()
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// 單月的每日空房表，依日期排序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthCalendar {
    period: MonthPeriod,
    days: BTreeMap<NaiveDate, DayAvailability>,
}

impl MonthCalendar {
    /// 建立整月皆為 available 的空日曆
    pub fn empty(period: MonthPeriod) -> Self {
        let days = period
            .first_day()
            .iter_days()
            .take(period.day_count() as usize)
            .map(|date| (date, DayAvailability::available(date)))
            .collect();

        Self { period, days }
    }

    pub fn for_month(year: i32, month: u32) -> Result<Self> {
        Ok(Self::empty(MonthPeriod::new(year, month)?))
    }

    pub fn period(&self) -> MonthPeriod {
        self.period
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayAvailability> {
        self.days.get(&date)
    }

    pub fn day_mut(&mut self, date: NaiveDate) -> Option<&mut DayAvailability> {
        self.days.get_mut(&date)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &DayAvailability)> {
        self.days.iter()
    }

    pub fn into_days(self) -> BTreeMap<NaiveDate, DayAvailability> {
        self.days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_calendar_has_every_day_of_month_once() {
        let cases = [
            (2025, 1, 31),
            (2025, 2, 28),
            (2024, 2, 29),
            (2025, 4, 30),
            (2025, 12, 31),
            (1900, 2, 28),
            (2000, 2, 29),
        ];

        for (year, month, expected) in cases {
            let calendar = MonthCalendar::for_month(year, month).unwrap();
            assert_eq!(calendar.len(), expected, "{year}-{month}");

            let keys: Vec<NaiveDate> = calendar.iter().map(|(d, _)| *d).collect();
            assert_eq!(keys.first().copied(), Some(date(year, month, 1)));
            assert_eq!(keys.last().copied(), Some(date(year, month, expected as u32)));
            assert!(keys.windows(2).all(|w| w[0] < w[1]));
            assert!(calendar.iter().all(|(_, day)| !day.is_booked()));
        }
    }

    #[test]
    fn test_invalid_range_is_rejected() {
        for (year, month) in [(2025, 0), (2025, 13), (0, 5), (-1, 5)] {
            let err = MonthCalendar::for_month(year, month).unwrap_err();
            assert!(matches!(
                err,
                AvailabilityError::InvalidRange { year: y, month: m } if y == year && m == month
            ));
        }
    }

    #[test]
    fn test_overlaps_stay() {
        let march = MonthPeriod::new(2025, 3).unwrap();

        // 入住日在月內
        assert!(march.overlaps_stay(date(2025, 3, 30), date(2025, 4, 2)));
        // 退房日在月內
        assert!(march.overlaps_stay(date(2025, 2, 27), date(2025, 3, 2)));
        // 跨越整月
        assert!(march.overlaps_stay(date(2025, 2, 1), date(2025, 4, 30)));
        // 完全在月外
        assert!(!march.overlaps_stay(date(2025, 2, 1), date(2025, 2, 28)));
        assert!(!march.overlaps_stay(date(2025, 4, 1), date(2025, 4, 3)));
    }

    #[test]
    fn test_nights_within_excludes_checkout_and_clamps() {
        let march = MonthPeriod::new(2025, 3).unwrap();

        assert_eq!(
            march.nights_within(date(2025, 3, 10), date(2025, 3, 12)),
            vec![date(2025, 3, 10), date(2025, 3, 11)]
        );
        assert_eq!(
            march.nights_within(date(2025, 2, 27), date(2025, 3, 2)),
            vec![date(2025, 3, 1)]
        );
        assert_eq!(
            march.nights_within(date(2025, 3, 30), date(2025, 4, 5)),
            vec![date(2025, 3, 30), date(2025, 3, 31)]
        );
        // 退房日剛好是月初：不佔用任何一天
        assert!(march
            .nights_within(date(2025, 2, 28), date(2025, 3, 1))
            .is_empty());
    }

    #[test]
    fn test_period_display() {
        assert_eq!(MonthPeriod::new(2025, 3).unwrap().to_string(), "2025-03");
    }
}
