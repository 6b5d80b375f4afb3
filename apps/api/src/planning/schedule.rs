use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

use crate::errors::AppError;

/// One dated position in the output calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleSlot {
    /// 0-based.
    pub index: usize,
    pub date: NaiveDate,
}

/// Walks forward one day at a time from `start` (inclusive), keeping every date whose
/// weekday is in `weekdays`, until `total` dates are collected.
///
/// Holidays are not considered.
pub fn generate_schedule(
    total: usize,
    start: NaiveDate,
    weekdays: &[Weekday],
) -> Result<Vec<ScheduleSlot>, AppError> {
    if total == 0 {
        return Err(AppError::Validation("Post count must be positive".to_string()));
    }
    if weekdays.is_empty() {
        return Err(AppError::Validation(
            "At least one posting weekday is required".to_string(),
        ));
    }

    let mut slots = Vec::with_capacity(total);
    let mut cursor = start;
    while slots.len() < total {
        if weekdays.contains(&cursor.weekday()) {
            slots.push(ScheduleSlot {
                index: slots.len(),
                date: cursor,
            });
        }
        cursor = cursor
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::Validation("Schedule runs past the last supported date".to_string()))?;
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_tuesday_start_skips_to_friday() {
        // 2026-03-03 is a Tuesday
        let slots = generate_schedule(4, date(2026, 3, 3), &[Weekday::Mon, Weekday::Fri]).unwrap();
        let dates: Vec<_> = slots.iter().map(|s| s.date).collect();
        assert_eq!(
            dates,
            vec![date(2026, 3, 6), date(2026, 3, 9), date(2026, 3, 13), date(2026, 3, 16)]
        );
        assert_eq!(slots[3].index, 3);
    }

    #[test]
    fn test_qualifying_start_date_is_used() {
        // 2026-03-02 is a Monday
        let slots = generate_schedule(1, date(2026, 3, 2), &[Weekday::Mon]).unwrap();
        assert_eq!(slots[0].date, date(2026, 3, 2));
    }

    #[test]
    fn test_slots_are_increasing_and_on_allowed_weekdays() {
        let weekdays = [Weekday::Mon, Weekday::Wed, Weekday::Fri];
        let slots = generate_schedule(24, date(2026, 12, 20), &weekdays).unwrap();
        assert_eq!(slots.len(), 24);
        assert!(slots.windows(2).all(|w| w[0].date < w[1].date));
        assert!(slots.iter().all(|s| weekdays.contains(&s.date.weekday())));
    }

    #[test]
    fn test_rejects_empty_inputs() {
        assert!(generate_schedule(0, date(2026, 3, 2), &[Weekday::Mon]).is_err());
        assert!(generate_schedule(4, date(2026, 3, 2), &[]).is_err());
    }
}
