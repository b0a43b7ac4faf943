//! Business-day calendar (Mon–Fri, no holidays).

use chrono::{Datelike, NaiveDate, Weekday};

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The `count` business days strictly after `after`, ascending.
pub fn next_business_days(after: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut current = after;
    while days.len() < count {
        let Some(next) = current.succ_opt() else {
            break;
        };
        current = next;
        if is_business_day(current) {
            days.push(current);
        }
    }
    days
}
