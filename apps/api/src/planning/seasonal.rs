//! Fixed seasonal/calendar event table used to suggest hints for each slot.

use chrono::{Datelike, NaiveDate};

const EVENTS_BY_MONTH: [&[&str]; 12] = [
    &["New Year", "Coming of Age Day"],
    &["Valentine's Day", "Setsubun"],
    &["White Day", "Hinamatsuri", "Spring equinox", "Graduation and new-life prep"],
    &["Easter", "New-life season", "Pollen and sensitive-skin care"],
    &["Mother's Day", "Golden Week", "UV protection"],
    &["Father's Day", "Rainy season humidity care"],
    &["Tanabata", "Midsummer UV care"],
    &["Obon", "Summer fatigue care", "Late-summer skin care"],
    &["Respect for the Aged Day", "Autumn equinox", "Autumn skin care"],
    &["Halloween", "Dry-skin season"],
    &["Black Friday", "Good Skin Day (11/8)"],
    &["Christmas", "Year-end winter moisture care"],
];

fn events_for(month: u32) -> &'static [&'static str] {
    EVENTS_BY_MONTH[(month as usize + 11) % 12]
}

/// The date's own month first, then the previous and next months, without duplicates.
pub fn suggested_events(date: NaiveDate) -> Vec<&'static str> {
    let month = date.month();
    let prev = if month == 1 { 12 } else { month - 1 };
    let next = if month == 12 { 1 } else { month + 1 };

    let mut events: Vec<&'static str> = Vec::new();
    for m in [month, prev, next] {
        for &event in events_for(m) {
            if !events.contains(&event) {
                events.push(event);
            }
        }
    }
    events
}

/// Every event in calendar order, for free choice.
pub fn all_events() -> Vec<&'static str> {
    let mut events: Vec<&'static str> = Vec::new();
    for &event in EVENTS_BY_MONTH.iter().flat_map(|m| m.iter()) {
        if !events.contains(&event) {
            events.push(event);
        }
    }
    events
}
