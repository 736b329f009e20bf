//! Routine block generation.
//!
//! The weekly routine is a fixed rule set keyed only on the ISO weekday:
//!
//! | Block                              | Days    | Time        | Priority | Category        |
//! |------------------------------------|---------|-------------|----------|-----------------|
//! | Trabalho Principal (Fiscal)        | Mon–Fri | 08:00–12:00 | Média    | Fiscal          |
//! | Desenvolvimento Web & Automação    | Mon–Fri | 14:00–18:00 | Média    | Desenvolvimento |
//! | Exercícios / Academia              | Every   | 19:00–20:00 | Baixa    | Lazer           |
//!
//! [`generate`] is pure: the same range always yields the same sequence.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::event::{Category, Event, Priority};
use crate::temporal::start_of_day;

pub const FISCAL_TITLE: &str = "Trabalho Principal (Fiscal)";
pub const DEV_TITLE: &str = "Desenvolvimento Web & Automação";
pub const LEISURE_TITLE: &str = "Exercícios / Academia";

struct RoutineBlock {
    title: &'static str,
    /// Minutes after midnight.
    start: i64,
    end: i64,
    priority: Priority,
    category: Category,
    weekdays_only: bool,
}

/// Emission order within a day.
const BLOCKS: [RoutineBlock; 3] = [
    RoutineBlock {
        title: FISCAL_TITLE,
        start: 8 * 60,
        end: 12 * 60,
        priority: Priority::Medium,
        category: Category::Fiscal,
        weekdays_only: true,
    },
    RoutineBlock {
        title: DEV_TITLE,
        start: 14 * 60,
        end: 18 * 60,
        priority: Priority::Medium,
        category: Category::Dev,
        weekdays_only: true,
    },
    RoutineBlock {
        title: LEISURE_TITLE,
        start: 19 * 60,
        end: 20 * 60,
        priority: Priority::Low,
        category: Category::Leisure,
        weekdays_only: false,
    },
];

/// Generate the routine events for every calendar date from
/// `range_start.date()` through `range_end.date()` inclusive.
///
/// Time of day on either bound is ignored. A reversed range yields no events.
///
/// # Examples
///
/// ```
/// use agenda_engine::routine::generate;
/// use chrono::NaiveDate;
///
/// let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let events = generate(monday, monday);
/// assert_eq!(events.len(), 3);
/// ```
pub fn generate(range_start: NaiveDateTime, range_end: NaiveDateTime) -> Vec<Event> {
    if range_start > range_end {
        return Vec::new();
    }

    range_start
        .date()
        .iter_days()
        .take_while(|day| *day <= range_end.date())
        .flat_map(blocks_for_day)
        .collect()
}

/// The routine events of a single date, in emission order.
pub fn blocks_for_day(day: NaiveDate) -> Vec<Event> {
    let is_weekday = day.weekday().number_from_monday() <= 5;
    BLOCKS
        .iter()
        .filter(|block| is_weekday || !block.weekdays_only)
        .map(|block| {
            Event::routine(
                block.title,
                at(day, block.start),
                at(day, block.end),
                block.priority,
                block.category,
            )
        })
        .collect()
}

fn at(day: NaiveDate, minutes: i64) -> NaiveDateTime {
    start_of_day(day) + Duration::minutes(minutes)
}

// ── Tests ───────────────────────────────────────────────────────────────────
