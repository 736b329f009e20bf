//! Aggregate statistics over a built agenda.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::merger::Agenda;

/// Totals over every event of an agenda.
///
/// Category and priority counts are keyed by display label and only contain
/// labels that occur.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaSummary {
    pub total_events: usize,
    pub total_minutes: i64,
    /// `total_minutes / 60`, for display.
    pub total_hours: f64,
    pub by_category: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
}

pub fn summarize(agenda: &Agenda) -> AgendaSummary {
    let mut total_events = 0;
    let mut total_minutes = 0;
    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_priority: BTreeMap<String, usize> = BTreeMap::new();

    for event in agenda.values().flatten() {
        total_events += 1;
        total_minutes += event.range().duration().num_minutes();
        *by_category.entry(event.category().label().to_string()).or_default() += 1;
        *by_priority.entry(event.priority().label().to_string()).or_default() += 1;
    }

    AgendaSummary {
        total_events,
        total_minutes,
        total_hours: total_minutes as f64 / 60.0,
        by_category,
        by_priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Category, Event, Priority};
    use crate::merger::{group_by_day, AgendaMerger};
    use crate::store::MemoryStore;
    use crate::temporal::{parse_local_datetime, week_bounds};

    #[test]
    fn test_summary_of_routine_week() {
        let store = MemoryStore::new();
        let anchor = parse_local_datetime("2024-03-06 12:00").unwrap().date();
        let (start, end) = week_bounds(anchor).unwrap();
        let agenda = AgendaMerger::new(&store).build_agenda(start, end, &[]).unwrap();
        let summary = summarize(&agenda);

        // 5 × (4h + 4h + 1h) + 2 × 1h = 47h
        assert_eq!(summary.total_events, 17);
        assert_eq!(summary.total_minutes, 47 * 60);
        assert!((summary.total_hours - 47.0).abs() < f64::EPSILON);
        assert_eq!(summary.by_category["Fiscal"], 5);
        assert_eq!(summary.by_category["Desenvolvimento"], 5);
        assert_eq!(summary.by_category["Lazer"], 7);
        assert!(!summary.by_category.contains_key("Pessoal"));
        assert_eq!(summary.by_priority["Média"], 10);
        assert_eq!(summary.by_priority["Baixa"], 7);
    }

    #[test]
    fn test_summary_partial_hours() {
        let event = Event::custom(
            "Call",
            parse_local_datetime("2024-03-05 09:00").unwrap(),
            parse_local_datetime("2024-03-05 09:45").unwrap(),
            Priority::High,
            Category::Personal,
            None,
        )
        .unwrap();
        let summary = summarize(&group_by_day(vec![event]));
        assert_eq!(summary.total_minutes, 45);
        assert!((summary.total_hours - 0.75).abs() < f64::EPSILON);
        assert_eq!(summary.by_priority["Alta"], 1);
    }

    #[test]
    fn test_summary_empty() {
        let summary = summarize(&Agenda::new());
        assert_eq!(summary.total_events, 0);
        assert_eq!(summary.total_minutes, 0);
        assert!(summary.by_category.is_empty());
    }

    #[test]
    fn test_summary_serialized_keys() {
        let json = serde_json::to_value(summarize(&Agenda::new())).unwrap();
        assert!(json.get("totalEvents").is_some());
        assert!(json.get("byCategory").is_some());
    }
}
