//! Merge routine, custom, and external events into a day-grouped agenda.
//!
//! Merging is read-only over the store snapshot:
//!
//! 1. Routine events for the range ([`crate::routine::generate`])
//! 2. Custom events whose start date lies inside the range
//! 3. Deletion markers
//! 4. Drop routine and external events matching a marker
//! 5. Union in routine, custom, external order
//! 6. Group by the start date of each event
//! 7. Stable sort by start within each day
//!
//! Empty days are never present in the result.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::Result;
use crate::event::{DeletionMarker, Event, EventRecord, Origin};
use crate::routine;
use crate::store::EventStore;

/// The events of one calendar date, ordered by start.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgendaDay {
    events: Vec<Event>,
}

impl AgendaDay {
    /// Build a day from events in union order; sorts stably by start.
    pub fn new(mut events: Vec<Event>) -> Self {
        events.sort_by_key(Event::start);
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn to_records(&self) -> Vec<EventRecord> {
        self.events.iter().map(Event::to_record).collect()
    }
}

impl<'a> IntoIterator for &'a AgendaDay {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Date-ordered mapping of non-empty days.
pub type Agenda = BTreeMap<NaiveDate, AgendaDay>;

/// The serialized agenda: `YYYY-MM-DD` → event records.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct AgendaRecords(pub BTreeMap<String, Vec<EventRecord>>);

impl AgendaRecords {
    pub fn from_agenda(agenda: &Agenda) -> Self {
        Self(
            agenda
                .iter()
                .map(|(date, day)| (date.format("%Y-%m-%d").to_string(), day.to_records()))
                .collect(),
        )
    }
}

/// Builds agendas from the routine rules and an [`EventStore`] snapshot.
pub struct AgendaMerger<'a, S: EventStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: EventStore + ?Sized> AgendaMerger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Build the agenda for `[range_start, range_end]`, date-inclusive.
    ///
    /// A reversed range collapses to the single date of `range_start`.
    /// `external` events outside the range are ignored.
    ///
    /// # Errors
    ///
    /// Propagates store failures unchanged.
    pub fn build_agenda(
        &self,
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
        external: &[Event],
    ) -> Result<Agenda> {
        let range_end = range_end.max(range_start);
        let first_day = range_start.date();
        let last_day = range_end.date();
        let in_range = |event: &Event| (first_day..=last_day).contains(&event.date());

        let routine_events = routine::generate(range_start, range_end);
        let custom_events: Vec<Event> = self
            .store
            .load_custom_events()?
            .into_iter()
            .filter(|e| in_range(e))
            .map(|e| e.with_origin(Origin::Custom))
            .collect();
        let markers = self.store.load_deletion_markers()?;

        let routine_count = routine_events.len();
        let mut suppressed = 0usize;
        let mut keep = |event: &Event| {
            let hidden = is_suppressed(event, &markers);
            if hidden {
                suppressed += 1;
            }
            !hidden
        };

        let mut merged: Vec<Event> = Vec::with_capacity(routine_count + custom_events.len());
        merged.extend(routine_events.into_iter().filter(|e| keep(e)));
        merged.extend(custom_events);
        merged.extend(
            external
                .iter()
                .filter(|e| in_range(*e))
                .filter(|e| keep(*e))
                .cloned(),
        );

        let agenda = group_by_day(merged);
        tracing::debug!(
            %first_day,
            %last_day,
            routine = routine_count,
            suppressed,
            days = agenda.len(),
            "agenda built"
        );
        Ok(agenda)
    }
}

/// Whether a marker hides `event`. Custom events are never hidden.
pub fn is_suppressed(event: &Event, markers: &[DeletionMarker]) -> bool {
    !event.is_custom() && markers.iter().any(|m| m.suppresses(event))
}

/// Group events by start date, preserving input order before the stable sort.
pub fn group_by_day(events: Vec<Event>) -> Agenda {
    let mut buckets: BTreeMap<NaiveDate, Vec<Event>> = BTreeMap::new();
    for event in events {
        buckets.entry(event.date()).or_default().push(event);
    }
    buckets
        .into_iter()
        .map(|(date, events)| (date, AgendaDay::new(events)))
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────────────
