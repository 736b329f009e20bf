//! Public entry point: agenda queries and event mutations.
//!
//! The service holds no view state. Queries take explicit dates and return
//! values; mutations go through the [`EventStore`] and return the refreshed
//! week of the affected event.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;

use crate::error::{AgendaError, Result};
use crate::event::{DeletionMarker, Event, EventKey, Origin};
use crate::merger::{Agenda, AgendaDay, AgendaMerger};
use crate::store::EventStore;
use crate::summary::{summarize, AgendaSummary};
use crate::temporal::{end_of_day, local_today, start_of_day, week_bounds};

pub struct AgendaService<S: EventStore> {
    store: S,
    external: Vec<Event>,
    timezone: Tz,
    /// Serializes read-modify-write sequences against `store`.
    mutation: Mutex<()>,
}

impl<S: EventStore> AgendaService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            external: Vec::new(),
            timezone: chrono_tz::America::Sao_Paulo,
            mutation: Mutex::new(()),
        }
    }

    /// Fixed appointments merged into every query. Origins are forced to
    /// [`Origin::External`].
    pub fn with_external_events(mut self, events: Vec<Event>) -> Self {
        self.external = events
            .into_iter()
            .map(|e| e.with_origin(Origin::External))
            .collect();
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The current date in the configured zone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        local_today(now, &self.timezone)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Merge the agenda for an arbitrary range.
    pub fn build_agenda(
        &self,
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
    ) -> Result<Agenda> {
        AgendaMerger::new(&self.store).build_agenda(range_start, range_end, &self.external)
    }

    /// Monday 00:00:00 through Sunday 23:59:59 of the week containing `anchor`.
    pub fn weekly_agenda(&self, anchor: NaiveDate) -> Result<Agenda> {
        let (start, end) = week_bounds(anchor)?;
        self.build_agenda(start, end)
    }

    /// The events of a single date; empty when nothing is scheduled.
    pub fn day_agenda(&self, date: NaiveDate) -> Result<AgendaDay> {
        let mut agenda = self.build_agenda(start_of_day(date), end_of_day(date))?;
        Ok(agenda.remove(&date).unwrap_or_default())
    }

    /// Totals for the week containing `anchor`.
    pub fn weekly_summary(&self, anchor: NaiveDate) -> Result<AgendaSummary> {
        Ok(summarize(&self.weekly_agenda(anchor)?))
    }

    pub fn find_custom_event(&self, key: &EventKey) -> Result<Event> {
        self.store
            .load_custom_events()?
            .into_iter()
            .find(|e| key.matches(e))
            .ok_or_else(|| AgendaError::NotFound(key.to_string()))
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Persist a new custom event.
    pub fn create_event(&self, event: Event) -> Result<Agenda> {
        let event = event.with_origin(Origin::Custom);
        let anchor = event.date();
        {
            let _guard = self.mutation.lock();
            let mut custom = self.store.load_custom_events()?;
            tracing::info!(key = %event.key(), "creating custom event");
            custom.push(event);
            self.store.save_custom_events(&custom)?;
        }
        self.weekly_agenda(anchor)
    }

    /// Replace the custom event identified by `key`, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError::NotFound`] when no custom event has that key.
    pub fn update_event(&self, key: &EventKey, event: Event) -> Result<Agenda> {
        let event = event.with_origin(Origin::Custom);
        let anchor = event.date();
        {
            let _guard = self.mutation.lock();
            let mut custom = self.store.load_custom_events()?;
            let slot = custom
                .iter_mut()
                .find(|e| key.matches(e))
                .ok_or_else(|| AgendaError::NotFound(key.to_string()))?;
            tracing::info!(from = %key, to = %event.key(), "updating custom event");
            *slot = event;
            self.store.save_custom_events(&custom)?;
        }
        self.weekly_agenda(anchor)
    }

    /// Delete the event identified by `key`.
    ///
    /// Custom events are removed from the store. Routine and external events
    /// are hidden by appending a [`DeletionMarker`].
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError::NotFound`] when nothing on that date has the key.
    pub fn delete_event(&self, key: &EventKey) -> Result<Agenda> {
        let anchor = key.start.date();
        {
            let _guard = self.mutation.lock();
            let mut custom = self.store.load_custom_events()?;
            if let Some(index) = custom.iter().position(|e| key.matches(e)) {
                custom.remove(index);
                tracing::info!(%key, "deleting custom event");
                self.store.save_custom_events(&custom)?;
            } else {
                let day = self.day_agenda(anchor)?;
                if !day.iter().any(|e| !e.is_custom() && key.matches(e)) {
                    return Err(AgendaError::NotFound(key.to_string()));
                }
                let mut markers = self.store.load_deletion_markers()?;
                let marker = DeletionMarker::new(key.clone());
                if !markers.contains(&marker) {
                    markers.push(marker);
                }
                tracing::info!(%key, "suppressing generated event");
                self.store.save_deletion_markers(&markers)?;
            }
        }
        self.weekly_agenda(anchor)
    }

    /// Delete the `index`-th event of `date` as currently built.
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError::NotFound`] when the index is out of range.
    pub fn delete_event_at(&self, date: NaiveDate, index: usize) -> Result<Agenda> {
        let day = self.day_agenda(date)?;
        let key = day
            .get(index)
            .map(Event::key)
            .ok_or_else(|| AgendaError::NotFound(format!("event #{index} on {date}")))?;
        self.delete_event(&key)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
