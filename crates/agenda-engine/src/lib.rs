//! # agenda-engine
//!
//! Deterministic weekly agenda computation.
//!
//! The engine derives a fixed routine of work, development, and exercise
//! blocks for any date range, merges it with user-created events and fixed
//! appointments, hides deleted blocks through persistent deletion markers,
//! and groups the result by day in start order.
//!
//! ## Modules
//!
//! - [`event`] — `TimeRange`, `Event`, identities, deletion markers, and wire records
//! - [`routine`] — Weekday-keyed routine block generation
//! - [`store`] — `EventStore` trait with in-memory and JSON-file implementations
//! - [`merger`] — Merge, suppress, group, and sort into an `Agenda`
//! - [`service`] — Week/day/summary queries and create/update/delete entry points
//! - [`summary`] — Totals by category and priority
//! - [`temporal`] — Week boundaries, zone-aware "today", wire-format parsing
//! - [`config`] — TOML configuration
//! - [`error`] — Error types

pub mod config;
pub mod error;
pub mod event;
pub mod merger;
pub mod routine;
pub mod service;
pub mod store;
pub mod summary;
pub mod temporal;

pub use config::AgendaConfig;
pub use error::{AgendaError, StoreError};
pub use event::{Category, DeletionMarker, Event, EventKey, EventRecord, Origin, Priority, TimeRange};
pub use merger::{Agenda, AgendaDay, AgendaMerger, AgendaRecords};
pub use routine::generate;
pub use service::AgendaService;
pub use store::{load_external_events, EventStore, JsonFileStore, MemoryStore};
pub use summary::{summarize, AgendaSummary};
pub use temporal::{format_duration_label, local_today, parse_local_datetime, week_bounds};
