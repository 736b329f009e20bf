//! Persistence of custom events and deletion markers.
//!
//! The engine reads and writes through [`EventStore`] only. Two
//! implementations ship with the crate:
//!
//! - [`MemoryStore`] — in-process collections, for tests and embedding
//! - [`JsonFileStore`] — two JSON files in a data directory
//!
//! Stores guarantee no ordering; the merger re-sorts everything it reads.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AgendaError, Result, StoreError};
use crate::event::{DeletionMarker, Event, EventRecord, Origin};

/// File holding the custom event records.
pub const CUSTOM_EVENTS_FILE: &str = "agenda_events.json";
/// File holding the deletion marker records.
pub const DELETION_MARKERS_FILE: &str = "deleted_events.json";

/// Storage for the two persisted collections.
///
/// Implementations replace a whole collection on save. Callers that
/// read-modify-write must serialize those sequences themselves
/// (see [`crate::service::AgendaService`]).
pub trait EventStore {
    /// Load custom events. Every returned event has [`Origin::Custom`].
    fn load_custom_events(&self) -> Result<Vec<Event>>;

    fn save_custom_events(&self, events: &[Event]) -> Result<()>;

    fn load_deletion_markers(&self) -> Result<Vec<DeletionMarker>>;

    fn save_deletion_markers(&self, markers: &[DeletionMarker]) -> Result<()>;
}

impl<S: EventStore + ?Sized> EventStore for &S {
    fn load_custom_events(&self) -> Result<Vec<Event>> {
        (**self).load_custom_events()
    }

    fn save_custom_events(&self, events: &[Event]) -> Result<()> {
        (**self).save_custom_events(events)
    }

    fn load_deletion_markers(&self) -> Result<Vec<DeletionMarker>> {
        (**self).load_deletion_markers()
    }

    fn save_deletion_markers(&self, markers: &[DeletionMarker]) -> Result<()> {
        (**self).save_deletion_markers(markers)
    }
}

// ── MemoryStore ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    custom: RwLock<Vec<Event>>,
    markers: RwLock<Vec<DeletionMarker>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for MemoryStore {
    fn load_custom_events(&self) -> Result<Vec<Event>> {
        Ok(self.custom.read().clone())
    }

    fn save_custom_events(&self, events: &[Event]) -> Result<()> {
        *self.custom.write() = events
            .iter()
            .cloned()
            .map(|e| e.with_origin(Origin::Custom))
            .collect();
        Ok(())
    }

    fn load_deletion_markers(&self) -> Result<Vec<DeletionMarker>> {
        Ok(self.markers.read().clone())
    }

    fn save_deletion_markers(&self, markers: &[DeletionMarker]) -> Result<()> {
        *self.markers.write() = markers.to_vec();
        Ok(())
    }
}

// ── JsonFileStore ───────────────────────────────────────────────────────────

/// Two JSON arrays in `dir`: [`CUSTOM_EVENTS_FILE`] and [`DELETION_MARKERS_FILE`].
///
/// Missing files read as empty collections. Writes go to a sibling temp file
/// that is renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn custom_path(&self) -> PathBuf {
        self.dir.join(CUSTOM_EVENTS_FILE)
    }

    fn markers_path(&self) -> PathBuf {
        self.dir.join(DELETION_MARKERS_FILE)
    }
}

impl EventStore for JsonFileStore {
    fn load_custom_events(&self) -> Result<Vec<Event>> {
        let records: Vec<EventRecord> = read_json_array(&self.custom_path())?;
        records_into_events(records, Origin::Custom)
    }

    fn save_custom_events(&self, events: &[Event]) -> Result<()> {
        let records: Vec<EventRecord> = events
            .iter()
            .map(|e| {
                let mut record = e.to_record();
                record.is_custom = true;
                record
            })
            .collect();
        write_json_atomic(&self.custom_path(), &records)
    }

    fn load_deletion_markers(&self) -> Result<Vec<DeletionMarker>> {
        read_json_array(&self.markers_path())
    }

    fn save_deletion_markers(&self, markers: &[DeletionMarker]) -> Result<()> {
        write_json_atomic(&self.markers_path(), markers)
    }
}

/// Load a JSON array of event records as [`Origin::External`] events.
///
/// # Errors
///
/// Fails if the file is missing, malformed, or holds an invalid event.
pub fn load_external_events(path: &Path) -> Result<Vec<Event>> {
    let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<EventRecord> =
        serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    let events = records_into_events(records, Origin::External)?;
    tracing::debug!(path = %path.display(), count = events.len(), "loaded external events");
    Ok(events)
}

// ── Internal helpers ────────────────────────────────────────────────────────

fn records_into_events(records: Vec<EventRecord>, origin: Origin) -> Result<Vec<Event>> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record.into_event(origin).map_err(|e| {
                AgendaError::from(StoreError::InvalidRecord(format!("record {index}: {e}")))
            })
        })
        .collect()
}

fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            }
            .into())
        }
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parsed = serde_json::from_str(&raw).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parsed)
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let body = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Category, EventKey, Priority};
    use crate::temporal::parse_local_datetime;

    fn dentist() -> Event {
        Event::custom(
            "Dentist",
            parse_local_datetime("2024-03-05 09:00").unwrap(),
            parse_local_datetime("2024-03-05 10:00").unwrap(),
            Priority::High,
            Category::Personal,
            None,
        )
        .unwrap()
    }

    fn marker() -> DeletionMarker {
        DeletionMarker::new(EventKey::new(
            parse_local_datetime("2024-03-05 08:00").unwrap(),
            "Trabalho Principal (Fiscal)",
            Category::Fiscal,
        ))
    }

    // ── MemoryStore tests ───────────────────────────────────────────────

    #[test]
    fn test_memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert!(store.load_custom_events().unwrap().is_empty());
        assert!(store.load_deletion_markers().unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_replaces_collections() {
        let store = MemoryStore::new();
        store.save_custom_events(&[dentist(), dentist()]).unwrap();
        store.save_custom_events(&[dentist()]).unwrap();
        assert_eq!(store.load_custom_events().unwrap().len(), 1);

        store.save_deletion_markers(&[marker()]).unwrap();
        assert_eq!(store.load_deletion_markers().unwrap(), vec![marker()]);
    }

    #[test]
    fn test_memory_store_forces_custom_origin() {
        let store = MemoryStore::new();
        let external = dentist().with_origin(Origin::External);
        store.save_custom_events(&[external]).unwrap();
        assert!(store.load_custom_events().unwrap()[0].is_custom());
    }

    // ── JsonFileStore tests ─────────────────────────────────────────────

    #[test]
    fn test_file_store_missing_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("not-yet-created"));
        assert!(store.load_custom_events().unwrap().is_empty());
        assert!(store.load_deletion_markers().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        JsonFileStore::new(dir.path())
            .save_custom_events(&[dentist()])
            .unwrap();
        JsonFileStore::new(dir.path())
            .save_deletion_markers(&[marker()])
            .unwrap();

        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.load_custom_events().unwrap(), vec![dentist()]);
        assert_eq!(reopened.load_deletion_markers().unwrap(), vec![marker()]);
    }

    #[test]
    fn test_file_store_creates_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        JsonFileStore::new(&nested)
            .save_deletion_markers(&[marker()])
            .unwrap();
        assert!(nested.join(DELETION_MARKERS_FILE).exists());
        assert!(!nested.join("deleted_events.json.tmp").exists());
    }

    #[test]
    fn test_file_store_record_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save_custom_events(&[dentist()]).unwrap();
        let raw = fs::read_to_string(dir.path().join(CUSTOM_EVENTS_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[0]["start"], "2024-03-05 09:00");
        assert_eq!(json[0]["isCustom"], true);
        assert_eq!(json[0]["priorityKey"], "HIGH");
    }

    #[test]
    fn test_file_store_malformed_json_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DELETION_MARKERS_FILE), "{not json").unwrap();
        let err = JsonFileStore::new(dir.path())
            .load_deletion_markers()
            .unwrap_err();
        assert!(matches!(err, AgendaError::Store(StoreError::Json { .. })));
    }

    #[test]
    fn test_file_store_invalid_record_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CUSTOM_EVENTS_FILE),
            r#"[{"title": "Backwards", "start": "2024-03-05 10:00", "end": "2024-03-05 09:00"}]"#,
        )
        .unwrap();
        let err = JsonFileStore::new(dir.path())
            .load_custom_events()
            .unwrap_err();
        assert!(matches!(err, AgendaError::Store(StoreError::InvalidRecord(_))));
        assert!(err.to_string().contains("record 0"), "got: {err}");
    }

    #[test]
    fn test_load_external_events_tags_origin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appointments.json");
        fs::write(
            &path,
            r#"[{"title": "Reunião", "start": "2024-03-06 10:00", "end": "2024-03-06 11:00", "priority": "Alta", "category": "Fiscal"}]"#,
        )
        .unwrap();
        let events = load_external_events(&path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].origin(), Origin::External);
        assert_eq!(events[0].priority(), Priority::High);
    }

    #[test]
    fn test_load_external_events_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_external_events(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, AgendaError::Store(StoreError::Io { .. })));
    }
}
