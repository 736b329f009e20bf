//! Agenda value types: time ranges, events, identities, and deletion markers.
//!
//! Events are immutable once built. The serialized shapes ([`EventRecord`],
//! [`DeletionMarker`]) are the JSON records exchanged with the store and the
//! CLI; category and priority labels are Portuguese display strings.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, Result};
use crate::temporal::{format_duration_label, format_local_datetime, local_datetime};

// ── TimeRange ───────────────────────────────────────────────────────────────

/// A validated `[start, end)` pair with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    /// Build a range.
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError::InvalidRange`] when `start >= end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start >= end {
            return Err(AgendaError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// `"{H}h {M}m"`, truncated to whole minutes.
    pub fn duration_label(&self) -> String {
        format_duration_label(self.duration())
    }
}

// ── Enumerations ────────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Display label ("Alta", "Média", "Baixa").
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "Alta",
            Priority::Medium => "Média",
            Priority::Low => "Baixa",
        }
    }

    /// Stable key ("HIGH", "MEDIUM", "LOW").
    pub fn key(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl FromStr for Priority {
    type Err = AgendaError;

    /// Accepts either the display label or the key, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "alta" | "high" => Ok(Priority::High),
            "média" | "media" | "medium" => Ok(Priority::Medium),
            "baixa" | "low" => Ok(Priority::Low),
            _ => Err(AgendaError::InvalidLabel(format!("priority '{s}'"))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Category {
    #[default]
    Fiscal,
    Dev,
    Leisure,
    Personal,
}

impl Category {
    /// Display label, also used as the serialized value.
    pub fn label(self) -> &'static str {
        match self {
            Category::Fiscal => "Fiscal",
            Category::Dev => "Desenvolvimento",
            Category::Leisure => "Lazer",
            Category::Personal => "Pessoal",
        }
    }

    /// Resolve a label, falling back to [`Category::default`] on unknown input.
    pub fn from_label_lossy(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!(label = s, "unknown category label, using default");
            Category::default()
        })
    }
}

impl FromStr for Category {
    type Err = AgendaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fiscal" => Ok(Category::Fiscal),
            "desenvolvimento" | "dev" => Ok(Category::Dev),
            "lazer" | "leisure" => Ok(Category::Leisure),
            "pessoal" | "personal" => Ok(Category::Personal),
            _ => Err(AgendaError::InvalidLabel(format!("category '{s}'"))),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Category::from_label_lossy(&raw))
    }
}

/// Where an event came from. Only custom events are edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Routine,
    Custom,
    External,
}

// ── Event ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    title: String,
    range: TimeRange,
    priority: Priority,
    category: Category,
    notes: Option<String>,
    origin: Origin,
}

impl Event {
    /// Surrounding whitespace is trimmed from `title`.
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError::EmptyTitle`] for a blank title.
    pub fn new(
        title: impl Into<String>,
        range: TimeRange,
        priority: Priority,
        category: Category,
        notes: Option<String>,
        origin: Origin,
    ) -> Result<Self> {
        let title: String = title.into();
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AgendaError::EmptyTitle);
        }
        let notes = notes.filter(|n| !n.trim().is_empty());
        Ok(Self {
            title,
            range,
            priority,
            category,
            notes,
            origin,
        })
    }

    /// A routine block. Callers guarantee `start < end` and a non-blank title.
    pub(crate) fn routine(
        title: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        priority: Priority,
        category: Category,
    ) -> Self {
        debug_assert!(start < end && !title.trim().is_empty());
        Self {
            title: title.to_string(),
            range: TimeRange { start, end },
            priority,
            category,
            notes: None,
            origin: Origin::Routine,
        }
    }

    /// Convenience constructor validating the range as well.
    pub fn custom(
        title: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        priority: Priority,
        category: Category,
        notes: Option<String>,
    ) -> Result<Self> {
        let range = TimeRange::new(start, end)?;
        Self::new(title, range, priority, category, notes, Origin::Custom)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn range(&self) -> &TimeRange {
        &self.range
    }

    pub fn start(&self) -> NaiveDateTime {
        self.range.start()
    }

    pub fn end(&self) -> NaiveDateTime {
        self.range.end()
    }

    pub fn date(&self) -> NaiveDate {
        self.range.start().date()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn is_custom(&self) -> bool {
        self.origin == Origin::Custom
    }

    pub fn duration_label(&self) -> String {
        self.range.duration_label()
    }

    pub fn key(&self) -> EventKey {
        EventKey {
            start: self.start(),
            title: self.title.clone(),
            category: self.category,
        }
    }

    /// The same event with a different provenance tag.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn to_record(&self) -> EventRecord {
        EventRecord {
            title: self.title.clone(),
            start: self.start(),
            end: self.end(),
            duration: self.duration_label(),
            priority: self.priority.label().to_string(),
            category: self.category,
            priority_key: Some(self.priority),
            notes: self.notes.clone(),
            is_custom: self.is_custom(),
        }
    }
}

// ── Identity & deletion markers ─────────────────────────────────────────────

/// Identity of an event: `(start, title, category)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    #[serde(with = "local_datetime")]
    pub start: NaiveDateTime,
    pub title: String,
    pub category: Category,
}

impl EventKey {
    pub fn new(start: NaiveDateTime, title: impl Into<String>, category: Category) -> Self {
        Self {
            start,
            title: title.into(),
            category,
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.start == event.start() && self.category == event.category() && self.title == event.title()
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' ({})",
            format_local_datetime(&self.start),
            self.title,
            self.category
        )
    }
}

/// A persisted tuple suppressing a routine or external event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeletionMarker(EventKey);

impl DeletionMarker {
    pub fn new(key: EventKey) -> Self {
        Self(key)
    }

    pub fn key(&self) -> &EventKey {
        &self.0
    }

    pub fn suppresses(&self, event: &Event) -> bool {
        self.0.matches(event)
    }
}

// ── Serialized record ───────────────────────────────────────────────────────

/// The serialized event shape.
///
/// `duration` is derived and ignored on input. `priorityKey` wins over the
/// `priority` label when both are present; unknown values fall back to
/// [`Priority::Medium`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub title: String,
    #[serde(with = "local_datetime")]
    pub start: NaiveDateTime,
    #[serde(with = "local_datetime")]
    pub end: NaiveDateTime,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default, deserialize_with = "lossy_priority_key")]
    pub priority_key: Option<Priority>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
}

impl EventRecord {
    /// Rebuild an [`Event`] with the given provenance.
    ///
    /// # Errors
    ///
    /// Propagates range and title validation failures.
    pub fn into_event(self, origin: Origin) -> Result<Event> {
        let priority = self
            .priority_key
            .or_else(|| self.priority.parse().ok())
            .unwrap_or_default();
        let range = TimeRange::new(self.start, self.end)?;
        Event::new(self.title, range, priority, self.category, self.notes, origin)
    }
}

fn lossy_priority_key<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Priority>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::parse_local_datetime;

    fn at(s: &str) -> NaiveDateTime {
        parse_local_datetime(s).unwrap()
    }

    fn dentist() -> Event {
        Event::custom(
            "Dentist",
            at("2024-03-05 09:00"),
            at("2024-03-05 10:00"),
            Priority::High,
            Category::Personal,
            Some("bring x-rays".to_string()),
        )
        .unwrap()
    }

    // ── TimeRange tests ─────────────────────────────────────────────────

    #[test]
    fn test_range_valid() {
        let range = TimeRange::new(at("2024-03-04 08:00"), at("2024-03-04 12:00")).unwrap();
        assert_eq!(range.duration_label(), "4h 0m");
    }

    #[test]
    fn test_range_equal_endpoints_rejected() {
        let t = at("2024-03-04 08:00");
        let err = TimeRange::new(t, t).unwrap_err();
        assert!(matches!(err, AgendaError::InvalidRange { .. }));
    }

    #[test]
    fn test_range_reversed_rejected() {
        let err = TimeRange::new(at("2024-03-04 12:00"), at("2024-03-04 08:00")).unwrap_err();
        assert!(err.to_string().contains("must be before end"), "got: {err}");
    }

    #[test]
    fn test_range_duration_label_minutes() {
        let range = TimeRange::new(at("2024-03-04 09:15"), at("2024-03-04 10:00")).unwrap();
        assert_eq!(range.duration_label(), "0h 45m");
    }

    // ── Event tests ─────────────────────────────────────────────────────

    #[test]
    fn test_event_blank_title_rejected() {
        let range = TimeRange::new(at("2024-03-04 08:00"), at("2024-03-04 09:00")).unwrap();
        let err = Event::new("   ", range, Priority::Low, Category::Leisure, None, Origin::Custom)
            .unwrap_err();
        assert!(matches!(err, AgendaError::EmptyTitle));
    }

    #[test]
    fn test_event_title_is_trimmed() {
        let event = Event::custom(
            "  Dentist \t",
            at("2024-03-05 09:00"),
            at("2024-03-05 10:00"),
            Priority::High,
            Category::Personal,
            None,
        )
        .unwrap();
        assert_eq!(event.title(), "Dentist");
        assert!(EventKey::new(at("2024-03-05 09:00"), "Dentist", Category::Personal)
            .matches(&event));
    }

    #[test]
    fn test_event_blank_notes_become_none() {
        let range = TimeRange::new(at("2024-03-04 08:00"), at("2024-03-04 09:00")).unwrap();
        let event = Event::new(
            "Call",
            range,
            Priority::Low,
            Category::Personal,
            Some("  ".to_string()),
            Origin::Custom,
        )
        .unwrap();
        assert_eq!(event.notes(), None);
    }

    #[test]
    fn test_event_key_matches_only_same_triple() {
        let event = dentist();
        let key = event.key();
        assert!(key.matches(&event));

        let other_title = EventKey::new(event.start(), "Doctor", Category::Personal);
        assert!(!other_title.matches(&event));

        let other_category = EventKey::new(event.start(), "Dentist", Category::Leisure);
        assert!(!other_category.matches(&event));
    }

    // ── Label tests ─────────────────────────────────────────────────────

    #[test]
    fn test_priority_parses_label_and_key() {
        assert_eq!("Média".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("baixa".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_category_unknown_falls_back() {
        assert_eq!(Category::from_label_lossy("Saúde"), Category::Fiscal);
        assert_eq!(Category::from_label_lossy("Lazer"), Category::Leisure);
    }

    // ── Record tests ────────────────────────────────────────────────────

    #[test]
    fn test_record_shape() {
        let json = serde_json::to_value(dentist().to_record()).unwrap();
        assert_eq!(json["title"], "Dentist");
        assert_eq!(json["start"], "2024-03-05 09:00");
        assert_eq!(json["end"], "2024-03-05 10:00");
        assert_eq!(json["duration"], "1h 0m");
        assert_eq!(json["priority"], "Alta");
        assert_eq!(json["priorityKey"], "HIGH");
        assert_eq!(json["category"], "Pessoal");
        assert_eq!(json["notes"], "bring x-rays");
        assert_eq!(json["isCustom"], true);
    }

    #[test]
    fn test_record_null_notes() {
        let event = Event::custom(
            "Standup",
            at("2024-03-05 09:00"),
            at("2024-03-05 09:15"),
            Priority::Low,
            Category::Dev,
            None,
        )
        .unwrap();
        let json = serde_json::to_value(event.to_record()).unwrap();
        assert!(json["notes"].is_null());
    }

    #[test]
    fn test_record_lenient_input() {
        // Unknown category and priority key fall back; priority label is used
        let raw = r#"{
            "title": "Consulta",
            "start": "2024-03-05 09:00:00",
            "end": "2024-03-05 10:30",
            "priority": "Baixa",
            "category": "Saúde",
            "priorityKey": "URGENT"
        }"#;
        let record: EventRecord = serde_json::from_str(raw).unwrap();
        let event = record.into_event(Origin::External).unwrap();
        assert_eq!(event.priority(), Priority::Low);
        assert_eq!(event.category(), Category::Fiscal);
        assert_eq!(event.duration_label(), "1h 30m");
        assert_eq!(event.origin(), Origin::External);
    }

    #[test]
    fn test_record_without_priority_defaults_to_medium() {
        let raw = r#"{"title": "X", "start": "2024-03-05 09:00", "end": "2024-03-05 10:00"}"#;
        let record: EventRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.into_event(Origin::Custom).unwrap().priority(), Priority::Medium);
    }

    #[test]
    fn test_record_with_reversed_range_fails() {
        let raw = r#"{"title": "X", "start": "2024-03-05 10:00", "end": "2024-03-05 09:00"}"#;
        let record: EventRecord = serde_json::from_str(raw).unwrap();
        assert!(record.into_event(Origin::Custom).is_err());
    }

    #[test]
    fn test_deletion_marker_shape() {
        let marker = DeletionMarker::new(dentist().key());
        let json = serde_json::to_value(&marker).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "start": "2024-03-05 09:00",
                "title": "Dentist",
                "category": "Pessoal"
            })
        );
        let back: DeletionMarker = serde_json::from_value(json).unwrap();
        assert!(back.suppresses(&dentist()));
    }
}
