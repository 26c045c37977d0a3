/// Live event schema
///
/// Every event the hub fans out carries:
/// - a kind code (e.g. "update"), derived from the payload variant
/// - an optional scope (the widget or entity the event is about)
/// - a typed payload
/// - a creation timestamp (unix seconds)
///
/// Wire form: `{"type", "widget_id" (omitted when unscoped), "data", "timestamp"}`.
/// Payloads are validated against their kind when deserialized, so consumers
/// can match on `EventPayload` without inspecting raw JSON.
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::errors::PayloadError;

// ============================================================================
// EVENT KIND
// ============================================================================

/// Kind codes used on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Update,
    Error,
    DataChanged,
    Notification,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Update,
        EventKind::Error,
        EventKind::DataChanged,
        EventKind::Notification,
    ];

    /// Get kind code string (used in the "type" field)
    pub fn code(&self) -> &'static str {
        match self {
            EventKind::Update => "update",
            EventKind::Error => "error",
            EventKind::DataChanged => "data_changed",
            EventKind::Notification => "notification",
        }
    }

    /// Parse kind from code string
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "update" => Some(EventKind::Update),
            "error" => Some(EventKind::Error),
            "data_changed" => Some(EventKind::DataChanged),
            "notification" => Some(EventKind::Notification),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// PAYLOADS
// ============================================================================

/// A widget failed to refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetFailure {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

/// Stored data behind a widget changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataChange {
    pub entity: String,
    pub action: ChangeAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// User-facing notice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Typed event payload, one variant per kind
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Fresh widget content; the shape belongs to the widget
    Update(serde_json::Value),
    Error(WidgetFailure),
    DataChanged(DataChange),
    Notification(Notification),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Update(_) => EventKind::Update,
            EventPayload::Error(_) => EventKind::Error,
            EventPayload::DataChanged(_) => EventKind::DataChanged,
            EventPayload::Notification(_) => EventKind::Notification,
        }
    }

    /// Build a payload from a kind and untyped data, checking the data fits the kind
    pub fn from_parts(kind: EventKind, data: serde_json::Value) -> Result<Self, PayloadError> {
        let mismatch = |source| PayloadError::Mismatch {
            kind: kind.code(),
            source,
        };

        Ok(match kind {
            EventKind::Update => EventPayload::Update(data),
            EventKind::Error => EventPayload::Error(serde_json::from_value(data).map_err(mismatch)?),
            EventKind::DataChanged => {
                EventPayload::DataChanged(serde_json::from_value(data).map_err(mismatch)?)
            }
            EventKind::Notification => {
                EventPayload::Notification(serde_json::from_value(data).map_err(mismatch)?)
            }
        })
    }

    /// Same as `from_parts`, starting from a kind code
    pub fn from_code(code: &str, data: serde_json::Value) -> Result<Self, PayloadError> {
        let kind =
            EventKind::from_code(code).ok_or_else(|| PayloadError::UnknownKind(code.to_string()))?;
        Self::from_parts(kind, data)
    }
}

/// Serializes only the inner data of a payload (the "data" field)
struct PayloadData<'a>(&'a EventPayload);

impl Serialize for PayloadData<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            EventPayload::Update(value) => value.serialize(serializer),
            EventPayload::Error(failure) => failure.serialize(serializer),
            EventPayload::DataChanged(change) => change.serialize(serializer),
            EventPayload::Notification(notification) => notification.serialize(serializer),
        }
    }
}

// ============================================================================
// EVENT
// ============================================================================

/// One live event; immutable after construction and delivered by value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "EventWire")]
pub struct Event {
    payload: EventPayload,
    scope: Option<String>,
    timestamp: i64,
}

impl Event {
    /// Unscoped event stamped with the current time
    pub fn new(payload: EventPayload) -> Self {
        Self {
            payload,
            scope: None,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Event about a specific widget or entity
    pub fn scoped(scope: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            scope: Some(scope.into()),
            ..Self::new(payload)
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Render the wire form as a JSON string
    pub fn to_json(&self) -> Result<String, PayloadError> {
        serde_json::to_string(self).map_err(PayloadError::Serialize)
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.scope.is_some() { 4 } else { 3 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("type", self.kind().code())?;
        if let Some(scope) = &self.scope {
            map.serialize_entry("widget_id", scope)?;
        }
        map.serialize_entry("data", &PayloadData(&self.payload))?;
        map.serialize_entry("timestamp", &self.timestamp)?;
        map.end()
    }
}

#[derive(Deserialize)]
struct EventWire {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    widget_id: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
    timestamp: i64,
}

impl TryFrom<EventWire> for Event {
    type Error = PayloadError;

    fn try_from(wire: EventWire) -> Result<Self, Self::Error> {
        Ok(Self {
            payload: EventPayload::from_code(&wire.kind, wire.data)?,
            scope: wire.widget_id,
            timestamp: wire.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_codes_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(EventKind::from_code("bogus"), None);
    }

    #[test]
    fn test_wire_shape() {
        let event = Event::scoped("widget-1", EventPayload::Update(json!({"x": 1})));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "update");
        assert_eq!(value["widget_id"], "widget-1");
        assert_eq!(value["data"], json!({"x": 1}));
        assert_eq!(value["timestamp"], event.timestamp());
    }

    #[test]
    fn test_unscoped_event_omits_widget_id() {
        let event = Event::new(EventPayload::Notification(Notification {
            level: NotificationLevel::Warning,
            message: "disk almost full".to_string(),
        }));
        let value = serde_json::to_value(&event).unwrap();

        assert!(value.get("widget_id").is_none());
        assert_eq!(value["data"]["level"], "warning");
    }

    #[test]
    fn test_deserialize_validates_payload() {
        let raw = r#"{"type":"data_changed","widget_id":"todo","data":{"entity":"task","action":"deleted"},"timestamp":1700000000}"#;
        let event: Event = serde_json::from_str(raw).unwrap();

        assert_eq!(event.kind(), EventKind::DataChanged);
        assert_eq!(event.scope(), Some("todo"));
        match event.payload() {
            EventPayload::DataChanged(change) => {
                assert_eq!(change.entity, "task");
                assert_eq!(change.action, ChangeAction::Deleted);
                assert!(change.id.is_none());
            }
            other => panic!("unexpected payload {:?}", other),
        }

        let bad = r#"{"type":"error","data":{"code":5},"timestamp":1}"#;
        assert!(serde_json::from_str::<Event>(bad).is_err());

        let unknown = r#"{"type":"telemetry","data":{},"timestamp":1}"#;
        assert!(serde_json::from_str::<Event>(unknown).is_err());
    }

    #[test]
    fn test_from_code_reports_mismatch() {
        let err = EventPayload::from_code("notification", json!({"foo": 1})).unwrap_err();
        assert!(matches!(err, PayloadError::Mismatch { kind: "notification", .. }));

        let err = EventPayload::from_code("nope", json!(null)).unwrap_err();
        assert!(matches!(err, PayloadError::UnknownKind(code) if code == "nope"));
    }

    #[test]
    fn test_to_json_parses_back() {
        let event = Event::scoped(
            "weather",
            EventPayload::Error(WidgetFailure {
                message: "upstream 503".to_string(),
            }),
        );
        let parsed: Event = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(parsed, event);
    }
}
