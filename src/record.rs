use serde::ser::{Serialize, SerializeTuple, Serializer};
use std::fmt;

/// Console method the browser extension uses to render a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Log,
    Warn,
    Error,
    Info,
    Group,
    GroupCollapsed,
    GroupEnd,
    Table,
}

impl EventKind {
    /// Wire name of the kind, as placed in the third column of a row.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Log => "log",
            EventKind::Warn => "warn",
            EventKind::Error => "error",
            EventKind::Info => "info",
            EventKind::Group => "group",
            EventKind::GroupCollapsed => "groupCollapsed",
            EventKind::GroupEnd => "groupEnd",
            EventKind::Table => "table",
        }
    }

    /// Group markers never carry a source location.
    pub fn is_group_marker(self) -> bool {
        matches!(
            self,
            EventKind::Group | EventKind::GroupCollapsed | EventKind::GroupEnd
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logging call as it will appear on the wire.
///
/// Serializes as the three-column row `[payload, location, kind]`, with a
/// missing location written as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub payload: Vec<serde_json::Value>,
    pub location: Option<String>,
    pub kind: EventKind,
}

impl Serialize for LogEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_tuple(3)?;
        row.serialize_element(&self.payload)?;
        row.serialize_element(&self.location)?;
        row.serialize_element(&self.kind)?;
        row.end()
    }
}
