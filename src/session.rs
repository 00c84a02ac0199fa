use crate::record::{EventKind, LogEvent};
use crate::serializer::serialize_argument;
use crate::value::Value;
use std::collections::HashSet;

/// Rows accumulated for one request.
///
/// Created when the logger activates and dropped with it. Rows are only
/// ever appended, and the set of seen locations only grows.
#[derive(Debug, Clone, Default)]
pub struct Session {
    rows: Vec<LogEvent>,
    seen_locations: HashSet<String>,
    request_uri: String,
}

impl Session {
    pub fn new(request_uri: impl Into<String>) -> Self {
        Session {
            rows: Vec::new(),
            seen_locations: HashSet::new(),
            request_uri: request_uri.into(),
        }
    }

    pub fn rows(&self) -> &[LogEvent] {
        &self.rows
    }

    pub fn request_uri(&self) -> &str {
        &self.request_uri
    }

    pub fn has_seen(&self, location: &str) -> bool {
        self.seen_locations.contains(location)
    }

    /// Builds and appends one row.
    ///
    /// Returns `false` without touching the session when there is nothing to
    /// log: no arguments on any kind but [`EventKind::GroupEnd`].
    ///
    /// A location already attributed to an earlier row is dropped from this
    /// one; group markers never keep a location.
    pub fn record(&mut self, kind: EventKind, args: &[Value], location: Option<String>) -> bool {
        if args.is_empty() && kind != EventKind::GroupEnd {
            return false;
        }

        let payload = args.iter().map(serialize_argument).collect();

        let location = location
            .filter(|l| !l.is_empty())
            .filter(|l| !self.seen_locations.contains(l))
            .filter(|_| !kind.is_group_marker());
        if let Some(l) = &location {
            self.seen_locations.insert(l.clone());
        }

        self.rows.push(LogEvent {
            payload,
            location,
            kind,
        });
        true
    }
}
