use crate::host::Host;
use crate::logger::{recording_on_this_thread, ConsoleLogger};
use crate::record::EventKind;
use crate::value::Value;
use crate::DIAGNOSTICS_TARGET;
use chrono::Local;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// A logger shared between application code and [`ConsoleLayer`].
///
/// Events from other threads wait for the lock. Do not emit `tracing`
/// events while holding the guard outside a logging verb: the layer would
/// wait on the same thread.
pub type SharedLogger<H> = Arc<Mutex<ConsoleLogger<H>>>;

/// Wraps a logger for sharing with [`ConsoleLayer`].
pub fn shared<H: Host>(logger: ConsoleLogger<H>) -> SharedLogger<H> {
    Arc::new(Mutex::new(logger))
}

/// `tracing_subscriber` layer that forwards events into a
/// [`ConsoleLogger`].
///
/// With grouping on, every event becomes a console group:
///
/// ```text
/// group("24-05-01 12:00:00 4242 ERROR my_app::auth")
///   error("authentication failed")
///   log("my_app::auth")           // module path, when known
///   log({"user_id": 42})          // fields, when any
/// groupEnd()
/// ```
///
/// Without grouping a single `error("authentication failed", {fields})`
/// row is written. Rows are attributed to the event's `file : line`.
pub struct ConsoleLayer<H> {
    logger: SharedLogger<H>,
    max_level: Level,
    group_events: bool,
}

impl<H: Host> ConsoleLayer<H> {
    /// Layer forwarding events at `max_level` and more severe.
    pub fn new(logger: SharedLogger<H>, max_level: Level, group_events: bool) -> Self {
        ConsoleLayer {
            logger,
            max_level,
            group_events,
        }
    }

    pub fn logger(&self) -> &SharedLogger<H> {
        &self.logger
    }
}

/// Console method used for a tracing level.
pub fn kind_for_level(level: &Level) -> EventKind {
    match *level {
        Level::ERROR => EventKind::Error,
        Level::WARN => EventKind::Warn,
        Level::INFO => EventKind::Info,
        _ => EventKind::Log,
    }
}

/// Title of the group opened for an event.
fn group_title(level: &Level, target: &str) -> String {
    format!(
        "{} {} {} {}",
        Local::now().format("%y-%m-%d %H:%M:%S"),
        std::process::id(),
        level,
        target
    )
}

impl<S, H> Layer<S> for ConsoleLayer<H>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    H: Host + Send + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() > self.max_level {
            return;
        }
        // never feed on the logger's own diagnostics
        if meta.target() == DIAGNOSTICS_TARGET {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let location = match (meta.file(), meta.line()) {
            (Some(file), Some(line)) => Some(format!("{} : {}", file, line)),
            _ => None,
        };
        let kind = kind_for_level(meta.level());
        let message = Value::from(message.unwrap_or_default());
        let fields = (!fields.is_empty()).then(|| Value::from(fields));

        // raised from inside a logging verb on this thread (a Composite
        // impl, a conversion, the host); the lock is already taken here
        if recording_on_this_thread() {
            return;
        }
        let mut logger = self.logger.lock();

        if self.group_events {
            logger.record_at(
                EventKind::Group,
                &[Value::from(group_title(meta.level(), meta.target()))],
                None,
            );
            logger.record_at(kind, &[message], location);
            if let Some(module) = meta.module_path() {
                logger.record_at(EventKind::Log, &[Value::from(module)], None);
            }
            if let Some(fields) = fields {
                logger.record_at(EventKind::Log, &[fields], None);
            }
            logger.record_at(EventKind::GroupEnd, &[], None);
        } else {
            let mut args = vec![message];
            args.extend(fields);
            logger.record_at(kind, &args, location);
        }
    }
}

/// Collects event fields as JSON, splitting out `message`.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let number = serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(value.to_string()));
        self.fields.insert(field.name().to_string(), number);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
