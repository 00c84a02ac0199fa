use crate::encoder::{encode, EncodeError, HEADER_NAME};
use crate::host::Host;
use crate::location::{capture, locate};
use crate::record::{EventKind, LogEvent};
use crate::session::Session;
use crate::settings::Settings;
use crate::value::Value;
use crate::DIAGNOSTICS_TARGET;
use std::cell::Cell;
use std::panic::Location;

thread_local! {
    static RECORDING: Cell<bool> = const { Cell::new(false) };
}

/// Whether a logger on this thread is between entering a verb and
/// publishing its header. Conversions, `Composite::members` and the host
/// all run inside that window.
pub(crate) fn recording_on_this_thread() -> bool {
    RECORDING.with(Cell::get)
}

/// Marks the current thread as recording until dropped.
struct RecordingGuard {
    outer: bool,
}

impl RecordingGuard {
    fn enter() -> Self {
        RecordingGuard {
            outer: RECORDING.with(|flag| flag.replace(true)),
        }
    }
}

impl Drop for RecordingGuard {
    fn drop(&mut self) {
        RECORDING.with(|flag| flag.set(self.outer));
    }
}

/// Activation progress of a [`ConsoleLogger`] for its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Checking,
    Disabled,
    Active,
}

/// Per-request console logger.
///
/// Activation is decided on the first logging call: the host must report a
/// development context and expose both a request URI and a response. The
/// outcome is final for the lifetime of the logger. While active, every
/// verb appends a row and immediately rewrites the response header, so a
/// request that ends abruptly still carries everything logged so far.
///
/// No verb ever fails; problems are reported through `tracing` and the
/// call becomes a no-op for the header.
pub struct ConsoleLogger<H> {
    host: H,
    state: State,
    session: Option<Session>,
    settings: Settings,
}

impl<H: Host> ConsoleLogger<H> {
    pub fn new(host: H) -> Self {
        Self::with_settings(host, Settings::default())
    }

    pub fn with_settings(host: H, settings: Settings) -> Self {
        ConsoleLogger {
            host,
            state: State::Uninitialized,
            session: None,
            settings,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Rows logged so far; empty until the logger is active.
    pub fn rows(&self) -> &[LogEvent] {
        self.session.as_ref().map(Session::rows).unwrap_or(&[])
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Runs the activation check if it has not happened yet.
    pub fn activate(&mut self) -> bool {
        match self.state {
            State::Active => return true,
            State::Disabled | State::Checking => return false,
            State::Uninitialized => {}
        }

        self.state = State::Checking;
        self.state = if !self.host.is_development() {
            tracing::debug!(
                target: DIAGNOSTICS_TARGET,
                "console logging disabled: not a development context"
            );
            State::Disabled
        } else {
            match (self.host.request_uri(), self.host.response().is_some()) {
                (Some(uri), true) => {
                    tracing::debug!(
                        target: DIAGNOSTICS_TARGET,
                        request_uri = %uri,
                        "console logging active"
                    );
                    self.session = Some(Session::new(uri));
                    State::Active
                }
                _ => {
                    tracing::debug!(
                        target: DIAGNOSTICS_TARGET,
                        "console logging disabled: no active request"
                    );
                    State::Disabled
                }
            }
        };
        self.state == State::Active
    }

    #[track_caller]
    pub fn log<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.dispatch(EventKind::Log, args);
    }

    #[track_caller]
    pub fn info<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.dispatch(EventKind::Info, args);
    }

    #[track_caller]
    pub fn warn<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.dispatch(EventKind::Warn, args);
    }

    #[track_caller]
    pub fn error<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.dispatch(EventKind::Error, args);
    }

    #[track_caller]
    pub fn group<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.dispatch(EventKind::Group, args);
    }

    #[track_caller]
    pub fn group_collapsed<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.dispatch(EventKind::GroupCollapsed, args);
    }

    /// Closes the innermost group.
    #[track_caller]
    pub fn group_end(&mut self) {
        self.dispatch(EventKind::GroupEnd, Vec::<Value>::new());
    }

    /// Closes the innermost group with a payload. Unlike the other verbs
    /// this records a row even when `args` is empty.
    #[track_caller]
    pub fn group_end_with<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.dispatch(EventKind::GroupEnd, args);
    }

    #[track_caller]
    pub fn table<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.dispatch(EventKind::Table, args);
    }

    pub fn add_setting(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.settings.add_setting(key, value);
    }

    pub fn add_settings<I, K, V>(&mut self, settings: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.settings.add_settings(settings);
    }

    pub fn get_setting(&self, key: &str) -> Option<&serde_json::Value> {
        self.settings.get_setting(key)
    }

    #[track_caller]
    fn dispatch<I>(&mut self, kind: EventKind, args: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let _recording = RecordingGuard::enter();
        if !self.activate() {
            return;
        }
        let args: Vec<Value> = args.into_iter().map(Into::into).collect();
        if args.is_empty() && kind != EventKind::GroupEnd {
            return;
        }

        let depth = self.settings.backtrace_level();
        let location = if kind.is_group_marker() {
            None
        } else {
            Some(locate(&capture(Location::caller(), depth), depth))
        };
        self.record_at(kind, &args, location);
    }

    /// Appends a row with an explicit location and republishes the header.
    ///
    /// Used by callers that already know where an event comes from, such as
    /// the tracing bridge.
    pub fn record_at(&mut self, kind: EventKind, args: &[Value], location: Option<String>) {
        let _recording = RecordingGuard::enter();
        if !self.activate() {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.record(kind, args, location) {
            self.publish();
        }
    }

    fn publish(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let encoded = match encode(session) {
            Ok(encoded) => encoded,
            Err(EncodeError::TooLarge { size, limit }) => {
                tracing::warn!(
                    target: DIAGNOSTICS_TARGET,
                    size,
                    limit,
                    rows = session.rows().len(),
                    "console payload over budget; keeping previous header"
                );
                return;
            }
            Err(e) => {
                tracing::warn!(target: DIAGNOSTICS_TARGET, error = %e, "failed to encode console payload");
                return;
            }
        };

        match self.host.response() {
            Some(response) => {
                if let Err(e) = response.set_header(HEADER_NAME, &encoded) {
                    tracing::warn!(target: DIAGNOSTICS_TARGET, error = %e, "response rejected console header");
                }
            }
            None => tracing::warn!(target: DIAGNOSTICS_TARGET, "response went away; console header not written"),
        }
    }
}
