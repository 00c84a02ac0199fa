use crate::host::Host;
use crate::layer::{ConsoleLayer, SharedLogger};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the tracing bridge.
///
/// **Fields**
/// - `max_level`: least severe level forwarded to the browser console.
/// - `group_events`: wrap every event in a console group with a
///   timestamp/pid/level/target title, as opposed to one row per event.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   stacked on top of [`ConsoleLayer`] so events also reach the terminal.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub max_level: Level,
    pub group_events: bool,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            max_level: Level::DEBUG,
            group_events: true,
            enable_stdout: false,
        }
    }
}

/// Run `f` with `tracing` events forwarded into `logger`.
///
/// **Parameters**
/// - `logger`: the request's shared logger; application code may keep
///   calling its verbs directly through the same handle.
/// - `config`: [`LayerConfig`] controlling the bridge.
///
/// **Effects**
///
/// Installs a [`Registry`] with [`ConsoleLayer`] as the default
/// subscriber of the current thread for the duration of `f` only, so
/// concurrent requests on other threads keep their own loggers.
pub fn with_console_logging<H, F, R>(logger: SharedLogger<H>, config: LayerConfig, f: F) -> R
where
    H: Host + Send + 'static,
    F: FnOnce() -> R,
{
    let layer = ConsoleLayer::new(Arc::clone(&logger), config.max_level, config.group_events);

    // The two branches build different subscriber types.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::with_default(subscriber, f)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, f)
    }
}

/// Equivalent to [`with_console_logging`] with [`LayerConfig::default`].
pub fn with_default_console_logging<H, F, R>(logger: SharedLogger<H>, f: F) -> R
where
    H: Host + Send + 'static,
    F: FnOnce() -> R,
{
    with_console_logging(logger, LayerConfig::default(), f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RequestHost;
    use crate::layer::shared;
    use crate::logger::ConsoleLogger;
    use crate::memory_sink::MemorySink;
    use crate::record::EventKind;

    #[test]
    fn bridge_is_scoped_to_the_closure() {
        let logger = shared(ConsoleLogger::new(RequestHost::new(true, "/", MemorySink::new())));

        let answer = with_default_console_logging(Arc::clone(&logger), || {
            tracing::info!("inside");
            42
        });
        tracing::info!("outside");

        assert_eq!(answer, 42);
        let logger = logger.lock();
        assert_eq!(logger.rows().len(), 4);
        assert_eq!(logger.rows()[1].kind, EventKind::Info);
    }

    #[test]
    fn trace_is_filtered_by_default() {
        let logger = shared(ConsoleLogger::new(RequestHost::new(true, "/", MemorySink::new())));
        let config = LayerConfig {
            group_events: false,
            ..LayerConfig::default()
        };

        with_console_logging(Arc::clone(&logger), config, || {
            tracing::trace!("too chatty");
            tracing::debug!("kept");
        });

        assert_eq!(logger.lock().rows().len(), 1);
    }
}
