//! Server side of the ChromeLogger protocol.
//!
//! A [`ConsoleLogger`] lives for one request. Each logging verb serializes
//! its arguments, attributes the call to a source location and rewrites the
//! `X-ChromeLogger-Data` response header with the base64-encoded JSON of
//! everything logged so far. The browser extension renders those rows in
//! the developer console.
//!
//! ```
//! use chrome_console_log::{console, ConsoleLogger, MemorySink, RequestHost};
//!
//! let host = RequestHost::new(true, "/users/42", MemorySink::new());
//! let mut logger = ConsoleLogger::new(host);
//! console!(logger, info, "loaded user", 42);
//! console!(logger, group_end);
//!
//! assert_eq!(logger.rows().len(), 2);
//! ```

pub mod record;
pub mod value;
pub mod serializer;
pub mod location;
pub mod settings;
pub mod session;
pub mod encoder;
pub mod sink;
pub mod memory_sink;
pub mod host;
pub mod logger;
pub mod layer;

pub mod init;
pub mod env;

/// Target of the crate's own `tracing` diagnostics.
pub const DIAGNOSTICS_TARGET: &str = "chrome_console_log";

pub use encoder::{EncodeError, HEADER_NAME, VERSION};
pub use host::{Host, RequestHost};
pub use layer::{ConsoleLayer, SharedLogger};
pub use logger::{ConsoleLogger, State};
pub use memory_sink::MemorySink;
pub use record::{EventKind, LogEvent};
pub use settings::{Settings, BACKTRACE_LEVEL};
pub use sink::{HeaderError, HeaderSink};
pub use value::{Composite, Member, MemberError, Value, Visibility};
