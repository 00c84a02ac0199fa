use std::sync::Arc;

use chrome_console_log::init::{with_console_logging, LayerConfig};
use chrome_console_log::layer::shared;
use chrome_console_log::{ConsoleLogger, MemorySink, RequestHost, HEADER_NAME};
use tracing::{error, info, Level};

fn main() {
    let host = RequestHost::new(true, "/login", MemorySink::new());
    let logger = shared(ConsoleLogger::new(host));

    let config = LayerConfig {
        max_level: Level::INFO,
        group_events: true,
        enable_stdout: true,
    };

    with_console_logging(Arc::clone(&logger), config, || {
        info!("starting login");
        error!(user_id = 42, reason = "invalid password", "authentication failed");
    });

    let logger = logger.lock();
    println!("{} rows logged", logger.rows().len());
    if let Some(value) = logger.host().sink().and_then(|s| s.header(HEADER_NAME)) {
        println!("{}: {}", HEADER_NAME, value);
    }
}
