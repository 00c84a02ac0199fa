//! Environment variable names used by this crate for convenient
//! configuration from services.
//!
//! These are purely helpers; the logger itself never reads the
//! environment unless asked to through `Settings::from_env` or
//! [`development_from_env`].

/// Application context, e.g. `Development`, `Development/Docker` or
/// `Production`. Only development-like contexts activate the logger.
pub const CHROME_LOGGER_CONTEXT_ENV: &str = "CHROME_LOGGER_CONTEXT";

/// Stack depth used for source attribution (default 1).
pub const CHROME_LOGGER_BACKTRACE_LEVEL_ENV: &str = "CHROME_LOGGER_BACKTRACE_LEVEL";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// A context is development-like when its root segment is `Development`.
pub fn is_development_context(context: &str) -> bool {
    context
        .split('/')
        .next()
        .map(|root| root.trim().eq_ignore_ascii_case("development"))
        .unwrap_or(false)
}

/// Evaluates [`CHROME_LOGGER_CONTEXT_ENV`]; unset means production.
pub fn development_from_env() -> bool {
    is_development_context(&env_or(CHROME_LOGGER_CONTEXT_ENV, "Production"))
}
