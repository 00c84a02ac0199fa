use crate::sink::{HeaderError, HeaderSink};
use std::collections::BTreeMap;

/// A sink that keeps headers in memory.
///
/// Useful for hosts that copy headers onto their own response type at the
/// end of a request, and for tests that decode what would have been sent.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    headers: BTreeMap<String, String>,
    writes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a header; names compare case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Number of successful `set_header` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl HeaderSink for MemorySink {
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_last_value_per_header() {
        let mut sink = MemorySink::new();
        sink.set_header("X-ChromeLogger-Data", "a").unwrap();
        sink.set_header("x-chromelogger-data", "b").unwrap();

        assert_eq!(sink.header("X-CHROMELOGGER-DATA"), Some("b"));
        assert_eq!(sink.writes(), 2);
        assert_eq!(sink.iter().count(), 1);
    }
}
