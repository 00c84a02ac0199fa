//! Source attribution for logging calls.
//!
//! Frame 0 is the logging API itself and frame 1 the code that called the
//! verb, taken from `#[track_caller]`. Frames further out are only resolved
//! through a captured backtrace when the configured depth asks for them.

use crate::DIAGNOSTICS_TARGET;
use std::panic::Location;
use std::path::Path;

/// Location reported when the requested frame is missing or incomplete.
pub const UNKNOWN: &str = "unknown";

/// One call-stack entry. Either field may be missing when symbols are
/// stripped or a frame was inlined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl Frame {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Frame {
            file: Some(file.into()),
            line: Some(line),
        }
    }
}

impl From<&Location<'_>> for Frame {
    fn from(location: &Location<'_>) -> Self {
        Frame::new(location.file(), location.line())
    }
}

/// Returns `"<file> : <line>"` for `stack[depth]`, or [`UNKNOWN`].
pub fn locate(stack: &[Frame], depth: usize) -> String {
    match stack.get(depth) {
        Some(Frame {
            file: Some(file),
            line: Some(line),
        }) => format!("{} : {}", file, line),
        _ => UNKNOWN.to_string(),
    }
}

/// Builds the stack needed to resolve `depth`, innermost first.
///
/// `caller` is where application code invoked the logging verb. Only frames
/// up to `depth` are collected, so the default depth never walks the real
/// stack.
pub fn capture(caller: &Location<'_>, depth: usize) -> Vec<Frame> {
    let mut stack = vec![Frame::new(file!(), line!()), Frame::from(caller)];
    if depth >= stack.len() {
        stack.extend(frames_beyond(caller).into_iter().take(depth + 1 - stack.len()));
    }
    stack
}

/// Walks the native stack, finds the frame executing at `caller` and
/// returns the frames outside it.
fn frames_beyond(caller: &Location<'_>) -> Vec<Frame> {
    let trace = backtrace::Backtrace::new();
    let mut frames = Vec::new();
    let mut found = false;

    for frame in trace.frames() {
        for symbol in frame.symbols() {
            let file = symbol.filename();
            let line = symbol.lineno();
            if found {
                frames.push(Frame {
                    file: file.map(|p| p.display().to_string()),
                    line,
                });
            } else if is_caller(file, line, caller) {
                found = true;
            }
        }
    }

    if !found {
        tracing::debug!(
            target: DIAGNOSTICS_TARGET,
            caller = %caller,
            "caller frame not found in backtrace; outer frames unavailable"
        );
    }
    frames
}

fn is_caller(file: Option<&Path>, line: Option<u32>, caller: &Location<'_>) -> bool {
    match (file, line) {
        (Some(file), Some(line)) => line == caller.line() && file.ends_with(caller.file()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_formats_file_and_line() {
        let stack = vec![Frame::new("src/lib.rs", 10), Frame::new("src/app.rs", 42)];
        assert_eq!(locate(&stack, 1), "src/app.rs : 42");
        assert_eq!(locate(&stack, 0), "src/lib.rs : 10");
    }

    #[test]
    fn locate_reports_unknown_for_missing_frames() {
        let stack = vec![
            Frame::new("src/lib.rs", 10),
            Frame {
                file: Some("src/app.rs".to_string()),
                line: None,
            },
            Frame::default(),
        ];
        assert_eq!(locate(&stack, 1), UNKNOWN);
        assert_eq!(locate(&stack, 2), UNKNOWN);
        assert_eq!(locate(&stack, 9), UNKNOWN);
    }

    #[test]
    fn capture_places_caller_at_depth_one() {
        let caller = Location::caller();
        let stack = capture(caller, 1);
        assert_eq!(stack.len(), 2);
        assert_eq!(locate(&stack, 1), format!("{} : {}", caller.file(), caller.line()));
        assert!(locate(&stack, 0).contains("location.rs"));
    }

    #[test]
    fn capture_never_returns_more_than_requested() {
        let stack = capture(Location::caller(), 3);
        assert!(stack.len() <= 4);
    }
}
