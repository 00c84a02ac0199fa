//! Wire encoding of a [`Session`] into the `X-ChromeLogger-Data` value.

use crate::record::LogEvent;
use crate::session::Session;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

/// Protocol version announced to the browser extension.
pub const VERSION: &str = "4.1.0";

/// Response header carrying the payload.
pub const HEADER_NAME: &str = "X-ChromeLogger-Data";

/// Column names, in row order.
pub const COLUMNS: [&str; 3] = ["log", "backtrace", "type"];

/// Largest encoded payload, in KiB, that will be published.
pub const MAX_PAYLOAD_KIB: usize = 256;

#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("failed to serialize console payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("encoded console payload is {size} bytes, above the {limit} byte header budget")]
    TooLarge { size: usize, limit: usize },
}

#[derive(Serialize)]
struct Envelope<'a> {
    version: &'static str,
    columns: [&'static str; 3],
    rows: &'a [LogEvent],
    request_uri: &'a str,
}

/// Serializes the session envelope to JSON and base64-encodes it.
///
/// **Returns**
/// - `Ok(header_value)` when the encoded value fits in
///   [`MAX_PAYLOAD_KIB`].
/// - `Err(EncodeError::TooLarge)` otherwise; the caller must keep whatever
///   it published before.
///
/// Output depends only on the session contents, so encoding the same
/// session twice gives identical strings.
pub fn encode(session: &Session) -> Result<String, EncodeError> {
    let envelope = Envelope {
        version: VERSION,
        columns: COLUMNS,
        rows: session.rows(),
        request_uri: session.request_uri(),
    };
    let json = serde_json::to_vec(&envelope)?;
    let encoded = STANDARD.encode(json);

    let limit = MAX_PAYLOAD_KIB * 1024;
    if encoded.len() > limit {
        return Err(EncodeError::TooLarge {
            size: encoded.len(),
            limit,
        });
    }
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EventKind;
    use crate::value::Value;
    use proptest::prelude::*;
    use serde_json::json;

    fn decode(header: &str) -> serde_json::Value {
        let bytes = STANDARD.decode(header).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn envelope_matches_wire_format() {
        let mut session = Session::new("http://localhost/users?page=2");
        session.record(
            EventKind::Info,
            &[Value::from("hello")],
            Some("src/app.rs : 12".to_string()),
        );
        session.record(EventKind::GroupEnd, &[], None);

        let decoded = decode(&encode(&session).unwrap());
        assert_eq!(
            decoded,
            json!({
                "version": "4.1.0",
                "columns": ["log", "backtrace", "type"],
                "rows": [
                    [["hello"], "src/app.rs : 12", "info"],
                    [[], null, "groupEnd"]
                ],
                "request_uri": "http://localhost/users?page=2"
            })
        );

        let keys: Vec<&str> = decoded.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["version", "columns", "rows", "request_uri"]);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let mut session = Session::new("/");
        let blob = "x".repeat(MAX_PAYLOAD_KIB * 1024);
        session.record(EventKind::Log, &[Value::from(blob)], None);

        match encode(&session) {
            Err(EncodeError::TooLarge { size, limit }) => {
                assert!(size > limit);
                assert_eq!(limit, 262_144);
            }
            other => panic!("expected TooLarge, got {:?}", other),
        }
    }

    #[test]
    fn payload_at_the_limit_is_accepted() {
        // envelope overhead is fixed, so search for the largest blob that fits
        let fits = |n: usize| {
            let mut session = Session::new("/");
            session.record(EventKind::Log, &[Value::from("x".repeat(n))], None);
            encode(&session).map(|h| h.len())
        };
        let overhead = fits(0).unwrap();
        let raw_budget = MAX_PAYLOAD_KIB * 1024 / 4 * 3;
        let mut n = raw_budget - overhead;
        while fits(n).is_ok() {
            n += 1;
        }
        assert!(fits(n - 1).unwrap() <= MAX_PAYLOAD_KIB * 1024);
        assert!(fits(n).is_err());
    }

    proptest! {
        #[test]
        fn encoding_is_deterministic(messages in proptest::collection::vec(".{0,40}", 0..20)) {
            let mut session = Session::new("/prop");
            for (i, message) in messages.iter().enumerate() {
                session.record(
                    EventKind::Log,
                    &[Value::from(message.as_str())],
                    Some(format!("src/prop.rs : {}", i % 3)),
                );
            }
            prop_assert_eq!(encode(&session).unwrap(), encode(&session).unwrap());
        }
    }
}
