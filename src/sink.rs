/// Error returned when a response refuses a header value.
#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    #[error("invalid header name: {0}")]
    InvalidName(String),

    #[error("invalid header value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Mutable response that can carry the encoded console payload.
///
/// Implementations wrap the host framework's response object. The logger
/// calls `set_header` synchronously after every logging call, replacing
/// any value it published earlier.
pub trait HeaderSink {
    /// Set header `name` to `value`, replacing any previous value.
    ///
    /// **Returns**
    /// - `Ok(())` if the response accepted the header.
    /// - `Err(..)` if the name or value is not acceptable to the
    ///   response. The logger keeps the previously published value.
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError>;
}

impl<S: HeaderSink + ?Sized> HeaderSink for &mut S {
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        (**self).set_header(name, value)
    }
}

impl<S: HeaderSink + ?Sized> HeaderSink for Box<S> {
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        (**self).set_header(name, value)
    }
}

#[cfg(feature = "http")]
mod http_sinks {
    use super::{HeaderError, HeaderSink};
    use http::header::{HeaderName, HeaderValue};
    use http::{HeaderMap, Response};

    impl HeaderSink for HeaderMap {
        fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| HeaderError::InvalidName(name.to_string()))?;
            let value = HeaderValue::from_str(value).map_err(|e| HeaderError::InvalidValue {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
            self.insert(header, value);
            Ok(())
        }
    }

    impl<B> HeaderSink for Response<B> {
        fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
            self.headers_mut().set_header(name, value)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn header_map_replaces_previous_value() {
            let mut headers = HeaderMap::new();
            headers.set_header("X-ChromeLogger-Data", "first").unwrap();
            headers.set_header("X-ChromeLogger-Data", "second").unwrap();

            assert_eq!(headers.get_all("x-chromelogger-data").iter().count(), 1);
            assert_eq!(headers["x-chromelogger-data"], "second");
        }

        #[test]
        fn header_map_rejects_control_characters() {
            let mut headers = HeaderMap::new();
            let err = headers.set_header("X-Test", "bad\nvalue").unwrap_err();
            assert!(matches!(err, HeaderError::InvalidValue { .. }));
            assert!(headers.set_header("bad name", "v").is_err());
        }

        #[test]
        fn response_writes_into_its_headers() {
            let mut response = Response::new(());
            response.set_header("X-Test", "v").unwrap();
            assert_eq!(response.headers()["x-test"], "v");
        }
    }
}
