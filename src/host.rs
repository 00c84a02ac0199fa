use crate::sink::HeaderSink;

/// What the surrounding framework provides for the current request.
pub trait Host {
    /// Whether the application runs in a development-like context.
    fn is_development(&self) -> bool;

    /// URI of the request being handled, or `None` outside a request.
    fn request_uri(&self) -> Option<String>;

    /// Response of the request being handled, or `None` when there is no
    /// response to write to.
    fn response(&mut self) -> Option<&mut dyn HeaderSink>;
}

/// A [`Host`] assembled from plain parts.
///
/// Frameworks that can hand over the request URI and a header sink up
/// front use this instead of implementing [`Host`] themselves.
#[derive(Debug, Clone, Default)]
pub struct RequestHost<S> {
    development: bool,
    request_uri: Option<String>,
    response: Option<S>,
}

impl<S: HeaderSink> RequestHost<S> {
    pub fn new(development: bool, request_uri: impl Into<String>, response: S) -> Self {
        RequestHost {
            development,
            request_uri: Some(request_uri.into()),
            response: Some(response),
        }
    }

    /// A host with no active request; the logger stays disabled.
    pub fn detached(development: bool) -> Self {
        RequestHost {
            development,
            request_uri: None,
            response: None,
        }
    }

    pub fn sink(&self) -> Option<&S> {
        self.response.as_ref()
    }

    pub fn into_sink(self) -> Option<S> {
        self.response
    }
}

impl<S: HeaderSink> Host for RequestHost<S> {
    fn is_development(&self) -> bool {
        self.development
    }

    fn request_uri(&self) -> Option<String> {
        self.request_uri.clone()
    }

    fn response(&mut self) -> Option<&mut dyn HeaderSink> {
        self.response.as_mut().map(|s| s as &mut dyn HeaderSink)
    }
}

#[cfg(feature = "http")]
impl RequestHost<http::HeaderMap> {
    /// Host for an `http::Request`, collecting headers into a fresh
    /// `HeaderMap` that the handler merges into its response.
    pub fn from_request<B>(request: &http::Request<B>, development: bool) -> Self {
        RequestHost::new(development, request.uri().to_string(), http::HeaderMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_sink::MemorySink;

    #[test]
    fn detached_host_has_no_request() {
        let mut host = RequestHost::<MemorySink>::detached(true);
        assert!(host.is_development());
        assert_eq!(host.request_uri(), None);
        assert!(host.response().is_none());
    }

    #[cfg(feature = "http")]
    #[test]
    fn request_host_uses_request_uri() {
        let request = http::Request::get("http://localhost:8080/items?id=3")
            .body(())
            .unwrap();
        let mut host = RequestHost::from_request(&request, true);

        assert_eq!(
            host.request_uri().as_deref(),
            Some("http://localhost:8080/items?id=3")
        );
        host.response().unwrap().set_header("X-Test", "1").unwrap();
        assert_eq!(host.into_sink().unwrap()["x-test"], "1");
    }
}
