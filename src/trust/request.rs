//! Inbound request abstraction.
//!
//! # Responsibilities
//! - Read, replace and remove request headers by name
//! - Expose the socket peer address of the connection
//!
//! # Design Decisions
//! - Header names are case-insensitive and `_` is read as `-`
//! - Repeated header fields are joined with ", "
//! - Values that are not valid UTF-8 read as absent

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{HeaderName, HeaderValue, Request};

/// The parts of a request the trust resolver reads and rewrites.
pub trait InboundRequest {
    /// Value of a header, if present.
    fn header(&self, name: &str) -> Option<String>;

    /// Replace all values of a header.
    fn set_header(&mut self, name: &str, value: &str);

    fn remove_header(&mut self, name: &str);

    /// Address of the directly connected peer.
    fn peer_address(&self) -> Option<String>;
}

/// Lowercase a header name and read `_` as `-`.
pub fn normalize_header_name(name: &str) -> String {
    name.trim().replace('_', "-").to_ascii_lowercase()
}

/// Parse a configured header name into an HTTP header name.
pub fn parse_header_name(name: &str) -> Option<HeaderName> {
    HeaderName::from_bytes(normalize_header_name(name).as_bytes()).ok()
}

impl<B> InboundRequest for Request<B> {
    fn header(&self, name: &str) -> Option<String> {
        let name = parse_header_name(name)?;
        let mut values = self.headers().get_all(&name).iter().peekable();
        values.peek()?;

        let mut joined = String::new();
        for value in values {
            let value = value.to_str().ok()?;
            if !joined.is_empty() {
                joined.push_str(", ");
            }
            joined.push_str(value);
        }
        Some(joined)
    }

    fn set_header(&mut self, name: &str, value: &str) {
        let (Some(name), Ok(value)) = (parse_header_name(name), HeaderValue::from_str(value)) else {
            tracing::debug!(header = %name, "Skipping header rewrite with invalid name or value");
            return;
        };
        self.headers_mut().insert(name, value);
    }

    fn remove_header(&mut self, name: &str) {
        if let Some(name) = parse_header_name(name) {
            self.headers_mut().remove(name);
        }
    }

    fn peer_address(&self) -> Option<String> {
        self.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request<()> {
        Request::builder()
            .header("X-Forwarded-For", "1.1.1.1")
            .header("X-Forwarded-For", "2.2.2.2")
            .header("X-My-Header", "abc")
            .body(())
            .unwrap()
    }

    #[test]
    fn test_normalize_header_name() {
        assert_eq!(normalize_header_name("X_MY_FORWARDED_FOR"), "x-my-forwarded-for");
        assert_eq!(normalize_header_name(" Forwarded "), "forwarded");
    }

    #[test]
    fn test_header_lookup_is_case_and_underscore_insensitive() {
        let req = request();
        assert_eq!(req.header("X_MY_HEADER").as_deref(), Some("abc"));
        assert_eq!(req.header("x-my-header").as_deref(), Some("abc"));
        assert_eq!(req.header("x-missing"), None);
        assert_eq!(req.header("not a header"), None);
    }

    #[test]
    fn test_repeated_fields_are_joined() {
        let req = request();
        assert_eq!(req.header("x-forwarded-for").as_deref(), Some("1.1.1.1, 2.2.2.2"));
    }

    #[test]
    fn test_set_and_remove() {
        let mut req = request();
        req.set_header("X_FORWARDED_FOR", "3.3.3.3");
        assert_eq!(req.header("x-forwarded-for").as_deref(), Some("3.3.3.3"));

        req.set_header("x-forwarded-host", "bad\nvalue");
        assert_eq!(req.header("x-forwarded-host"), None);

        req.remove_header("X-Forwarded-For");
        assert_eq!(req.header("x-forwarded-for"), None);
    }

    #[test]
    fn test_peer_address_from_connect_info() {
        let mut req = request();
        assert_eq!(req.peer_address(), None);

        let addr: SocketAddr = "192.168.10.10:4242".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(req.peer_address().as_deref(), Some("192.168.10.10"));
    }
}
