//! Server endpoint validation.
//!
//! An [`Endpoint`] is any absolute URL. Whether the transport can actually
//! reach it (scheme support, TLS) is decided when a connection is opened, so
//! an endpoint that parses here may still fail connection setup later.

use std::{fmt, str::FromStr};

use thiserror::Error;
use url::Url;

/// Errors produced while validating operator-supplied endpoints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// Input is not a URL at all.
    #[error("malformed URL {input:?}: {reason}")]
    Malformed {
        /// Text the operator submitted.
        input: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// URL parsed but has no host to connect to.
    #[error("URL {input:?} has no host")]
    MissingHost {
        /// Text the operator submitted.
        input: String,
    },
}

/// Validated absolute URL identifying the chat server.
///
/// Stored in normalized form, e.g. `WS://Chat.Example:80` becomes
/// `ws://chat.example/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Parse and validate operator input. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// - [`EndpointError::Malformed`] if the text is not an absolute URL
    /// - [`EndpointError::MissingHost`] if the URL cannot name a server
    pub fn parse(input: &str) -> Result<Self, EndpointError> {
        let trimmed = input.trim();
        let url = Url::parse(trimmed).map_err(|e| EndpointError::Malformed {
            input: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        if url.cannot_be_a_base() || url.host_str().is_none_or(str::is_empty) {
            return Err(EndpointError::MissingHost { input: trimmed.to_string() });
        }

        Ok(Self { url })
    }

    /// Normalized URL text.
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// URL scheme, lowercase (`ws`, `wss`, ...).
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Parsed URL.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn accepts_websocket_url() {
        let endpoint = Endpoint::parse("wss://chat.example/ws").unwrap();
        assert_eq!(endpoint.as_str(), "wss://chat.example/ws");
        assert_eq!(endpoint.scheme(), "wss");
    }

    #[test]
    fn normalizes_case_and_default_port() {
        let endpoint = Endpoint::parse("  WS://Chat.Example:80  ").unwrap();
        assert_eq!(endpoint.as_str(), "ws://chat.example/");
    }

    #[test]
    fn accepts_non_websocket_absolute_url() {
        // Scheme support is the transport's decision.
        let endpoint = Endpoint::parse("https://chat.example/ws").unwrap();
        assert_eq!(endpoint.scheme(), "https");
    }

    #[test]
    fn rejects_relative_and_garbage_input() {
        for input in ["", "   ", "chat.example/ws", "/ws", "not a url", "wss://"] {
            assert!(Endpoint::parse(input).is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn rejects_hostless_urls() {
        assert!(matches!(
            Endpoint::parse("mailto:ana@chat.example"),
            Err(EndpointError::MissingHost { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_parse_is_stable_under_normalization(
            host in "[a-z][a-z0-9]{0,10}(\\.[a-z][a-z0-9]{0,5}){0,2}",
            port in proptest::option::of(1u16..u16::MAX),
            path in "(/[a-z0-9]{1,6}){0,3}",
        ) {
            let port = port.map(|p| format!(":{p}")).unwrap_or_default();
            let input = format!("wss://{host}{port}{path}");
            let endpoint = Endpoint::parse(&input).unwrap();
            let reparsed = Endpoint::parse(endpoint.as_str()).unwrap();
            prop_assert_eq!(endpoint, reparsed);
        }
    }
}
