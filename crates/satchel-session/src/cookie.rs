//! Session token transport.
//!
//! The engine never talks to an HTTP stack directly. It reads the inbound
//! token and emits [`CookieDirective`]s through a [`TokenTransport`], which
//! the embedding server maps onto its own request/response types.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `SameSite` attribute of the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    /// Parse a `SameSite` value case-insensitively.
    ///
    /// Unknown values fall back to [`SameSite::Lax`].
    pub fn parse_lenient(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "strict" => Self::Strict,
            "none" => Self::None,
            _ => Self::Lax,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

impl FromStr for SameSite {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl From<String> for SameSite {
    fn from(value: String) -> Self {
        Self::parse_lenient(&value)
    }
}

impl From<SameSite> for &'static str {
    fn from(value: SameSite) -> Self {
        value.as_str()
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set-cookie-equivalent instruction for the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieDirective {
    pub name: String,

    /// Session identifier, empty for a revocation.
    pub value: String,

    pub path: String,

    /// Empty means host-only.
    pub domain: String,

    /// Lifetime in seconds; `-1` revokes.
    pub max_age: i64,

    pub expires: DateTime<Utc>,

    pub secure: bool,

    pub http_only: bool,

    pub same_site: SameSite,
}

impl CookieDirective {
    /// Whether this directive tells the client to drop the cookie.
    pub fn is_revocation(&self) -> bool {
        self.max_age < 0
    }

    /// Render as an RFC 6265 `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if !self.path.is_empty() {
            out.push_str("; Path=");
            out.push_str(&self.path);
        }
        if !self.domain.is_empty() {
            out.push_str("; Domain=");
            out.push_str(&self.domain);
        }
        // Max-Age=0 is the portable spelling of "expire now"
        out.push_str(&format!("; Max-Age={}", self.max_age.max(0)));
        out.push_str("; Expires=");
        out.push_str(&self.expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out.push_str("; SameSite=");
        out.push_str(self.same_site.as_str());
        out
    }
}

impl fmt::Display for CookieDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

/// The request/response side of a session cycle.
pub trait TokenTransport {
    /// Token value the client sent under `name`, if any.
    fn token(&self, name: &str) -> Option<String>;

    /// Queue a directive for the response.
    fn set_token(&mut self, directive: CookieDirective);

    /// Drop `name` from the inbound request and from pending directives.
    fn strip_token(&mut self, name: &str);
}

/// In-memory [`TokenTransport`] for tests, tools and simple embeddings.
#[derive(Debug, Clone, Default)]
pub struct CookieExchange {
    request: HashMap<String, String>,
    response: Vec<CookieDirective>,
}

impl CookieExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a cycle with the client presenting `value` under `name`.
    pub fn with_request_token(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.insert(name.into(), value.into());
        self
    }

    /// Directives queued for the response, in emission order.
    pub fn response(&self) -> &[CookieDirective] {
        &self.response
    }

    /// Most recent directive queued for `name`.
    pub fn response_token(&self, name: &str) -> Option<&CookieDirective> {
        self.response.iter().rev().find(|d| d.name == name)
    }
}

impl TokenTransport for CookieExchange {
    fn token(&self, name: &str) -> Option<String> {
        self.request.get(name).cloned()
    }

    fn set_token(&mut self, directive: CookieDirective) {
        // A later directive for the same cookie replaces the earlier one
        self.response.retain(|d| d.name != directive.name);
        self.response.push(directive);
    }

    fn strip_token(&mut self, name: &str) {
        self.request.remove(name);
        self.response.retain(|d| d.name != name);
    }
}
