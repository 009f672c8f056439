//! Route dictionary: the shared table that lets a route name travel as a
//! two-byte code.
//!
//! The server hands out the table during the handshake as a JSON object
//! (`{"room.join": 1, "room.leave": 2}`). The client keeps both directions:
//! `route → code` for encoding and `code → route` for decoding. The codec
//! only ever reads it.

use std::collections::HashMap;

#[cfg(feature = "json")]
use serde_json::Value;

use crate::ProtocolError;

/// Bidirectional route ↔ code table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteDictionary {
    route_to_code: HashMap<String, u16>,
    code_to_route: HashMap<u16, String>,
}

impl RouteDictionary {
    /// An empty dictionary. Every route is sent inline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mapping, replacing any previous entry for either side.
    pub fn insert(&mut self, route: impl Into<String>, code: u16) {
        let route = route.into();
        if let Some(old_code) = self.route_to_code.insert(route.clone(), code) {
            self.code_to_route.remove(&old_code);
        }
        if let Some(old_route) = self.code_to_route.insert(code, route) {
            if self.route_to_code.get(&old_route) == Some(&code) {
                self.route_to_code.remove(&old_route);
            }
        }
    }

    /// The code to send in place of `route`, if any.
    ///
    /// Code 0 is never handed out for compression: a route that maps to 0
    /// goes inline.
    pub fn code_for(&self, route: &str) -> Option<u16> {
        self.route_to_code.get(route).copied().filter(|&code| code > 0)
    }

    /// The route a received code stands for.
    pub fn route_for(&self, code: u16) -> Option<&str> {
        self.code_to_route.get(&code).map(String::as_str)
    }

    /// Number of routes in the table.
    pub fn len(&self) -> usize {
        self.route_to_code.len()
    }

    /// `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.route_to_code.is_empty()
    }

    /// Builds a dictionary from a `{"route": code}` JSON object.
    ///
    /// Entries whose code is not an integer in `1..=65535` are skipped with
    /// a warning; the route then simply travels inline.
    ///
    /// # Errors
    /// `InvalidDictionary` if `value` is not an object.
    #[cfg(feature = "json")]
    pub fn from_json(value: &Value) -> Result<Self, ProtocolError> {
        let entries = value.as_object().ok_or_else(|| {
            ProtocolError::InvalidDictionary(format!("expected an object, got {value}"))
        })?;

        let mut dict = Self::new();
        for (route, code) in entries {
            match code.as_u64().and_then(|c| u16::try_from(c).ok()) {
                Some(code) if code > 0 => dict.insert(route.as_str(), code),
                _ => tracing::warn!(%route, %code, "skipping unusable route dictionary entry"),
            }
        }
        tracing::debug!(routes = dict.len(), "route dictionary loaded");
        Ok(dict)
    }

    /// Builds a dictionary from a handshake response, reading `sys.dict`.
    ///
    /// A handshake without a dictionary yields an empty one.
    #[cfg(feature = "json")]
    pub fn from_handshake(handshake: &Value) -> Result<Self, ProtocolError> {
        match handshake.get("sys").and_then(|sys| sys.get("dict")) {
            Some(dict) => Self::from_json(dict),
            None => Ok(Self::new()),
        }
    }
}

impl<S: Into<String>> FromIterator<(S, u16)> for RouteDictionary {
    fn from_iter<I: IntoIterator<Item = (S, u16)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (route, code) in iter {
            dict.insert(route, code);
        }
        dict
    }
}
