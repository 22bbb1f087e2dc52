//! Route compression dictionary.
//!
//! The server's handshake may supply a mapping from route strings to small
//! numeric codes; messages then carry the 2-byte code instead of the string.
//! The dictionary is rebuilt wholesale on every handshake that supplies one.

use std::collections::HashMap;

/// Bidirectional route string <-> code mapping.
///
/// `compress`/`decompress` return `Option`: an unknown code is not an error
/// at this layer - the session treats it as "route lost, drop payload",
/// trusting the server to only compress routes it announced.
#[derive(Debug, Default)]
pub struct RouteDictionary {
    /// Route string to code.
    dict: HashMap<String, u16>,
    /// Code back to route string, exact inverse of `dict`.
    abbrs: HashMap<u16, String>,
}

impl RouteDictionary {
    /// Create an empty dictionary (no compression until a handshake fills it).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole mapping from handshake data.
    ///
    /// Both directions are swapped in together; a handshake without a
    /// dictionary should simply not call this, leaving the previous mapping
    /// in place.
    pub fn rebuild(&mut self, mapping: &HashMap<String, u16>) {
        let mut dict = HashMap::with_capacity(mapping.len());
        let mut abbrs = HashMap::with_capacity(mapping.len());

        for (route, &code) in mapping {
            dict.insert(route.clone(), code);
            abbrs.insert(code, route.clone());
        }

        self.dict = dict;
        self.abbrs = abbrs;
    }

    /// Look up the code for a route string.
    pub fn compress(&self, route: &str) -> Option<u16> {
        self.dict.get(route).copied()
    }

    /// Look up the route string for a code.
    pub fn decompress(&self, code: u16) -> Option<&str> {
        self.abbrs.get(&code).map(|s| s.as_str())
    }

    /// Number of mapped routes.
    pub fn len(&self) -> usize {
        self.dict.len()
    }

    /// Whether no routes are mapped.
    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }
}
