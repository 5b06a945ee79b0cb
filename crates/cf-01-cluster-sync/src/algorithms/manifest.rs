//! # Unit Descriptor Parsing
//!
//! Parses manifest-style descriptors (`Header: value` lines, continuation
//! lines start with a single space) and extracts the unit identity.

use indexmap::IndexMap;

use crate::domain::{UnitDescriptor, DEFAULT_VERSION};

/// Display name header.
pub const HEADER_NAME: &str = "Bundle-Name";
/// Symbolic name header.
pub const HEADER_SYMBOLIC_NAME: &str = "Bundle-SymbolicName";
/// Version header.
pub const HEADER_VERSION: &str = "Bundle-Version";

/// Parse descriptor text into an ordered header map.
///
/// Parsing stops at the first blank line (end of the main section).
/// Lines without a `:` are ignored.
pub fn parse_headers(text: &str) -> IndexMap<String, String> {
    let mut headers = IndexMap::new();
    let mut current: Option<(String, String)> = None;

    for line in text.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            break;
        }

        if let Some(continuation) = line.strip_prefix(' ') {
            if let Some((_, value)) = current.as_mut() {
                value.push_str(continuation);
            }
            continue;
        }

        if let Some((name, value)) = current.take() {
            headers.insert(name, value);
        }

        if let Some((name, value)) = line.split_once(':') {
            current = Some((name.trim().to_string(), value.trim_start().to_string()));
        }
    }

    if let Some((name, value)) = current {
        headers.insert(name, value);
    }

    headers
}

/// Extract the unit identity from parsed headers.
///
/// Directives after `;` in the symbolic name are dropped.
pub fn descriptor_from_headers(headers: &IndexMap<String, String>) -> UnitDescriptor {
    let non_empty = |key: &str| {
        headers
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let symbolic_name = non_empty(HEADER_SYMBOLIC_NAME).and_then(|v| {
        let name = v.split(';').next().unwrap_or_default().trim().to_string();
        (!name.is_empty()).then_some(name)
    });

    UnitDescriptor {
        name: non_empty(HEADER_NAME),
        symbolic_name,
        version: non_empty(HEADER_VERSION),
    }
}

/// Version to record for a descriptor.
pub fn effective_version(descriptor: &UnitDescriptor) -> String {
    descriptor
        .version
        .clone()
        .unwrap_or_else(|| DEFAULT_VERSION.to_string())
}
