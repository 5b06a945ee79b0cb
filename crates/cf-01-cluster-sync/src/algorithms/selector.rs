//! # Selector Engine
//!
//! Turns an operator-supplied selector into composite keys of a reconciled
//! candidate map. The first matching form wins:
//!
//! | Form | Example | Semantics |
//! |------|---------|-----------|
//! | id | `7` | first candidate whose id equals the number |
//! | range | `1-3` | candidates at positions 1 to 3 inclusive (start < end) |
//! | name/version | `foo/1.0` | exact version, name regex on display or symbolic name |
//! | name | `foo.*` | regex on display name, then on the composite key |
//!
//! Ids and positions are different things: the id form looks at the record's
//! id field, the range form counts positions in candidate order.

use indexmap::IndexMap;

use super::patterns::PatternCache;
use crate::domain::{split_key, ExtendedState, FeatureState, SyncError, UnitState};

/// Record that can be addressed by a selector.
pub trait Selectable {
    /// Numeric id, if the record type has one.
    fn numeric_id(&self) -> Option<u64>;
    /// Display name, if known.
    fn display_name(&self) -> Option<&str>;
    /// Symbolic (machine) name.
    fn symbolic_name(&self) -> &str;
    /// Version string.
    fn version(&self) -> &str;
}

impl Selectable for UnitState {
    fn numeric_id(&self) -> Option<u64> {
        Some(self.id)
    }

    fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn symbolic_name(&self) -> &str {
        &self.symbolic_name
    }

    fn version(&self) -> &str {
        &self.version
    }
}

impl Selectable for FeatureState {
    fn numeric_id(&self) -> Option<u64> {
        None
    }

    fn display_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn symbolic_name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }
}

/// Parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector<'a> {
    /// `^\d+$`
    Id(u64),
    /// `^\d+-\d+$`
    Range(u64, u64),
    /// `name/version`
    NameVersion(&'a str, &'a str),
    /// Anything else.
    Name(&'a str),
}

impl<'a> Selector<'a> {
    /// Classify a selector string.
    pub fn parse(pattern: &'a str) -> Self {
        if let Some(id) = parse_number(pattern) {
            return Self::Id(id);
        }

        if let Some((start, end)) = pattern.split_once('-') {
            if let (Some(start), Some(end)) = (parse_number(start), parse_number(end)) {
                return Self::Range(start, end);
            }
        }

        match split_key(pattern) {
            (name, Some(version)) => Self::NameVersion(name, version),
            (name, None) => Self::Name(name),
        }
    }
}

/// All-digit string to number. Overflowing values never match anything.
fn parse_number(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.parse().unwrap_or(u64::MAX))
}

/// Resolve `pattern` against `candidates`, returning matching keys in
/// candidate order. An empty result is not an error.
pub fn resolve<T: Selectable>(
    pattern: &str,
    candidates: &IndexMap<String, ExtendedState<T>>,
    patterns: &PatternCache,
) -> Result<Vec<String>, SyncError> {
    let keys = match Selector::parse(pattern) {
        Selector::Id(id) => candidates
            .iter()
            .find(|(_, state)| state.base.numeric_id() == Some(id))
            .map(|(key, _)| vec![key.clone()])
            .unwrap_or_default(),

        Selector::Range(start, end) => {
            if start >= end {
                Vec::new()
            } else {
                candidates
                    .keys()
                    .enumerate()
                    .filter(|(position, _)| {
                        let position = *position as u64;
                        position >= start && position <= end
                    })
                    .map(|(_, key)| key.clone())
                    .collect()
            }
        }

        Selector::NameVersion(name, version) => {
            let regex = patterns.compile(name)?;
            candidates
                .iter()
                .filter(|(_, state)| state.base.version() == version)
                .filter(|(_, state)| {
                    state
                        .base
                        .display_name()
                        .is_some_and(|display| regex.is_match(display))
                        || regex.is_match(state.base.symbolic_name())
                })
                .map(|(key, _)| key.clone())
                .collect()
        }

        Selector::Name(name) => {
            let regex = patterns.compile(name)?;
            candidates
                .iter()
                .filter(|(key, state)| {
                    state
                        .base
                        .display_name()
                        .is_some_and(|display| regex.is_match(display))
                        || regex.is_match(key)
                })
                .map(|(key, _)| key.clone())
                .collect()
        }
    };

    fleet_telemetry::record_selector_matches(keys.len());
    Ok(keys)
}
