//! Scoped variable labels.
//!
//! A [`Label`] is the `(scope, name)` pair that identifies a variable
//! occurrence. On the wire it is flattened to `<scope><DIVIDER><name>`, e.g.
//! `0ᐧcounter`. The divider is reserved: it never appears in identifier text,
//! which is also what keeps placeholder tokens disjoint from real names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::id::ScopeId;

/// Sentinel joining a scope id and a name in a flattened label.
pub const DIVIDER: char = 'ᐧ';

/// A variable name qualified by the lexical scope it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label {
    pub scope: ScopeId,
    pub name: String,
}

impl Label {
    pub fn new(scope: ScopeId, name: impl Into<String>) -> Self {
        Label {
            scope,
            name: name.into(),
        }
    }

    /// Parses a flattened label, splitting at the first divider.
    ///
    /// Everything after the first divider is the name, so placeholder names
    /// (which themselves start with the divider) survive a round trip.
    pub fn parse(text: &str) -> Result<Self, IngestError> {
        let (scope, name) = text
            .split_once(DIVIDER)
            .ok_or_else(|| IngestError::MalformedLabel {
                label: text.to_string(),
                reason: "missing scope divider",
            })?;
        let scope = scope
            .parse::<u32>()
            .map_err(|_| IngestError::MalformedLabel {
                label: text.to_string(),
                reason: "scope id is not an unsigned integer",
            })?;
        if name.is_empty() {
            return Err(IngestError::MalformedLabel {
                label: text.to_string(),
                reason: "empty name",
            });
        }
        Ok(Label::new(ScopeId(scope), name))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.scope, DIVIDER, self.name)
    }
}

impl FromStr for Label {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::parse(s)
    }
}

impl TryFrom<String> for Label {
    type Error = IngestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Label::parse(&value)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.to_string()
    }
}

/// Rejects identifier or relation text that contains the reserved divider.
pub(crate) fn check_identifier(text: &str) -> Result<(), IngestError> {
    if text.contains(DIVIDER) {
        return Err(IngestError::ReservedDivider {
            text: text.to_string(),
        });
    }
    Ok(())
}
