//! Strong types for price sources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an upstream price source.
///
/// Examples: "awattar", "smartenergy"
///
/// This is the value stored in the `source` column and is part of the
/// identity of every [`PriceRecord`](super::PriceRecord).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub String);

impl SourceId {
    pub const AWATTAR: &'static str = "awattar";
    pub const SMARTENERGY: &'static str = "smartenergy";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn awattar() -> Self {
        Self::new(Self::AWATTAR)
    }

    pub fn smartenergy() -> Self {
        Self::new(Self::SMARTENERGY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for SourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
