//! License values attached to packages.
//!
//! Uses the `spdx` crate for expression validation, keeping the raw value
//! verbatim: ecosystem metadata frequently carries non-SPDX strings and the
//! original text must survive encoding.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single license value as declared by package metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct License(String);

impl License {
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the value parses as an SPDX license expression.
    ///
    /// Lax mode accepts common nonstandard spellings ("Apache2", "/" for OR).
    pub fn is_valid_spdx(&self) -> bool {
        if self.0.is_empty() || self.0.contains("NOASSERTION") || self.0.contains("NONE") {
            return false;
        }
        spdx::Expression::parse_mode(&self.0, spdx::ParseMode::LAX).is_ok()
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for License {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for License {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
