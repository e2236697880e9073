//! Lifecycle operation names

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The lifecycle operations a handler bundle may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Check,
    Diff,
    Create,
    Read,
    Update,
    Delete,
}

/// Error parsing an operation from string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation: {0}")]
pub struct ParseOperationError(String);

impl Operation {
    pub const ALL: [Operation; 6] = [
        Self::Check,
        Self::Diff,
        Self::Create,
        Self::Read,
        Self::Update,
        Self::Delete,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Diff => "diff",
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ParseOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ParseOperationError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        let err = "destroy".parse::<Operation>().unwrap_err();
        assert_eq!(err.to_string(), "unknown operation: destroy");
    }
}
