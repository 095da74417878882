use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::csrf::errors::CsrfError;

/// How a token behaves after a successful validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsrfMode {
    /// Single use: the consumed pair is replaced by a fresh one.
    #[default]
    Rotate,
    /// Reusable until the session ends or a validation fails.
    Persist,
}

impl fmt::Display for CsrfMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rotate => f.write_str("rotate"),
            Self::Persist => f.write_str("persist"),
        }
    }
}

impl FromStr for CsrfMode {
    type Err = CsrfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rotate" | "rotating" => Ok(Self::Rotate),
            "persist" | "persistent" | "persisting" => Ok(Self::Persist),
            other => Err(CsrfError::InvalidMode(other.to_string())),
        }
    }
}

/// A name/value pair to embed in a form or send as request headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfToken {
    pub name: String,
    pub value: String,
}
