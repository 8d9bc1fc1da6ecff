use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// Where an offending argument sits in the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgLocation {
    /// Not yet attributed to a call site (nested values report this until the
    /// key builder places them).
    Unknown,
    /// Zero-based positional argument.
    Position(usize),
    /// Keyword argument passed through [`Kw`](crate::Kw).
    Keyword(&'static str),
}

impl fmt::Display for ArgLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgLocation::Unknown => f.write_str("argument"),
            ArgLocation::Position(index) => write!(f, "positional argument #{}", index),
            ArgLocation::Keyword(name) => write!(f, "keyword argument `{}`", name),
        }
    }
}

/// Raised when call arguments cannot form a stable cache key.
///
/// The error is produced before the wrapped function is invoked and before any
/// suspension, and it is never cached: calling again with the same arguments
/// fails again.
///
/// # Examples
///
/// ```
/// use asyncache_core::{CacheKey, UnhashableArgumentError};
///
/// let err: UnhashableArgumentError = CacheKey::from_args(&(1, f64::NAN), false).unwrap_err();
/// assert_eq!(err.type_name(), "f64");
/// assert!(err.to_string().contains("positional argument #1"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unhashable {location} of type `{type_name}`: {reason}")]
pub struct UnhashableArgumentError {
    location: ArgLocation,
    type_name: &'static str,
    reason: Cow<'static, str>,
}

impl UnhashableArgumentError {
    pub fn new(type_name: &'static str, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            location: ArgLocation::Unknown,
            type_name,
            reason: reason.into(),
        }
    }

    /// Attributes the error to a call-site location.
    ///
    /// A location that was already set is kept, so the innermost placement wins.
    pub fn at(mut self, location: ArgLocation) -> Self {
        if self.location == ArgLocation::Unknown {
            self.location = location;
        }
        self
    }

    pub fn location(&self) -> ArgLocation {
        self.location
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}
