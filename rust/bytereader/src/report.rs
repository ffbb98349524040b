//! Failure attribution and the boundary form of a read.
//!
//! Inside Rust, resolution returns a `Result`. At the boundary to the host,
//! failures must not unwind: they are surfaced as a [`ReadReport`] carrying a
//! null buffer, a descriptive message naming the offending value, and the
//! sticky "forbidden" flag.

use bytereader_common::{ValueSite, error::Error};
use bytereader_common_traits::HostValue;

use crate::buffer::{Resolution, ResolvedBuffer};

/// Describes `value` for diagnostics: its host type name, the caller's slot
/// position, and the delegation depth it was reached at.
pub fn site_of<V: HostValue>(value: &V, position: Option<i64>, depth: usize) -> ValueSite {
    ValueSite::new(value.type_name())
        .at(position)
        .with_depth(depth)
}

/// Outcome of a read at the host boundary: either a resolution, or an error
/// with its message.
#[derive(Debug)]
pub struct ReadReport<V> {
    outcome: std::result::Result<Resolution<V>, Error>,
}

impl<V> ReadReport<V> {
    /// Wraps the result of a resolution, logging failures.
    pub fn new(result: std::result::Result<Resolution<V>, Error>) -> ReadReport<V> {
        if let Err(e) = &result {
            if e.is_forbidden() {
                log::trace!("{e}");
            } else {
                log::debug!("byte read failed: {e}");
            }
        }
        ReadReport { outcome: result }
    }

    /// Returns `true` if bytes were resolved.
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Returns the resolved bytes, or `None` (the null buffer) on failure.
    pub fn bytes(&self) -> Option<ResolvedBuffer<'_>> {
        self.outcome.as_ref().ok().map(Resolution::buffer)
    }

    /// Returns the resolution, if any.
    pub fn resolution(&self) -> Option<&Resolution<V>> {
        self.outcome.as_ref().ok()
    }

    /// Returns the error, if any.
    pub fn error(&self) -> Option<&Error> {
        self.outcome.as_ref().err()
    }

    /// Returns the diagnostic message on failure.
    pub fn message(&self) -> Option<String> {
        self.error().map(Error::to_string)
    }

    /// Returns `true` if the value explicitly opted out of byte access.
    pub fn is_forbidden(&self) -> bool {
        self.error().is_some_and(Error::is_forbidden)
    }

    /// Converts the report back into a `Result`.
    pub fn into_result(self) -> std::result::Result<Resolution<V>, Error> {
        self.outcome
    }
}

impl<V> From<std::result::Result<Resolution<V>, Error>> for ReadReport<V> {
    fn from(result: std::result::Result<Resolution<V>, Error>) -> Self {
        ReadReport::new(result)
    }
}
