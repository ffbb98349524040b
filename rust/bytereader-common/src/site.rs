//! `ValueSite`: attribution of a failure to a specific host value.

use std::fmt;

/// Identifies the value a read attempt was made on.
///
/// A site carries the host's type name for the value, the slot position the
/// caller resolved from (when the value came from an addressable slot), and the
/// delegation depth at which the value was encountered. Depth `0` is the value
/// the caller passed in; every delegation step increments it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSite {
    pub type_name: String,
    pub position: Option<i64>,
    pub depth: usize,
}

impl ValueSite {
    /// Creates a site for a value of the given type, with no known position.
    pub fn new(type_name: impl Into<String>) -> ValueSite {
        ValueSite {
            type_name: type_name.into(),
            position: None,
            depth: 0,
        }
    }

    /// Sets the slot position.
    pub fn at(mut self, position: Option<i64>) -> ValueSite {
        self.position = position;
        self
    }

    /// Sets the delegation depth.
    pub fn with_depth(mut self, depth: usize) -> ValueSite {
        self.depth = depth;
        self
    }

    /// Returns `true` if the value was produced by a delegation step rather than
    /// passed in by the caller.
    pub fn is_delegated(&self) -> bool {
        self.depth > 0
    }
}

impl fmt::Display for ValueSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name)?;
        if let Some(position) = self.position {
            write!(f, " at index {position}")?;
        }
        if self.depth > 0 {
            write!(f, " (delegation depth {})", self.depth)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_display() {
        assert_eq!(ValueSite::new("userdata").to_string(), "userdata");
        assert_eq!(
            ValueSite::new("userdata").at(Some(3)).to_string(),
            "userdata at index 3"
        );
        assert_eq!(
            ValueSite::new("table").at(Some(-1)).with_depth(2).to_string(),
            "table at index -1 (delegation depth 2)"
        );
    }

    #[test]
    fn test_site_is_delegated() {
        assert!(!ValueSite::new("string").is_delegated());
        assert!(ValueSite::new("string").with_depth(1).is_delegated());
    }
}
