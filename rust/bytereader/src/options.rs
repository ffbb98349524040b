//! Caller-supplied configuration of a single resolution.

/// Default cap on the number of delegation steps followed by one resolution.
pub const DEFAULT_MAX_DELEGATION_DEPTH: usize = 32;

/// Options controlling how a value is resolved and validated.
///
/// Options are built with chained setters, starting from [`ResolutionOptions::new`]:
///
/// ```
/// use bytereader::ResolutionOptions;
///
/// let options = ResolutionOptions::new()
///     .required_sizes([16, 48])
///     .want_strides(false)
///     .replace_original(false);
/// assert_eq!(options.sizes(), &[16, 48]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOptions {
    required_sizes: Vec<usize>,
    want_strides: bool,
    replace_original: bool,
    max_delegation_depth: usize,
}

impl ResolutionOptions {
    /// Creates the default options: no size constraint, no stride requirement,
    /// slot replacement enabled, and a delegation cap of
    /// [`DEFAULT_MAX_DELEGATION_DEPTH`].
    pub fn new() -> ResolutionOptions {
        ResolutionOptions {
            required_sizes: Vec::new(),
            want_strides: false,
            replace_original: true,
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
        }
    }

    /// Creates options for read-only callers: identical to [`new`](Self::new)
    /// except that the caller's slot is never overwritten.
    pub fn strict() -> ResolutionOptions {
        ResolutionOptions::new().replace_original(false)
    }

    /// Sets the list of acceptable total sizes, replacing any previous list.
    ///
    /// The resolved length must equal one of them exactly. Duplicates are
    /// dropped; the first occurrence keeps its position. An empty list removes
    /// the constraint.
    pub fn required_sizes(mut self, sizes: impl IntoIterator<Item = usize>) -> Self {
        self.required_sizes.clear();
        for size in sizes {
            self = self.require_size(size);
        }
        self
    }

    /// Adds a single acceptable total size.
    pub fn require_size(mut self, size: usize) -> Self {
        if !self.required_sizes.contains(&size) {
            self.required_sizes.push(size);
        }
        self
    }

    /// Requires the resolved buffer to carry stride metadata.
    pub fn want_strides(mut self, want_strides: bool) -> Self {
        self.want_strides = want_strides;
        self
    }

    /// Controls whether a slot resolved through delegation (or through a provider
    /// that reported a replacement) is overwritten with the value the bytes
    /// belong to.
    pub fn replace_original(mut self, replace_original: bool) -> Self {
        self.replace_original = replace_original;
        self
    }

    /// Sets the maximum number of delegation steps followed before giving up.
    pub fn max_delegation_depth(mut self, depth: usize) -> Self {
        self.max_delegation_depth = depth;
        self
    }

    /// Returns the acceptable total sizes, in insertion order.
    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.required_sizes
    }

    #[inline]
    pub fn has_size_constraint(&self) -> bool {
        !self.required_sizes.is_empty()
    }

    #[inline]
    pub fn wants_strides(&self) -> bool {
        self.want_strides
    }

    #[inline]
    pub fn replaces_original(&self) -> bool {
        self.replace_original
    }

    #[inline]
    pub fn delegation_limit(&self) -> usize {
        self.max_delegation_depth
    }
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        ResolutionOptions::new()
    }
}
