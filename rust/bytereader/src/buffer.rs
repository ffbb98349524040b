//! Resolved byte views and the candidate buffers providers fill in.
//!
//! Nothing in this module owns or copies bytes. A [`Resolution`] keeps the
//! *anchor* value alive (the host value the bytes belong to) and records where
//! the bytes are; a [`ResolvedBuffer`] is a borrowed view of those bytes whose
//! lifetime is tied to the `Resolution` it came from.

use std::marker::PhantomData;

use bytereader_common_traits::MemoryRegion;
use tinyvec::TinyVec;

/// Per-dimension element strides, in bytes.
pub type Strides = TinyVec<[isize; 4]>;

/// Candidate buffer produced by an inline provider or a registered provider,
/// before validation.
#[derive(Debug)]
pub struct ProviderOutput<V> {
    region: Option<MemoryRegion>,
    strides: Option<Strides>,
    component_count: usize,
    replacement: Option<V>,
}

impl<V> ProviderOutput<V> {
    /// Creates an empty output: no bytes, no strides, no replacement.
    pub fn new() -> ProviderOutput<V> {
        ProviderOutput {
            region: None,
            strides: None,
            component_count: 0,
            replacement: None,
        }
    }

    pub(crate) fn with_region(region: MemoryRegion) -> ProviderOutput<V> {
        let mut output = ProviderOutput::new();
        output.set_region(region);
        output
    }

    /// Points the output at `bytes`.
    ///
    /// The slice must satisfy the lifetime contract of
    /// [`BytesProvider`](crate::BytesProvider): it has to outlive the value being
    /// resolved (or the replacement value, when one is reported).
    pub fn set_bytes(&mut self, bytes: &[u8]) {
        self.region = Some(MemoryRegion::from_slice(bytes));
    }

    /// Points the output at a raw region.
    pub fn set_region(&mut self, region: MemoryRegion) {
        self.region = Some(region);
    }

    /// Sets the stride metadata.
    pub fn set_strides(&mut self, strides: impl IntoIterator<Item = isize>) {
        self.strides = Some(strides.into_iter().collect());
    }

    /// Sets the logical element width per stride unit.
    pub fn set_component_count(&mut self, component_count: usize) {
        self.component_count = component_count;
    }

    /// Declares that the bytes belong to `value` rather than to the value being
    /// resolved. The resolution then anchors on `value`, and a slot resolved with
    /// replacement enabled is overwritten with it.
    pub fn replace_value(&mut self, value: V) {
        self.replacement = Some(value);
    }

    /// Returns the region set so far, if any.
    pub fn region(&self) -> Option<MemoryRegion> {
        self.region
    }

    /// Returns the number of bytes set so far (zero if none).
    pub fn len(&self) -> usize {
        self.region.map_or(0, |r| r.len)
    }

    /// Returns `true` if no bytes were set or the region is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn strides(&self) -> Option<&[isize]> {
        self.strides.as_deref()
    }

    pub fn component_count(&self) -> usize {
        self.component_count
    }

    pub fn replacement(&self) -> Option<&V> {
        self.replacement.as_ref()
    }

    pub(crate) fn into_parts(self) -> (Option<MemoryRegion>, Option<Strides>, usize, Option<V>) {
        (
            self.region,
            self.strides,
            self.component_count,
            self.replacement,
        )
    }
}

impl<V> Default for ProviderOutput<V> {
    fn default() -> Self {
        ProviderOutput::new()
    }
}

/// The successful outcome of resolving a host value.
///
/// A `Resolution` holds a handle to its *anchor*, the host value that owns the
/// resolved bytes. Holding the handle keeps the bytes alive, so the buffer
/// returned by [`buffer`](Self::buffer) is valid for as long as the
/// `Resolution` is borrowed.
pub struct Resolution<V> {
    anchor: V,
    region: MemoryRegion,
    strides: Option<Strides>,
    component_count: usize,
    depth: usize,
    replaced: bool,
}

impl<V> Resolution<V> {
    pub(crate) fn new(
        anchor: V,
        region: MemoryRegion,
        strides: Option<Strides>,
        component_count: usize,
        depth: usize,
        replaced: bool,
    ) -> Resolution<V> {
        Resolution {
            anchor,
            region,
            strides,
            component_count,
            depth,
            replaced,
        }
    }

    /// Returns a borrowed view of the resolved bytes.
    pub fn buffer(&self) -> ResolvedBuffer<'_> {
        ResolvedBuffer {
            data: self.region.ptr,
            length: self.region.len,
            strides: self.strides.as_deref(),
            component_count: self.component_count,
            _source: PhantomData,
        }
    }

    /// Returns the resolved bytes.
    pub fn as_slice(&self) -> &[u8] {
        self.buffer().as_slice()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.region.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.region.len == 0
    }

    /// Returns the value that owns the resolved bytes.
    pub fn anchor(&self) -> &V {
        &self.anchor
    }

    /// Consumes the resolution, returning the value that owns the bytes.
    pub fn into_anchor(self) -> V {
        self.anchor
    }

    /// Returns the number of delegation steps followed to reach the anchor.
    pub fn delegation_depth(&self) -> usize {
        self.depth
    }

    /// Returns `true` if the anchor is not the value resolution started from,
    /// either because delegation was followed or because a provider reported a
    /// replacement value.
    pub fn is_replacement(&self) -> bool {
        self.replaced
    }
}

impl<V> std::fmt::Debug for Resolution<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("region", &self.region)
            .field("strides", &self.strides)
            .field("component_count", &self.component_count)
            .field("depth", &self.depth)
            .field("replaced", &self.replaced)
            .finish_non_exhaustive()
    }
}

/// A non-owning view of resolved bytes.
///
/// The view borrows from the [`Resolution`] that produced it; it cannot outlive
/// the resolution, and therefore cannot outlive the anchor value that owns the
/// bytes.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedBuffer<'a> {
    data: *const u8,
    length: usize,
    strides: Option<&'a [isize]>,
    component_count: usize,
    _source: PhantomData<&'a [u8]>,
}

impl<'a> ResolvedBuffer<'a> {
    /// Returns the bytes as a slice.
    pub fn as_slice(&self) -> &'a [u8] {
        let region = MemoryRegion {
            ptr: self.data,
            len: self.length,
        };
        // The anchor borrowed for 'a keeps the region alive (HostValue and
        // BytesProvider contracts); null regions are always empty.
        unsafe { region.as_slice() }
    }

    /// Returns the start pointer. Null only for an empty buffer.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.data
    }

    /// Returns the start pointer for native routines that write into the buffer.
    ///
    /// Writing is only sound when the bytes come from a writable region: a
    /// [`MemoryOwner`](crate::MemoryOwner) whose `is_writable` returns `true`, or
    /// a region a provider set with [`ProviderOutput::set_region`] from such an
    /// owner. Raw sequences and regions set with [`ProviderOutput::set_bytes`]
    /// are read-only. No slice obtained from [`as_slice`](Self::as_slice) may be
    /// alive while writing.
    #[inline]
    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.data.cast_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the element strides, or an empty slice when the source has no
    /// multi-dimensional structure.
    pub fn strides(&self) -> &'a [isize] {
        self.strides.unwrap_or_default()
    }

    /// Returns `true` if the provider supplied stride metadata.
    pub fn has_strides(&self) -> bool {
        self.strides.is_some()
    }

    /// Returns the logical element width per stride unit (zero when unset).
    pub fn component_count(&self) -> usize {
        self.component_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_output_defaults() {
        let output = ProviderOutput::<()>::new();
        assert!(output.region().is_none());
        assert!(output.is_empty());
        assert!(output.strides().is_none());
        assert_eq!(output.component_count(), 0);
        assert!(output.replacement().is_none());
    }

    #[test]
    fn test_resolution_view_borrows_bytes() {
        let bytes = vec![1u8, 2, 3, 4, 5, 6];
        let mut output = ProviderOutput::<()>::new();
        output.set_bytes(&bytes);
        output.set_strides([3, 1]);
        output.set_component_count(1);

        let (region, strides, component_count, _) = output.into_parts();
        let resolution = Resolution::new((), region.unwrap(), strides, component_count, 0, false);
        let buffer = resolution.buffer();
        assert_eq!(buffer.as_ptr(), bytes.as_ptr());
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(buffer.strides(), &[3, 1]);
        assert!(buffer.has_strides());
        assert_eq!(buffer.component_count(), 1);
        assert!(!resolution.is_replacement());
    }

    #[test]
    fn test_null_view_is_empty() {
        let resolution = Resolution::new((), MemoryRegion::null(), None, 0, 0, false);
        let buffer = resolution.buffer();
        assert!(buffer.as_ptr().is_null());
        assert!(buffer.as_slice().is_empty());
        assert!(buffer.strides().is_empty());
        assert!(!buffer.has_strides());
    }
}
