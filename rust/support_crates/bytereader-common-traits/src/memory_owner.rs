//! `MemoryOwner`: A trait for types that own a contiguous byte region.

use std::cell::UnsafeCell;
use std::fmt;

/// A trait for types that own a contiguous byte region.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - The memory returned by `memory()` remains valid, and is not moved or
///   reallocated, for as long as the owner is borrowed by a reader.
/// - The reported length is accurate: `len` bytes starting at `ptr` are
///   initialized.
/// - A null `ptr` is only reported together with a zero `len`.
/// - `is_writable()` returns `true` only if the region's pointer carries write
///   access, i.e. it was not derived from a shared `&[u8]` borrow.
pub unsafe trait MemoryOwner {
    /// Returns information about the owned memory block.
    fn memory(&self) -> MemoryRegion;

    /// Returns `true` if native code may write through the region's pointer.
    fn is_writable(&self) -> bool {
        false
    }
}

unsafe impl MemoryOwner for Vec<u8> {
    fn memory(&self) -> MemoryRegion {
        MemoryRegion::from_slice(self)
    }
}

unsafe impl MemoryOwner for Box<[u8]> {
    fn memory(&self) -> MemoryRegion {
        MemoryRegion::from_slice(self)
    }
}

/// A fixed-size byte array that can be written through shared handles.
///
/// The bytes live in `UnsafeCell`s, so the pointer handed out by
/// [`MemoryOwner::memory`] may be used for writes by native code even though
/// the owner is only shared-borrowed. The length never changes.
pub struct ByteCell {
    bytes: Box<[UnsafeCell<u8>]>,
}

impl ByteCell {
    pub fn new(bytes: Vec<u8>) -> ByteCell {
        ByteCell {
            bytes: bytes.into_iter().map(UnsafeCell::new).collect(),
        }
    }

    pub fn zeroed(len: usize) -> ByteCell {
        ByteCell::new(vec![0; len])
    }

    /// Returns a pointer with write access to the first byte.
    #[inline]
    pub fn as_mut_ptr(&self) -> *mut u8 {
        UnsafeCell::raw_get(self.bytes.as_ptr())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Copies the current contents out.
    pub fn to_vec(&self) -> Vec<u8> {
        // Non-atomic snapshot; the cell is !Sync, so no other thread writes.
        self.bytes.iter().map(|b| unsafe { *b.get() }).collect()
    }
}

unsafe impl MemoryOwner for ByteCell {
    fn memory(&self) -> MemoryRegion {
        MemoryRegion::from_raw(self.as_mut_ptr(), self.len())
    }

    fn is_writable(&self) -> bool {
        true
    }
}

impl From<Vec<u8>> for ByteCell {
    fn from(bytes: Vec<u8>) -> Self {
        ByteCell::new(bytes)
    }
}

impl fmt::Debug for ByteCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteCell").field("len", &self.len()).finish()
    }
}

/// A borrowed, non-owning description of a byte region: start pointer and length.
///
/// A `MemoryRegion` carries no lifetime. Whoever hands one out states, through
/// an `unsafe` contract, how long the bytes stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    /// Pointer to the first byte of the region.
    pub ptr: *const u8,
    /// Number of bytes available starting at `ptr`.
    pub len: usize,
}

impl MemoryRegion {
    /// Creates a region with no bytes and a null pointer.
    pub const fn null() -> MemoryRegion {
        MemoryRegion {
            ptr: std::ptr::null(),
            len: 0,
        }
    }

    /// Creates a region from a pointer that may carry write access.
    #[inline]
    pub fn from_raw(ptr: *mut u8, len: usize) -> MemoryRegion {
        MemoryRegion {
            ptr: ptr.cast_const(),
            len,
        }
    }

    /// Creates a read-only region describing the given slice.
    ///
    /// Writing through the resulting pointer is undefined behavior.
    #[inline]
    pub fn from_slice(bytes: &[u8]) -> MemoryRegion {
        MemoryRegion {
            ptr: bytes.as_ptr(),
            len: bytes.len(),
        }
    }

    /// Returns `true` if the region has a null start pointer.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// Returns the number of bytes in the region.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the region contains no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the sub-region starting `offset` bytes into this one, or `None`
    /// if `offset` is past the end.
    ///
    /// An offset equal to the length yields an empty region positioned at the end.
    pub fn skip(&self, offset: usize) -> Option<MemoryRegion> {
        if offset > self.len {
            return None;
        }
        if offset == 0 {
            return Some(*self);
        }
        Some(MemoryRegion {
            // Stays within (or one past the end of) the described allocation.
            ptr: self.ptr.wrapping_add(offset),
            len: self.len - offset,
        })
    }

    /// Views the region as a byte slice.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that the region is valid for reads for the
    /// chosen lifetime `'a`, and that no one writes to it in the meantime.
    #[inline]
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        if self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}
