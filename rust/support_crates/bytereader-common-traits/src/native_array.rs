//! Fixed descriptor of a foreign-owned byte array.

use crate::memory_owner::MemoryRegion;

/// Pointer and length pair describing a byte buffer owned outside of the host
/// value space (e.g. by a native library).
///
/// A value of [`ShapeKind::NativeArray`](crate::ShapeKind::NativeArray) shape
/// stores this header at the very start of its storage block. The header is
/// read unaligned, so the block does not need any particular alignment.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NativeArrayHeader {
    /// Address of the first byte.
    pub data: u64,
    /// Number of bytes at `data`.
    pub len: u64,
}

impl NativeArrayHeader {
    /// Size of the encoded header, in bytes.
    pub const SIZE: usize = std::mem::size_of::<NativeArrayHeader>();

    /// Creates a header describing `len` bytes at `ptr`.
    pub fn new(ptr: *const u8, len: usize) -> NativeArrayHeader {
        NativeArrayHeader {
            data: ptr.expose_provenance() as u64,
            len: len as u64,
        }
    }

    /// Creates a header describing the given slice.
    pub fn for_slice(bytes: &[u8]) -> NativeArrayHeader {
        NativeArrayHeader::new(bytes.as_ptr(), bytes.len())
    }

    /// Creates a header describing `region`, keeping the region pointer's
    /// access rights (a writable region stays writable once read back).
    pub fn for_region(region: MemoryRegion) -> NativeArrayHeader {
        NativeArrayHeader::new(region.ptr, region.len)
    }

    /// Reads a header from the start of `block`.
    ///
    /// Returns `None` if the block is shorter than [`NativeArrayHeader::SIZE`].
    pub fn read_from(block: &[u8]) -> Option<NativeArrayHeader> {
        let bytes = block.get(..Self::SIZE)?;
        bytemuck::try_pod_read_unaligned(bytes).ok()
    }

    /// Returns the encoded header bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Returns the described region, or `None` if the address or length do not
    /// fit the platform's pointer width.
    pub fn region(&self) -> Option<MemoryRegion> {
        let addr = usize::try_from(self.data).ok()?;
        let len = usize::try_from(self.len).ok()?;
        Some(MemoryRegion {
            ptr: std::ptr::with_exposed_provenance(addr),
            len,
        })
    }
}
