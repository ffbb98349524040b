//! Data generation utilities for testing.

use std::rc::Rc;

use bytereader_common_traits::{ByteCell, MemoryOwner, MemoryRegion};

/// Generates `len` random bytes from the thread-local generator.
///
/// Tests that need reproducible data should call `fastrand::seed` first.
pub fn random_bytes(len: usize) -> Vec<u8> {
    std::iter::repeat_with(|| fastrand::u8(..)).take(len).collect()
}

/// A byte buffer owned outside of the host value space, standing in for memory
/// handed out by a native library.
///
/// Clones share the allocation, which never moves or changes size. Native code
/// may write into it.
#[derive(Debug, Clone)]
pub struct ForeignBuffer {
    bytes: Rc<ByteCell>,
}

impl ForeignBuffer {
    pub fn new(bytes: Vec<u8>) -> ForeignBuffer {
        ForeignBuffer {
            bytes: Rc::new(ByteCell::new(bytes)),
        }
    }

    /// Creates a buffer of `len` copies of `byte`.
    pub fn filled(len: usize, byte: u8) -> ForeignBuffer {
        ForeignBuffer::new(vec![byte; len])
    }

    /// Creates a buffer of `len` random bytes.
    pub fn random(len: usize) -> ForeignBuffer {
        ForeignBuffer::new(random_bytes(len))
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_mut_ptr().cast_const()
    }

    /// Returns the writable region of the buffer.
    pub fn region(&self) -> MemoryRegion {
        self.bytes.memory()
    }

    /// Copies the current contents out.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes_is_seeded() {
        fastrand::seed(1234);
        let first = random_bytes(32);
        fastrand::seed(1234);
        assert_eq!(random_bytes(32), first);
        assert!(random_bytes(0).is_empty());
    }

    #[test]
    fn test_foreign_buffer_clones_share_storage() {
        let buffer = ForeignBuffer::filled(12, 0xab);
        let clone = buffer.clone();
        assert_eq!(buffer.as_ptr(), clone.as_ptr());
        assert_eq!(clone.to_vec(), vec![0xab; 12]);
    }
}
