//! The capability surface consumed from a host value space.
//!
//! A host (a scripting runtime, an embedding layer, a test double) exposes its
//! values to the resolver through [`HostValue`]. A value is either a raw byte
//! sequence, such as a string, or it carries a [`Capability`] descriptor naming
//! how its bytes can be obtained.

use std::borrow::Cow;
use std::fmt;

use bytereader_common::error::StdErrorBoxed;

use crate::memory_owner::MemoryOwner;

/// A handle to a value living in the host's value space.
///
/// Cloning a `HostValue` clones the *handle*, not the underlying object: all
/// clones refer to the same storage, and the storage stays alive for as long as
/// any clone does. Reference-counted handles and garbage-collector roots both
/// fit this model.
///
/// # Safety
///
/// Implementors must guarantee that any bytes exposed through
/// [`as_sequence`](Self::as_sequence), [`block`](Self::block),
/// [`inline_array`](Self::inline_array), or described by a native array header
/// inside the block:
/// - remain valid and at the same address for as long as any clone of the
///   handle is alive;
/// - are not resized or reallocated while such a clone exists.
///
/// Resolved buffers hand out raw views of these bytes without copying them, so
/// violating this contract leads to dangling reads.
///
/// Raw sequences are always read-only. Native code may write into a block or an
/// inline array only when its [`MemoryOwner::is_writable`] says so.
///
/// Handles are `'static`: registered providers live for the whole process and
/// are shared between every value they may be asked about.
pub unsafe trait HostValue: Clone + 'static {
    /// The host's representation of a callable delegation routine.
    type Callable;

    /// Returns the host's name for the value's type, used in diagnostics.
    fn type_name(&self) -> Cow<'_, str>;

    /// Returns the intrinsic bytes of a raw sequence value (e.g. a string),
    /// or `None` if the value is not a raw sequence.
    fn as_sequence(&self) -> Option<&[u8]>;

    /// Returns the capability descriptor attached to the value, if any.
    fn capability(&self) -> Option<Capability<Self>>;

    /// Returns the value's own storage block, if the value is backed by one
    /// (an opaque handle with an embedded memory block).
    fn block(&self) -> Option<&dyn MemoryOwner> {
        None
    }

    /// Returns the dynamically sized byte array the value directly owns, if any.
    fn inline_array(&self) -> Option<&dyn MemoryOwner> {
        None
    }

    /// Invokes a delegation routine with this value as its sole argument.
    ///
    /// Returns every value the routine produced. The resolver expects exactly
    /// one; an empty result or several results are reported as failures.
    fn call_delegate(
        &self,
        delegate: &Self::Callable,
    ) -> std::result::Result<Vec<Self>, StdErrorBoxed>;
}

/// Describes how the bytes of a non-sequence value are obtained.
pub enum Capability<V: HostValue> {
    /// The value explicitly opts out of byte access.
    Forbidden,
    /// The value has one of the built-in storage shapes.
    Shape(ShapeKind),
    /// The value hands back another value whose bytes are used instead.
    Delegate(V::Callable),
    /// The bytes are extracted by a provider registered under this identity.
    Registered(ProviderId),
    /// The bytes are the value's own storage block, starting at `offset`.
    Raw { offset: i64 },
}

impl<V: HostValue> Capability<V> {
    /// A short, stable name of the descriptor variant.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Forbidden => "forbidden",
            Capability::Shape(ShapeKind::InlineArray) => "inline-array",
            Capability::Shape(ShapeKind::NativeArray) => "native-array",
            Capability::Delegate(_) => "delegate",
            Capability::Registered(_) => "registered",
            Capability::Raw { .. } => "raw",
        }
    }
}

impl<V: HostValue> fmt::Debug for Capability<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Forbidden => f.write_str("Forbidden"),
            Capability::Shape(shape) => f.debug_tuple("Shape").field(shape).finish(),
            Capability::Delegate(_) => f.write_str("Delegate(..)"),
            Capability::Registered(id) => f.debug_tuple("Registered").field(id).finish(),
            Capability::Raw { offset } => f.debug_struct("Raw").field("offset", offset).finish(),
        }
    }
}

/// Built-in storage shapes with a dedicated inline extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// The value owns a contiguous, dynamically sized byte array
    /// (see [`HostValue::inline_array`]).
    InlineArray,
    /// The value's block starts with a [`NativeArrayHeader`](crate::NativeArrayHeader)
    /// describing a foreign-owned buffer.
    NativeArray,
}

/// Identity of a registered byte provider.
///
/// The identity is the address of the provider object, so registering the same
/// object twice yields the same `ProviderId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(usize);

impl ProviderId {
    /// Creates an identity from a raw address.
    pub const fn from_addr(addr: usize) -> ProviderId {
        ProviderId(addr)
    }

    /// Returns the raw address the identity was derived from.
    pub const fn addr(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A writable location holding a host value, such as a stack index.
///
/// The resolver uses the slot to read the value it starts from and, when asked
/// to, to overwrite it with the canonical value the bytes were resolved from.
pub trait HostSlot {
    type Value: HostValue;

    /// Returns the value currently stored in the slot.
    fn value(&self) -> &Self::Value;

    /// Overwrites the slot with `value`.
    fn assign(&mut self, value: Self::Value);

    /// Returns the host's position of the slot, used in diagnostics.
    fn position(&self) -> Option<i64> {
        None
    }
}

impl<V: HostValue> HostSlot for V {
    type Value = V;

    fn value(&self) -> &V {
        self
    }

    fn assign(&mut self, value: V) {
        *self = value;
    }
}
