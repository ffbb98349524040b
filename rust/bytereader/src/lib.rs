//! Zero-copy byte access to the values of a dynamic host runtime.
//!
//! Native consumers (image decoders, hashers, codecs) need raw bytes, while a
//! scripting runtime exposes strings, userdata objects, and wrapper objects of
//! many kinds. This crate resolves any such value into a pointer and length
//! pair, without copying, through a small negotiation protocol.
//!
//! # Overview
//!
//! - The host implements [`HostValue`] for its value handles. A value is
//!   either a raw sequence (its bytes are used directly) or carries a
//!   [`Capability`] descriptor.
//! - Values whose bytes only native code can reach name a [`BytesProvider`]
//!   registered in a [`ProviderRegistry`].
//! - A [`Resolver`] walks the protocol for one value, following delegation
//!   chains up to a configurable depth, and validates the result against
//!   [`ResolutionOptions`] (exact sizes, stride metadata).
//! - The outcome is a [`Resolution`], which keeps the value that owns the bytes
//!   alive and lends out a [`ResolvedBuffer`] view. At the host boundary,
//!   [`Resolver::read`] returns a [`ReadReport`] instead of an error.
//!
//! Every failure is attributed to a [`ValueSite`] naming the offending value,
//! its slot position, and the delegation depth it was reached at.

pub mod buffer;
pub mod options;
pub mod providers;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod validate;

pub use buffer::{ProviderOutput, Resolution, ResolvedBuffer, Strides};
pub use bytereader_common::{
    Result, ValueSite,
    error::{Error, ErrorKind},
};
pub use bytereader_common_traits::{
    ByteCell, Capability, HostSlot, HostValue, MemoryOwner, MemoryRegion, NativeArrayHeader, ProviderId,
    ShapeKind,
};
pub use options::{DEFAULT_MAX_DELEGATION_DEPTH, ResolutionOptions};
pub use registry::{BytesProvider, ProviderHandle, ProviderRegistry, provider_id};
pub use report::{ReadReport, site_of};
pub use resolver::Resolver;
