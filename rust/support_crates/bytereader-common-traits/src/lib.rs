//! Traits and definitions shared by the bytereader crates.
//!
//! This crate describes the capability surface a host value space must expose in
//! order to have its values resolved into byte buffers.
//!
//! # Modules
//!
//! - [`memory_owner`]: Traits for types that own a contiguous byte region, and
//!   the writable [`ByteCell`] store
//! - [`host_value`]: The host value handle, its capability descriptor and slots
//! - [`native_array`]: The fixed descriptor of a foreign-owned byte array

pub mod host_value;
pub mod memory_owner;
pub mod native_array;

pub use host_value::{Capability, HostSlot, HostValue, ProviderId, ShapeKind};
pub use memory_owner::{ByteCell, MemoryOwner, MemoryRegion};
pub use native_array::NativeArrayHeader;
