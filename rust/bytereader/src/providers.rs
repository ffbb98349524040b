//! Inline extraction strategies for the built-in value shapes.
//!
//! Each provider is a pure function of the value: it finds the value's bytes
//! and describes them in a [`ProviderOutput`], without copying anything. The
//! resolver picks the provider from the value's capability descriptor, so a
//! provider never has to guess the shape.

use bytereader_common::{Result, ValueSite, error::Error};
use bytereader_common_traits::{HostValue, MemoryOwner, MemoryRegion, NativeArrayHeader};

use crate::buffer::ProviderOutput;

/// Uses the intrinsic bytes of a raw sequence value (e.g. a string).
///
/// Returns `None` if the value is not a raw sequence.
pub fn sequence<V: HostValue>(value: &V) -> Option<ProviderOutput<V>> {
    value
        .as_sequence()
        .map(|bytes| ProviderOutput::with_region(MemoryRegion::from_slice(bytes)))
}

/// Uses the storage and current size of the byte array the value owns.
pub fn inline_array<V: HostValue>(value: &V, site: &ValueSite) -> Result<ProviderOutput<V>> {
    let array = value
        .inline_array()
        .ok_or_else(|| Error::not_addressable(site.clone(), "no inline array storage"))?;
    Ok(ProviderOutput::with_region(array.memory()))
}

/// Uses the foreign buffer described by the [`NativeArrayHeader`] at the start
/// of the value's storage block.
pub fn native_array<V: HostValue>(value: &V, site: &ValueSite) -> Result<ProviderOutput<V>> {
    let block = value
        .block()
        .ok_or_else(|| Error::not_addressable(site.clone(), "no storage block"))?
        .memory();
    // The block outlives this call (HostValue contract); the borrow ends before
    // anyone writes through the header's region.
    let header = NativeArrayHeader::read_from(unsafe { block.as_slice() }).ok_or_else(|| {
        Error::not_addressable(
            site.clone(),
            format!(
                "storage block of {} bytes cannot hold a native array header",
                block.len()
            ),
        )
    })?;
    let region = header.region().ok_or_else(|| {
        Error::not_addressable(site.clone(), "native array does not fit the address space")
    })?;
    if region.is_null() && !region.is_empty() {
        return Err(Error::not_addressable(
            site.clone(),
            "native array header holds a null pointer",
        ));
    }
    Ok(ProviderOutput::with_region(region))
}

/// Uses the value's own storage block, starting `offset` bytes in.
///
/// # Errors
///
/// Fails with `BoundsCheckFailed` iff `offset < 0 || offset > block length`;
/// otherwise the resulting length is exactly `block length - offset`.
pub fn raw_block<V: HostValue>(value: &V, offset: i64, site: &ValueSite) -> Result<ProviderOutput<V>> {
    let block = value
        .block()
        .ok_or_else(|| Error::not_addressable(site.clone(), "no storage block"))?
        .memory();
    let region = usize::try_from(offset)
        .ok()
        .and_then(|offset| block.skip(offset))
        .ok_or_else(|| Error::bounds_check(site.clone(), offset, block.len()))?;
    Ok(ProviderOutput::with_region(region))
}
