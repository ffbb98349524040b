//! Validation of candidate buffers against the caller's size and shape
//! requirements.
//!
//! Sizes are matched exactly: a consumer that accepts "3N or 4N bytes" (RGB or
//! RGBA, say) lists both sizes, and any other length is rejected even if it is
//! larger.
//!
//! When a registered provider offers [`BytesProvider::ensure_size`], the size
//! requirement is checked before extraction via [`pre_validate`]. The
//! post-extraction [`validate`] runs in every case.

use bytereader_common::{Result, ValueSite, error::Error};
use bytereader_common_traits::HostValue;

use crate::{buffer::ProviderOutput, options::ResolutionOptions, registry::BytesProvider};

/// Checks a candidate buffer against `options`.
pub fn validate<V>(
    output: &ProviderOutput<V>,
    options: &ResolutionOptions,
    site: &ValueSite,
) -> Result<()> {
    let length = output.len();
    if options.has_size_constraint() && !options.sizes().contains(&length) {
        return Err(Error::size_mismatch(site.clone(), length, options.sizes()));
    }
    if options.wants_strides() && output.strides().is_none() {
        return Err(Error::strides_unavailable(site.clone()));
    }
    Ok(())
}

/// Asks `provider` whether `value` can satisfy the size requirement, before any
/// bytes are extracted.
///
/// Passes when there is no size requirement or the provider does not
/// pre-validate.
pub fn pre_validate<V: HostValue>(
    provider: &dyn BytesProvider<V>,
    value: &V,
    options: &ResolutionOptions,
    site: &ValueSite,
) -> Result<()> {
    if !options.has_size_constraint() {
        return Ok(());
    }
    match provider.ensure_size(value, options.sizes()) {
        Some(false) => Err(Error::size_rejected(site.clone(), options.sizes())),
        Some(true) | None => Ok(()),
    }
}
