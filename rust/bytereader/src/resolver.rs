//! The resolution protocol.
//!
//! Given a host value, the [`Resolver`] negotiates how to reach its bytes:
//!
//! 1. A raw sequence value (e.g. a string) is used directly.
//! 2. Otherwise the value's capability descriptor decides:
//!    - `Forbidden` stops with the sticky forbidden error;
//!    - `Shape` dispatches to the matching inline provider;
//!    - `Delegate` calls the host routine and starts over on the value it
//!      returns;
//!    - `Registered` looks the provider up in the [`ProviderRegistry`] and runs
//!      it;
//!    - `Raw` uses the value's own storage block from the given offset.
//!
//!    A value without a descriptor has no protocol support.
//! 3. The candidate buffer is validated against the caller's options.
//!
//! Delegation is followed in a loop, not by recursion, and is capped by
//! [`ResolutionOptions::delegation_limit`], so a cyclic delegation chain fails
//! instead of running forever.
//!
//! The resolver keeps no state between calls and holds no registry lock while
//! host code runs, so delegation routines and providers may resolve other values
//! re-entrantly.

use bytereader_common::{Result, ValueSite, error::Error};
use bytereader_common_traits::{Capability, HostSlot, HostValue, ProviderId, ShapeKind};

use crate::{
    buffer::{ProviderOutput, Resolution},
    options::ResolutionOptions,
    providers,
    registry::ProviderRegistry,
    report::{ReadReport, site_of},
    validate,
};

/// Resolves host values into byte buffers, using the providers of a registry.
pub struct Resolver<'r, V: HostValue> {
    registry: &'r ProviderRegistry<V>,
}

impl<'r, V: HostValue> Resolver<'r, V> {
    pub fn new(registry: &'r ProviderRegistry<V>) -> Resolver<'r, V> {
        Resolver { registry }
    }

    pub fn registry(&self) -> &'r ProviderRegistry<V> {
        self.registry
    }

    /// Resolves `value` into a byte buffer.
    ///
    /// Nothing is written back: `replace_original` is only honored by
    /// [`resolve_slot`](Self::resolve_slot).
    pub fn resolve(&self, value: &V, options: &ResolutionOptions) -> Result<Resolution<V>> {
        self.run(value.clone(), None, options)
    }

    /// Resolves the value held by `slot`.
    ///
    /// When `replace_original` is set and the bytes belong to a value other than
    /// the one in the slot (delegation was followed, or a provider reported a
    /// replacement), the slot is overwritten with that value, so that the next
    /// resolution of the slot is a direct hit.
    pub fn resolve_slot<S>(&self, slot: &mut S, options: &ResolutionOptions) -> Result<Resolution<V>>
    where
        S: HostSlot<Value = V> + ?Sized,
    {
        let position = slot.position();
        let resolution = self.run(slot.value().clone(), position, options)?;
        if options.replaces_original() && resolution.is_replacement() {
            log::trace!(
                "replacing slot {} with resolved {}",
                position.map_or_else(|| "value".to_string(), |p| p.to_string()),
                resolution.anchor().type_name()
            );
            slot.assign(resolution.anchor().clone());
        }
        Ok(resolution)
    }

    /// Resolves the value held by `slot`, reporting failures instead of
    /// returning them.
    pub fn read<S>(&self, slot: &mut S, options: &ResolutionOptions) -> ReadReport<V>
    where
        S: HostSlot<Value = V> + ?Sized,
    {
        ReadReport::new(self.resolve_slot(slot, options))
    }

    fn run(
        &self,
        value: V,
        position: Option<i64>,
        options: &ResolutionOptions,
    ) -> Result<Resolution<V>> {
        let mut current = value;
        let mut depth = 0;
        let mut state = State::Inspecting;
        loop {
            let site = site_of(&current, position, depth);
            log::trace!("{site}: {}", state.name());
            state = match state {
                State::Inspecting => Self::inspect(&current, &site)?,
                State::InlineShape(ShapeKind::InlineArray) => {
                    State::Validating(providers::inline_array(&current, &site)?)
                }
                State::InlineShape(ShapeKind::NativeArray) => {
                    State::Validating(providers::native_array(&current, &site)?)
                }
                State::RawOffset(offset) => {
                    State::Validating(providers::raw_block(&current, offset, &site)?)
                }
                State::Delegating(delegate) => {
                    if depth >= options.delegation_limit() {
                        return Err(Error::delegation_too_deep(site, options.delegation_limit()));
                    }
                    current = Self::delegate(&current, &delegate, site)?;
                    depth += 1;
                    State::Inspecting
                }
                State::ProviderLookup(id) => {
                    State::Validating(self.run_provider(&current, id, options, &site)?)
                }
                State::Validating(output) => {
                    return Self::finish(current, output, depth, options, &site);
                }
            };
        }
    }

    fn inspect(value: &V, site: &ValueSite) -> Result<State<V>> {
        if let Some(output) = providers::sequence(value) {
            return Ok(State::Validating(output));
        }
        let capability = value
            .capability()
            .ok_or_else(|| Error::no_protocol_support(site.clone()))?;
        Ok(match capability {
            Capability::Forbidden => return Err(Error::forbidden(site.clone())),
            Capability::Shape(shape) => State::InlineShape(shape),
            Capability::Delegate(delegate) => State::Delegating(delegate),
            Capability::Registered(id) => State::ProviderLookup(id),
            Capability::Raw { offset } => State::RawOffset(offset),
        })
    }

    fn delegate(value: &V, delegate: &V::Callable, site: ValueSite) -> Result<V> {
        let mut results = value
            .call_delegate(delegate)
            .map_err(|e| Error::delegation_failed(site.clone(), e))?;
        match results.len() {
            0 => Err(Error::no_protocol_support(
                ValueSite::new("no value")
                    .at(site.position)
                    .with_depth(site.depth + 1),
            )),
            1 => Ok(results.swap_remove(0)),
            count => Err(Error::too_many_results(site, count)),
        }
    }

    fn run_provider(
        &self,
        value: &V,
        id: ProviderId,
        options: &ResolutionOptions,
        site: &ValueSite,
    ) -> Result<ProviderOutput<V>> {
        let provider = self
            .registry
            .lookup(id)
            .ok_or_else(|| Error::unregistered_provider(site.clone(), id.addr()))?;
        validate::pre_validate(&*provider, value, options, site)?;

        let attribute = |e: Error| {
            if e.site().is_some() {
                e
            } else {
                Error::provider_failed(site.clone(), provider.name(), e.to_string())
            }
        };

        let mut output = ProviderOutput::new();
        provider.get_bytes(value, &mut output).map_err(attribute)?;
        if options.wants_strides() && output.strides().is_none() {
            if let Some(strides) = provider.get_strides(value).map_err(attribute)? {
                output.set_strides(strides);
            }
        }
        let problem = match output.region() {
            None => "no bytes were produced",
            Some(region) if region.is_null() && !region.is_empty() => {
                "null data with a non-zero length"
            }
            Some(_) => return Ok(output),
        };
        Err(Error::provider_failed(site.clone(), provider.name(), problem))
    }

    fn finish(
        current: V,
        output: ProviderOutput<V>,
        depth: usize,
        options: &ResolutionOptions,
        site: &ValueSite,
    ) -> Result<Resolution<V>> {
        validate::validate(&output, options, site)?;

        let (region, strides, component_count, replacement) = output.into_parts();
        let region = region
            .filter(|r| !r.is_null() || r.is_empty())
            .ok_or_else(|| Error::not_addressable(site.clone(), "no readable bytes"))?;

        let (anchor, replaced) = match replacement {
            Some(replacement) => (replacement, true),
            None => (current, depth > 0),
        };
        Ok(Resolution::new(
            anchor,
            region,
            strides,
            component_count,
            depth,
            replaced,
        ))
    }
}

impl<V: HostValue> Clone for Resolver<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V: HostValue> Copy for Resolver<'_, V> {}

impl<V: HostValue> std::fmt::Debug for Resolver<'_, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("registry", self.registry)
            .finish()
    }
}

/// Resolution states.
///
/// The terminal states are the exits of [`Resolver::run`]: `Resolved` returns
/// `Ok`, while `Forbidden` and `Failed` return `Err` (told apart by
/// [`Error::is_forbidden`]).
enum State<V: HostValue> {
    Inspecting,
    InlineShape(ShapeKind),
    RawOffset(i64),
    Delegating(V::Callable),
    ProviderLookup(ProviderId),
    Validating(ProviderOutput<V>),
}

impl<V: HostValue> State<V> {
    fn name(&self) -> &'static str {
        match self {
            State::Inspecting => "inspecting",
            State::InlineShape(ShapeKind::InlineArray) => "inline-array",
            State::InlineShape(ShapeKind::NativeArray) => "native-array",
            State::RawOffset(_) => "raw-offset",
            State::Delegating(_) => "delegating",
            State::ProviderLookup(_) => "provider-lookup",
            State::Validating(_) => "validating",
        }
    }
}
