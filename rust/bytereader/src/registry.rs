//! Registry of byte providers, keyed by provider identity.
//!
//! Hosts attach [`Capability::Registered`](bytereader_common_traits::Capability::Registered)
//! descriptors to values whose bytes can only be extracted by native code. The
//! descriptor names a provider by its [`ProviderId`], and the resolver looks the
//! provider up here.
//!
//! # Lifetime
//!
//! A `ProviderRegistry` is an explicit service object: the host constructs it
//! once at module setup (typically in a `static`, since [`ProviderRegistry::new`]
//! is `const`) and keeps it for as long as values referring to its providers can
//! be resolved. Entries are never removed.
//!
//! # Thread Safety
//!
//! The registry uses a `RwLock`. Registration is append-only and idempotent,
//! and no lock is held while a provider runs, so providers may themselves resolve
//! values (and even register further providers) without deadlocking.

use std::ops::Deref;
use std::sync::{Arc, PoisonError, RwLock};

use bytereader_common::{Result, verify_arg};
use bytereader_common_traits::{HostValue, ProviderId};

use crate::buffer::{ProviderOutput, Strides};

/// A native routine that knows how to extract the bytes of a particular kind of
/// host value.
///
/// The provider object itself plays the role of the opaque context: any state
/// the routine needs lives in its fields.
///
/// # Safety
///
/// Implementors must guarantee that every region written into a
/// [`ProviderOutput`] stays valid, unmoved and not resized for as long as the
/// value passed to [`get_bytes`](Self::get_bytes) is alive (or, when the
/// provider reports a replacement through [`ProviderOutput::replace_value`],
/// for as long as the replacement is alive). Regions owned by the provider
/// itself must live as long as the provider stays registered.
pub unsafe trait BytesProvider<V: HostValue>: Send + Sync {
    /// Returns a human-readable name for diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Extracts the bytes of `value` into `output`.
    fn get_bytes(&self, value: &V, output: &mut ProviderOutput<V>) -> Result<()>;

    /// Returns the stride metadata of `value`, or `None` if the provider has no
    /// notion of strides.
    ///
    /// Called only when the caller asked for strides and `get_bytes` did not
    /// already supply them.
    fn get_strides(&self, _value: &V) -> Result<Option<Strides>> {
        Ok(None)
    }

    /// Checks, before extraction, whether `value` can satisfy one of the
    /// `required_sizes`.
    ///
    /// `None` means the provider does not pre-validate; `Some(false)` rejects the
    /// requirement without extracting anything.
    fn ensure_size(&self, _value: &V, _required_sizes: &[usize]) -> Option<bool> {
        None
    }
}

/// A registered provider, either borrowed for the whole process or shared with
/// the registry.
pub enum ProviderHandle<V: HostValue> {
    /// A provider with `'static` storage; the registry only records its presence.
    Static(&'static dyn BytesProvider<V>),
    /// A provider the registry keeps alive.
    Shared(Arc<dyn BytesProvider<V>>),
}

impl<V: HostValue> ProviderHandle<V> {
    /// Returns the identity of the provider.
    pub fn id(&self) -> ProviderId {
        provider_id(self.deref())
    }
}

impl<V: HostValue> Clone for ProviderHandle<V> {
    fn clone(&self) -> Self {
        match self {
            ProviderHandle::Static(provider) => ProviderHandle::Static(*provider),
            ProviderHandle::Shared(provider) => ProviderHandle::Shared(provider.clone()),
        }
    }
}

impl<V: HostValue> Deref for ProviderHandle<V> {
    type Target = dyn BytesProvider<V>;

    fn deref(&self) -> &Self::Target {
        match self {
            ProviderHandle::Static(provider) => *provider,
            ProviderHandle::Shared(provider) => provider.as_ref(),
        }
    }
}

impl<V: HostValue> std::fmt::Debug for ProviderHandle<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            ProviderHandle::Static(_) => "Static",
            ProviderHandle::Shared(_) => "Shared",
        };
        f.debug_struct(kind)
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}

/// Returns the identity under which `provider` is (or would be) registered.
///
/// The identity is the provider object's address, so hosts can compute it ahead
/// of registration in order to build capability descriptors.
pub fn provider_id<V: HostValue>(provider: &dyn BytesProvider<V>) -> ProviderId {
    let addr = (provider as *const dyn BytesProvider<V>).cast::<()>().addr();
    ProviderId::from_addr(addr)
}

/// Registry mapping provider identities to registered providers.
pub struct ProviderRegistry<V: HostValue> {
    entries: RwLock<ahash::HashMap<ProviderId, ProviderHandle<V>>>,
}

impl<V: HostValue> ProviderRegistry<V> {
    /// Creates an empty registry.
    ///
    /// The map uses a fixed hasher state, which allows `const` construction.
    pub const fn new() -> ProviderRegistry<V> {
        ProviderRegistry {
            entries: RwLock::new(ahash::HashMap::with_hasher(
                ahash::RandomState::with_seeds(65423554, 7123564654, 911002456, 3711888456),
            )),
        }
    }

    /// Registers a provider with `'static` storage.
    ///
    /// Registering the same provider object again is a no-op that returns the
    /// existing identity.
    ///
    /// # Errors
    ///
    /// Returns an `Error::invalid_arg` if the provider is zero-sized: distinct
    /// zero-sized objects may share an address, so their identities would not be
    /// unique.
    pub fn register(&self, provider: &'static dyn BytesProvider<V>) -> Result<ProviderId> {
        self.insert(ProviderHandle::Static(provider))
    }

    /// Registers a provider that the registry keeps alive.
    ///
    /// Registering the same `Arc` (or a clone of it) again is a no-op that
    /// returns the existing identity.
    ///
    /// # Errors
    ///
    /// Returns an `Error::invalid_arg` if the provider is zero-sized.
    pub fn register_shared(&self, provider: Arc<dyn BytesProvider<V>>) -> Result<ProviderId> {
        self.insert(ProviderHandle::Shared(provider))
    }

    /// Looks up a registered provider.
    pub fn lookup(&self, id: ProviderId) -> Option<ProviderHandle<V>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Returns `true` if a provider is registered under `id`.
    pub fn contains(&self, id: ProviderId) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Returns the number of registered providers.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, handle: ProviderHandle<V>) -> Result<ProviderId> {
        verify_arg!(provider, std::mem::size_of_val(handle.deref()) != 0);

        let id = handle.id();
        // Entries are only ever added, so a poisoned map is still consistent.
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&id) {
            log::trace!("byte provider '{}' ({id}) already registered", handle.name());
        } else {
            log::debug!("registering byte provider '{}' ({id})", handle.name());
            entries.insert(id, handle);
        }
        Ok(id)
    }
}

impl<V: HostValue> Default for ProviderRegistry<V> {
    fn default() -> Self {
        ProviderRegistry::new()
    }
}

impl<V: HostValue> std::fmt::Debug for ProviderRegistry<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("len", &self.len())
            .finish()
    }
}
