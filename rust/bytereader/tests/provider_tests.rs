use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytereader::{
    BytesProvider, Error, ErrorKind, HostValue, MemoryRegion, ProviderOutput, ProviderRegistry,
    ResolutionOptions, Resolver, Result, Strides, ValueSite, provider_id,
};
use bytereader_testkit::{ToyStack, ToyValue};

/// Exposes the value's storage block, optionally as a 2-D image of the given
/// row width.
struct BlockReader {
    row_width: Option<isize>,
    calls: AtomicUsize,
}

impl BlockReader {
    const fn new(row_width: Option<isize>) -> BlockReader {
        BlockReader {
            row_width,
            calls: AtomicUsize::new(0),
        }
    }
}

unsafe impl BytesProvider<ToyValue> for BlockReader {
    fn name(&self) -> &str {
        "block"
    }

    fn get_bytes(&self, value: &ToyValue, output: &mut ProviderOutput<ToyValue>) -> Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        output.set_region(value.block().map_or(MemoryRegion::null(), |b| b.memory()));
        output.set_component_count(1);
        Ok(())
    }

    fn get_strides(&self, _value: &ToyValue) -> Result<Option<Strides>> {
        Ok(self.row_width.map(|width| [width, 1].into_iter().collect()))
    }
}

/// Accepts only blocks of a fixed size, and says so before extraction.
struct SizedReader {
    calls: AtomicUsize,
}

unsafe impl BytesProvider<ToyValue> for SizedReader {
    fn get_bytes(&self, value: &ToyValue, output: &mut ProviderOutput<ToyValue>) -> Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        output.set_region(value.block().map_or(MemoryRegion::null(), |b| b.memory()));
        Ok(())
    }

    fn ensure_size(&self, value: &ToyValue, required_sizes: &[usize]) -> Option<bool> {
        let len = value.block()?.memory().len();
        Some(required_sizes.contains(&len))
    }
}

/// Fails in configurable ways.
enum Faulty {
    Unattributed,
    Attributed,
    NoBytes,
    NullData,
}

unsafe impl BytesProvider<ToyValue> for Faulty {
    fn name(&self) -> &str {
        "faulty"
    }

    fn get_bytes(&self, _value: &ToyValue, output: &mut ProviderOutput<ToyValue>) -> Result<()> {
        match self {
            Faulty::Unattributed => Err(Error::invalid_arg("value", "unsupported layout")),
            Faulty::Attributed => Err(Error::not_addressable(
                ValueSite::new("image"),
                "pixels were released",
            )),
            Faulty::NoBytes => Ok(()),
            Faulty::NullData => {
                output.set_region(MemoryRegion {
                    ptr: std::ptr::null(),
                    len: 4,
                });
                Ok(())
            }
        }
    }
}

static ROWS: BlockReader = BlockReader::new(Some(3));
static FLAT: BlockReader = BlockReader::new(None);

fn resolver(registry: &ProviderRegistry<ToyValue>) -> Resolver<'_, ToyValue> {
    Resolver::new(registry)
}

#[test]
fn test_registered_provider() {
    let registry = ProviderRegistry::new();
    let id = registry.register(&FLAT).unwrap();
    let value = ToyValue::registered(id, b"native bytes".to_vec());

    let resolution = resolver(&registry)
        .resolve(&value, &ResolutionOptions::new())
        .unwrap();
    assert_eq!(resolution.as_slice(), b"native bytes");
    assert_eq!(
        resolution.buffer().as_ptr(),
        value.block().unwrap().memory().ptr
    );
    assert_eq!(resolution.buffer().component_count(), 1);
    assert!(!resolution.is_replacement());
}

#[test]
fn test_unregistered_provider() {
    let registry = ProviderRegistry::new();
    let id = provider_id::<ToyValue>(&ROWS);
    let mut stack = ToyStack::new();
    let position = stack.push(ToyValue::registered(id, vec![1, 2, 3]));

    let report = resolver(&registry).read(&mut stack.slot(position), &ResolutionOptions::new());
    assert!(!report.is_forbidden());
    assert!(report.bytes().is_none());
    match report.error().unwrap().kind() {
        ErrorKind::UnregisteredProvider { provider, .. } => assert_eq!(*provider, id.addr()),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(
        report.message().unwrap(),
        format!("unregistered reader {id} attached to userdata at index 1")
    );
}

#[test]
fn test_strides_from_provider() {
    let registry = ProviderRegistry::new();
    let id = registry.register(&ROWS).unwrap();
    let value = ToyValue::registered(id, vec![0; 12]);

    let options = ResolutionOptions::new().want_strides(true);
    let resolution = resolver(&registry).resolve(&value, &options).unwrap();
    let buffer = resolution.buffer();
    assert!(buffer.has_strides());
    assert_eq!(buffer.strides(), &[3, 1]);
    assert_eq!(buffer.len(), 12);

    // Strides are only fetched when asked for.
    let resolution = resolver(&registry)
        .resolve(&value, &ResolutionOptions::new())
        .unwrap();
    assert!(!resolution.buffer().has_strides());
}

#[test]
fn test_strides_unavailable_from_provider() {
    let registry = ProviderRegistry::new();
    let id = registry.register(&FLAT).unwrap();
    let value = ToyValue::registered(id, vec![0; 12]);

    let options = ResolutionOptions::new().want_strides(true);
    let err = resolver(&registry).resolve(&value, &options).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::StridesUnavailable { .. }));
}

#[test]
fn test_ensure_size_runs_before_extraction() {
    let registry = ProviderRegistry::new();
    let provider = Arc::new(SizedReader {
        calls: AtomicUsize::new(0),
    });
    let id = registry.register_shared(provider.clone()).unwrap();
    let value = ToyValue::registered(id, vec![0; 10]);

    let options = ResolutionOptions::new().required_sizes([4, 8]);
    let err = resolver(&registry).resolve(&value, &options).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::SizeMismatch { length: None, .. }
    ));
    assert_eq!(provider.calls.load(Ordering::Relaxed), 0);

    let options = ResolutionOptions::new().required_sizes([10]);
    let resolution = resolver(&registry).resolve(&value, &options).unwrap();
    assert_eq!(resolution.len(), 10);
    assert_eq!(provider.calls.load(Ordering::Relaxed), 1);
}

#[test]
fn test_size_checked_after_extraction_without_ensure_size() {
    let registry = ProviderRegistry::new();
    let provider = Arc::new(BlockReader::new(None));
    let id = registry.register_shared(provider.clone()).unwrap();
    let value = ToyValue::registered(id, vec![0; 10]);

    let options = ResolutionOptions::new().required_sizes([4, 8]);
    let err = resolver(&registry).resolve(&value, &options).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::SizeMismatch {
            length: Some(10),
            ..
        }
    ));
    assert_eq!(provider.calls.load(Ordering::Relaxed), 1);
}

#[test]
fn test_provider_failures() {
    let registry = ProviderRegistry::new();
    let cases = [
        (Faulty::Unattributed, "reader 'faulty' failed for userdata: invalid argument value: unsupported layout"),
        (Faulty::Attributed, "cannot point to image: pixels were released"),
        (Faulty::NoBytes, "reader 'faulty' failed for userdata: no bytes were produced"),
        (Faulty::NullData, "reader 'faulty' failed for userdata: null data with a non-zero length"),
    ];
    for (provider, message) in cases {
        let id = registry.register_shared(Arc::new(provider)).unwrap();
        let value = ToyValue::registered(id, vec![]);
        let err = resolver(&registry)
            .resolve(&value, &ResolutionOptions::new())
            .unwrap_err();
        assert_eq!(err.to_string(), message);
    }
}

/// Resolves a second value from inside `get_bytes` and hands its bytes back as
/// a replacement.
struct Redirect {
    registry: &'static ProviderRegistry<ToyValue>,
    target: &'static BlockReader,
}

unsafe impl BytesProvider<ToyValue> for Redirect {
    fn get_bytes(&self, value: &ToyValue, output: &mut ProviderOutput<ToyValue>) -> Result<()> {
        let target = self.registry.register(self.target)?;
        let canonical = ToyValue::registered(target, value.block_contents().unwrap_or_default());
        let resolution = Resolver::new(self.registry).resolve(&canonical, &ResolutionOptions::new())?;
        output.set_region(MemoryRegion::from_slice(resolution.as_slice()));
        output.replace_value(resolution.into_anchor());
        Ok(())
    }
}

static SHARED_REGISTRY: ProviderRegistry<ToyValue> = ProviderRegistry::new();
static REDIRECT_TARGET: BlockReader = BlockReader::new(None);
static REDIRECT: Redirect = Redirect {
    registry: &SHARED_REGISTRY,
    target: &REDIRECT_TARGET,
};

#[test]
fn test_reentrant_provider_with_replacement() {
    let id = SHARED_REGISTRY.register(&REDIRECT).unwrap();
    let mut stack = ToyStack::new();
    let position = stack.push(ToyValue::registered(id, b"pixels".to_vec()));
    let original = stack.get(position).clone();

    let resolution = resolver(&SHARED_REGISTRY)
        .resolve_slot(&mut stack.slot(position), &ResolutionOptions::new())
        .unwrap();
    assert_eq!(resolution.as_slice(), b"pixels");
    assert!(resolution.is_replacement());
    assert_eq!(resolution.delegation_depth(), 0);
    assert!(SHARED_REGISTRY.contains(provider_id::<ToyValue>(&REDIRECT_TARGET)));

    // The slot now holds the canonical value, which no longer goes through the
    // redirecting provider.
    let replaced = stack.get(position).clone();
    assert!(!replaced.ptr_eq(&original));
    assert!(replaced.ptr_eq(resolution.anchor()));
    assert_eq!(
        resolution.buffer().as_ptr(),
        replaced.block().unwrap().memory().ptr
    );
}

#[test]
fn test_delegate_to_registered_value() {
    let registry = ProviderRegistry::new();
    let id = registry.register(&ROWS).unwrap();
    let inner = ToyValue::registered(id, vec![5; 6]);
    let returned = inner.clone();
    let value = ToyValue::delegate(move |_| Ok(vec![returned.clone()]));

    let options = ResolutionOptions::new().want_strides(true).require_size(6);
    let resolution = resolver(&registry).resolve(&value, &options).unwrap();
    assert_eq!(resolution.buffer().strides(), &[3, 1]);
    assert_eq!(resolution.delegation_depth(), 1);
    assert!(resolution.anchor().ptr_eq(&inner));
}
