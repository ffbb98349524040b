//! A minimal host value space for tests.
//!
//! `ToyValue` models the values of a dynamic runtime: `nil`, numbers, strings,
//! tables and "userdata" objects that own a storage block and may carry a
//! capability descriptor. Values are reference counted and never resized, so
//! every byte view handed out stays put for as long as any clone of the value is
//! alive. Strings are read-only; userdata storage is writable by native code.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use bytereader_common::error::StdErrorBoxed;
use bytereader_common_traits::{
    ByteCell, Capability, HostSlot, HostValue, MemoryOwner, NativeArrayHeader, ProviderId,
    ShapeKind,
};

use crate::data_gen::ForeignBuffer;

/// Delegation routine of a toy value.
pub type ToyDelegate = Rc<dyn Fn(&ToyValue) -> Result<Vec<ToyValue>, StdErrorBoxed>>;

#[derive(Clone)]
pub struct ToyValue(Rc<Object>);

struct Object {
    kind: Kind,
    capability: Option<Descriptor>,
}

enum Kind {
    Nil,
    Number(f64),
    String(Box<[u8]>),
    Table,
    Userdata {
        block: ByteCell,
        array: Option<ByteCell>,
        foreign: Option<ForeignBuffer>,
    },
}

#[derive(Clone)]
enum Descriptor {
    Forbidden,
    Shape(ShapeKind),
    Delegate(ToyDelegate),
    Registered(ProviderId),
    Raw(i64),
}

impl ToyValue {
    fn from_parts(kind: Kind, capability: Option<Descriptor>) -> ToyValue {
        ToyValue(Rc::new(Object { kind, capability }))
    }

    fn userdata_with(block: Vec<u8>, capability: Option<Descriptor>) -> ToyValue {
        ToyValue::from_parts(
            Kind::Userdata {
                block: ByteCell::new(block),
                array: None,
                foreign: None,
            },
            capability,
        )
    }

    pub fn nil() -> ToyValue {
        ToyValue::from_parts(Kind::Nil, None)
    }

    pub fn number(n: f64) -> ToyValue {
        ToyValue::from_parts(Kind::Number(n), None)
    }

    pub fn string(s: impl AsRef<[u8]>) -> ToyValue {
        ToyValue::from_parts(Kind::String(s.as_ref().into()), None)
    }

    /// A userdata object with a storage block and no capability descriptor.
    pub fn userdata(block: Vec<u8>) -> ToyValue {
        ToyValue::userdata_with(block, None)
    }

    /// A userdata object whose bytes are its own block, starting at `offset`.
    pub fn raw_block(block: Vec<u8>, offset: i64) -> ToyValue {
        ToyValue::userdata_with(block, Some(Descriptor::Raw(offset)))
    }

    /// A userdata object owning a dynamically sized byte array.
    pub fn inline_array(array: Vec<u8>) -> ToyValue {
        ToyValue::from_parts(
            Kind::Userdata {
                block: ByteCell::zeroed(0),
                array: Some(ByteCell::new(array)),
                foreign: None,
            },
            Some(Descriptor::Shape(ShapeKind::InlineArray)),
        )
    }

    /// A userdata object whose block holds a header pointing at `foreign`.
    ///
    /// The value keeps the foreign buffer alive.
    pub fn native_array(foreign: &ForeignBuffer) -> ToyValue {
        let header = NativeArrayHeader::for_region(foreign.region());
        ToyValue::from_parts(
            Kind::Userdata {
                block: ByteCell::new(header.as_bytes().to_vec()),
                array: None,
                foreign: Some(foreign.clone()),
            },
            Some(Descriptor::Shape(ShapeKind::NativeArray)),
        )
    }

    /// A userdata object of native-array shape with an arbitrary block, for
    /// exercising malformed headers.
    pub fn native_array_block(block: Vec<u8>) -> ToyValue {
        ToyValue::userdata_with(block, Some(Descriptor::Shape(ShapeKind::NativeArray)))
    }

    /// A table carrying a raw-offset descriptor. Tables have no storage block, so
    /// the descriptor cannot be honored.
    pub fn raw_table(offset: i64) -> ToyValue {
        ToyValue::from_parts(Kind::Table, Some(Descriptor::Raw(offset)))
    }

    /// A userdata object that opts out of byte access.
    pub fn forbidden() -> ToyValue {
        ToyValue::userdata_with(Vec::new(), Some(Descriptor::Forbidden))
    }

    /// A userdata object whose bytes are those of the value `delegate` returns.
    pub fn delegate(
        delegate: impl Fn(&ToyValue) -> Result<Vec<ToyValue>, StdErrorBoxed> + 'static,
    ) -> ToyValue {
        ToyValue::userdata_with(Vec::new(), Some(Descriptor::Delegate(Rc::new(delegate))))
    }

    /// A userdata object whose bytes are extracted by the provider `id`.
    pub fn registered(id: ProviderId, block: Vec<u8>) -> ToyValue {
        ToyValue::userdata_with(block, Some(Descriptor::Registered(id)))
    }

    /// Returns `true` if both handles refer to the same object.
    pub fn ptr_eq(&self, other: &ToyValue) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Copies the current contents of the userdata block.
    pub fn block_contents(&self) -> Option<Vec<u8>> {
        match &self.0.kind {
            Kind::Userdata { block, .. } => Some(block.to_vec()),
            _ => None,
        }
    }

    /// Copies the current contents of the inline array.
    pub fn array_contents(&self) -> Option<Vec<u8>> {
        match &self.0.kind {
            Kind::Userdata {
                array: Some(array), ..
            } => Some(array.to_vec()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.0.kind {
            Kind::Number(n) => Some(n),
            _ => None,
        }
    }
}

unsafe impl HostValue for ToyValue {
    type Callable = ToyDelegate;

    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(match self.0.kind {
            Kind::Nil => "nil",
            Kind::Number(_) => "number",
            Kind::String(_) => "string",
            Kind::Table => "table",
            Kind::Userdata { .. } => "userdata",
        })
    }

    fn as_sequence(&self) -> Option<&[u8]> {
        match &self.0.kind {
            Kind::String(bytes) => Some(bytes),
            _ => None,
        }
    }

    fn capability(&self) -> Option<Capability<Self>> {
        Some(match self.0.capability.as_ref()? {
            Descriptor::Forbidden => Capability::Forbidden,
            Descriptor::Shape(shape) => Capability::Shape(*shape),
            Descriptor::Delegate(delegate) => Capability::Delegate(delegate.clone()),
            Descriptor::Registered(id) => Capability::Registered(*id),
            Descriptor::Raw(offset) => Capability::Raw { offset: *offset },
        })
    }

    fn block(&self) -> Option<&dyn MemoryOwner> {
        match &self.0.kind {
            Kind::Userdata { block, .. } => Some(block),
            _ => None,
        }
    }

    fn inline_array(&self) -> Option<&dyn MemoryOwner> {
        match &self.0.kind {
            Kind::Userdata {
                array: Some(array), ..
            } => Some(array),
            _ => None,
        }
    }

    fn call_delegate(&self, delegate: &ToyDelegate) -> Result<Vec<Self>, StdErrorBoxed> {
        delegate(self)
    }
}

impl fmt::Debug for ToyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            Kind::Nil => f.write_str("nil"),
            Kind::Number(n) => write!(f, "{n}"),
            Kind::String(bytes) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            Kind::Table => f.write_str("table"),
            Kind::Userdata { block, foreign, .. } => f
                .debug_struct("userdata")
                .field("block_len", &block.len())
                .field("foreign_len", &foreign.as_ref().map(ForeignBuffer::len))
                .field(
                    "capability",
                    &self.capability().as_ref().map(Capability::name),
                )
                .finish(),
        }
    }
}

/// A value stack with 1-based positions, like the argument stack of a
/// scripting runtime.
#[derive(Debug, Default)]
pub struct ToyStack {
    values: Vec<ToyValue>,
}

impl ToyStack {
    pub fn new() -> ToyStack {
        ToyStack::default()
    }

    /// Pushes `value` and returns its position.
    pub fn push(&mut self, value: ToyValue) -> i64 {
        self.values.push(value);
        self.values.len() as i64
    }

    /// Returns the value at `position`.
    ///
    /// Panics if the position is out of range.
    pub fn get(&self, position: i64) -> &ToyValue {
        &self.values[Self::index(position)]
    }

    /// Returns the writable slot at `position`.
    pub fn slot(&mut self, position: i64) -> StackSlot<'_> {
        assert!(Self::index(position) < self.values.len());
        StackSlot {
            stack: self,
            position,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn index(position: i64) -> usize {
        assert!(position >= 1, "stack positions start at 1");
        (position - 1) as usize
    }
}

/// A position on a [`ToyStack`].
pub struct StackSlot<'a> {
    stack: &'a mut ToyStack,
    position: i64,
}

impl HostSlot for StackSlot<'_> {
    type Value = ToyValue;

    fn value(&self) -> &ToyValue {
        self.stack.get(self.position)
    }

    fn assign(&mut self, value: ToyValue) {
        self.stack.values[ToyStack::index(self.position)] = value;
    }

    fn position(&self) -> Option<i64> {
        Some(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(ToyValue::nil().type_name(), "nil");
        assert_eq!(ToyValue::number(1.5).type_name(), "number");
        assert_eq!(ToyValue::string("x").type_name(), "string");
        assert_eq!(ToyValue::forbidden().type_name(), "userdata");
        assert_eq!(ToyValue::raw_table(0).type_name(), "table");
        assert!(ToyValue::raw_table(0).block().is_none());
    }

    #[test]
    fn test_userdata_storage_is_writable() {
        let value = ToyValue::inline_array(vec![0; 4]);
        let array = value.inline_array().unwrap();
        assert!(array.is_writable());
        unsafe { array.memory().ptr.cast_mut().write(5) };
        assert_eq!(value.array_contents().unwrap(), vec![5, 0, 0, 0]);
        assert!(value.block().unwrap().is_writable());
    }

    #[test]
    fn test_clones_share_storage() {
        let value = ToyValue::raw_block(vec![1, 2, 3], 0);
        let clone = value.clone();
        assert!(value.ptr_eq(&clone));
        assert_eq!(
            value.block().unwrap().memory(),
            clone.block().unwrap().memory()
        );
        assert!(!value.ptr_eq(&ToyValue::raw_block(vec![1, 2, 3], 0)));
    }

    #[test]
    fn test_capabilities() {
        assert!(ToyValue::string("x").capability().is_none());
        assert!(ToyValue::userdata(vec![1]).capability().is_none());
        assert!(matches!(
            ToyValue::forbidden().capability(),
            Some(Capability::Forbidden)
        ));
        assert!(matches!(
            ToyValue::raw_block(vec![], 3).capability(),
            Some(Capability::Raw { offset: 3 })
        ));

        let inner = ToyValue::string("inner");
        let returned = inner.clone();
        let value = ToyValue::delegate(move |_| Ok(vec![returned.clone()]));
        let Some(Capability::Delegate(delegate)) = value.capability() else {
            panic!("expected a delegate");
        };
        let results = value.call_delegate(&delegate).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].ptr_eq(&inner));
    }

    #[test]
    fn test_native_array_keeps_foreign_buffer_alive() {
        let value = {
            let foreign = ForeignBuffer::filled(12, 7);
            ToyValue::native_array(&foreign)
        };
        let header = NativeArrayHeader::read_from(&value.block_contents().unwrap()).unwrap();
        let region = header.region().unwrap();
        assert_eq!(unsafe { region.as_slice() }, &[7; 12]);
    }

    #[test]
    fn test_stack_slots() {
        let mut stack = ToyStack::new();
        assert_eq!(stack.push(ToyValue::nil()), 1);
        assert_eq!(stack.push(ToyValue::number(2.0)), 2);

        let mut slot = stack.slot(2);
        assert_eq!(slot.position(), Some(2));
        assert_eq!(slot.value().as_number(), Some(2.0));
        slot.assign(ToyValue::string("two"));
        assert_eq!(stack.get(2).as_sequence(), Some(&b"two"[..]));
        assert_eq!(stack.len(), 2);
    }
}
