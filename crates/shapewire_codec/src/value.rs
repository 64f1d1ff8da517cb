//! Dynamic values.
//!
//! A [`Value`] is the runtime representation of anything the engine can
//! serialize. Container, record, and custom values embed the [`Type`] they
//! were built against, which is what lets the engine recover the full type
//! of any value (and thus its cached codec) from the value alone.

use crate::types::{Kind, Type};

/// A dynamic value.
///
/// Equality follows structure, except that embedded [`Type`] handles compare
/// by identity: two values built against structurally identical but
/// separately constructed composite types are not equal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Signed 8-bit integer.
    I8(i8),
    /// Signed 16-bit integer.
    I16(i16),
    /// Signed 32-bit integer.
    I32(i32),
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 8-bit integer.
    U8(u8),
    /// Unsigned 16-bit integer.
    U16(u16),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
    /// UTF-8 string.
    Str(String),
    /// Byte sequence (the value form of [`Type::bytes`]).
    Bytes(Vec<u8>),
    /// Variable-length sequence.
    Seq(SeqValue),
    /// Fixed-length array.
    Array(ArrayValue),
    /// Associative map, in insertion order.
    Map(MapValue),
    /// Nullable reference.
    Nullable(NullableValue),
    /// Record with ordered fields.
    Record(RecordValue),
    /// Value of a type carrying the custom marshaling capability.
    Custom(CustomValue),
}

/// A variable-length sequence value.
#[derive(Debug, Clone, PartialEq)]
pub struct SeqValue {
    pub(crate) ty: Type,
    pub(crate) items: Vec<Value>,
}

impl SeqValue {
    /// The elements.
    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

/// A fixed-length array value.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub(crate) ty: Type,
    pub(crate) items: Vec<Value>,
}

impl ArrayValue {
    /// The elements.
    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

/// An associative map value. Entries keep their insertion order, which is
/// also the order they are written to the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct MapValue {
    pub(crate) ty: Type,
    pub(crate) entries: Vec<(Value, Value)>,
}

impl MapValue {
    /// The entries, in insertion order.
    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// A nullable reference value.
#[derive(Debug, Clone, PartialEq)]
pub struct NullableValue {
    pub(crate) ty: Type,
    pub(crate) value: Option<Box<Value>>,
}

impl NullableValue {
    /// The referent, if present.
    pub fn get(&self) -> Option<&Value> {
        self.value.as_deref()
    }
}

/// A record value: one slot per declared field, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    pub(crate) ty: Type,
    pub(crate) fields: Vec<Value>,
}

impl RecordValue {
    /// The field slots, in declaration order.
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// Look up a field slot by declared name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self.ty.kind() {
            Kind::Record(shape) => {
                let index = shape
                    .fields()?
                    .iter()
                    .position(|field| field.name() == name)?;
                self.fields.get(index)
            }
            _ => None,
        }
    }
}

/// A value of a custom type. The engine never inspects `inner`; the type's
/// marshal hooks own its interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomValue {
    pub(crate) ty: Type,
    pub(crate) inner: Box<Value>,
}

impl CustomValue {
    /// The underlying value the hooks operate on.
    pub fn inner(&self) -> &Value {
        &self.inner
    }
}

impl Value {
    /// A sequence value of the given sequence type.
    pub fn seq(ty: &Type, items: Vec<Value>) -> Value {
        Value::Seq(SeqValue {
            ty: ty.clone(),
            items,
        })
    }

    /// An array value of the given array type.
    pub fn array(ty: &Type, items: Vec<Value>) -> Value {
        Value::Array(ArrayValue {
            ty: ty.clone(),
            items,
        })
    }

    /// A map value of the given map type, entries in insertion order.
    pub fn map(ty: &Type, entries: Vec<(Value, Value)>) -> Value {
        Value::Map(MapValue {
            ty: ty.clone(),
            entries,
        })
    }

    /// A null reference of the given nullable type.
    pub fn null(ty: &Type) -> Value {
        Value::Nullable(NullableValue {
            ty: ty.clone(),
            value: None,
        })
    }

    /// A present reference of the given nullable type.
    pub fn some(ty: &Type, value: Value) -> Value {
        Value::Nullable(NullableValue {
            ty: ty.clone(),
            value: Some(Box::new(value)),
        })
    }

    /// A record value of the given record type, one slot per declared field.
    pub fn record(ty: &Type, fields: Vec<Value>) -> Value {
        Value::Record(RecordValue {
            ty: ty.clone(),
            fields,
        })
    }

    /// A custom value of the given custom type.
    pub fn custom(ty: &Type, inner: Value) -> Value {
        Value::Custom(CustomValue {
            ty: ty.clone(),
            inner: Box::new(inner),
        })
    }

    /// The type of this value.
    ///
    /// Primitives resolve to the process-wide singletons; composites return
    /// the handle they were built against.
    pub fn ty(&self) -> Type {
        match self {
            Value::Bool(_) => Type::bool(),
            Value::I8(_) => Type::i8(),
            Value::I16(_) => Type::i16(),
            Value::I32(_) => Type::i32(),
            Value::I64(_) => Type::i64(),
            Value::U8(_) => Type::u8(),
            Value::U16(_) => Type::u16(),
            Value::U32(_) => Type::u32(),
            Value::U64(_) => Type::u64(),
            Value::F32(_) => Type::f32(),
            Value::F64(_) => Type::f64(),
            Value::Str(_) => Type::string(),
            Value::Bytes(_) => Type::bytes(),
            Value::Seq(v) => v.ty.clone(),
            Value::Array(v) => v.ty.clone(),
            Value::Map(v) => v.ty.clone(),
            Value::Nullable(v) => v.ty.clone(),
            Value::Record(v) => v.ty.clone(),
            Value::Custom(v) => v.ty.clone(),
        }
    }

    /// Whether this value is a null reference.
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Value::Nullable(NullableValue { value: None, .. })
        )
    }

    /// This value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// This value as a signed integer, folding all signed widths.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(v) => Some(i64::from(*v)),
            Value::I16(v) => Some(i64::from(*v)),
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// This value as an unsigned integer, folding all unsigned widths.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U8(v) => Some(u64::from(*v)),
            Value::U16(v) => Some(u64::from(*v)),
            Value::U32(v) => Some(u64::from(*v)),
            Value::U64(v) => Some(*v),
            _ => None,
        }
    }

    /// This value as a 64-bit float, if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// This value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// This value as a byte slice, if it is a byte sequence.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The elements, if this is a sequence or array.
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(v) => Some(&v.items),
            Value::Array(v) => Some(&v.items),
            _ => None,
        }
    }

    /// The entries, if this is a map.
    pub fn as_entries(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(v) => Some(&v.entries),
            _ => None,
        }
    }

    /// The referent, if this is a present nullable reference.
    pub fn as_referent(&self) -> Option<&Value> {
        match self {
            Value::Nullable(v) => v.get(),
            _ => None,
        }
    }

    /// Look up a record field slot by declared name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(record) => record.field(name),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::I8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::U16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}
