//! The runtime type model.
//!
//! Rust has no runtime reflection, so the engine carries its own structural
//! descriptions. A [`Type`] is a cheaply clonable handle to one concrete
//! static shape; the scanner walks it once to compile a codec plan, and the
//! instance caches that plan keyed on handle identity.
//!
//! Identity matters: two `Type`s are equal iff they are clones of the same
//! constructed descriptor. Primitive descriptors are process-wide singletons,
//! so `Type::i32() == Type::i32()` always holds; composite constructors such
//! as [`Type::seq`] mint a fresh identity per call, so a composite descriptor
//! should be built once and reused (typically from a `static`).

use std::fmt;
use std::sync::{Arc, OnceLock};

use once_cell::sync::Lazy;

use crate::error::{BoxError, CodecError, CodecResult};
use crate::value::{
    ArrayValue, CustomValue, MapValue, NullableValue, RecordValue, SeqValue, Value,
};

/// The user-customizable marshaling capability.
///
/// Types declaring this capability bypass structural encoding entirely: the
/// engine writes whatever byte buffer [`marshal`](MarshalHooks::marshal)
/// renders (length-prefixed), and on decode hands the buffered bytes to
/// [`unmarshal`](MarshalHooks::unmarshal) to reconstruct the value.
///
/// The value underneath a custom type is whatever [`Value`] shape the hooks
/// agree on; the engine never inspects it.
pub trait MarshalHooks: Send + Sync {
    /// Render the underlying value as a byte buffer.
    fn marshal(&self, value: &Value) -> Result<Vec<u8>, BoxError>;

    /// Reconstruct the underlying value from a byte buffer.
    ///
    /// Called even for a zero-length buffer.
    fn unmarshal(&self, bytes: &[u8]) -> Result<Value, BoxError>;
}

/// A handle to one concrete static shape.
///
/// Cloning is cheap (an `Arc` bump) and equality is handle identity.
#[derive(Clone)]
pub struct Type {
    inner: Arc<Kind>,
}

/// The structural kind of a [`Type`].
pub enum Kind {
    /// Boolean.
    Bool,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,
    /// 32-bit IEEE-754 float.
    F32,
    /// 64-bit IEEE-754 float.
    F64,
    /// UTF-8 string.
    Str,
    /// Fixed-length array of the element type; the length is static and
    /// never written to the wire.
    Array(Type, usize),
    /// Variable-length sequence of the element type.
    Seq(Type),
    /// Associative map from key type to value type.
    Map(Type, Type),
    /// Nullable reference to the element type.
    Nullable(Type),
    /// Record with ordered named fields.
    Record(RecordShape),
    /// Type carrying the user-customizable marshaling capability.
    Custom(CustomShape),
    /// A shape the engine cannot serialize (channels, function values,
    /// opaque native handles). The scanner always rejects it.
    Opaque(String),
}

/// The shape of a record type: a name and an ordered field list.
///
/// The field list may be supplied after construction (see
/// [`Type::deferred_record`]), which is how self-referential shapes are
/// built.
pub struct RecordShape {
    name: String,
    fields: OnceLock<Vec<Field>>,
}

impl RecordShape {
    /// The record's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field list, or `None` if it has not been defined yet.
    pub fn fields(&self) -> Option<&[Field]> {
        self.fields.get().map(Vec::as_slice)
    }
}

/// The shape of a custom type: a name and its marshal hooks.
pub struct CustomShape {
    name: String,
    hooks: Arc<dyn MarshalHooks>,
}

impl CustomShape {
    /// The custom type's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn hooks(&self) -> &Arc<dyn MarshalHooks> {
        &self.hooks
    }
}

/// One field of a record type.
#[derive(Clone)]
pub struct Field {
    name: String,
    ty: Type,
    skip: bool,
}

impl Field {
    /// Create a field.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            skip: false,
        }
    }

    /// Create a skipped field: it occupies a slot in record values but is
    /// omitted entirely from the wire.
    pub fn skipped(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            skip: true,
        }
    }

    /// The field's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's type.
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Whether the field is omitted from the wire.
    pub fn is_skipped(&self) -> bool {
        self.skip
    }
}

static BOOL: Lazy<Type> = Lazy::new(|| Type::from_kind(Kind::Bool));
static I8: Lazy<Type> = Lazy::new(|| Type::from_kind(Kind::I8));
static I16: Lazy<Type> = Lazy::new(|| Type::from_kind(Kind::I16));
static I32: Lazy<Type> = Lazy::new(|| Type::from_kind(Kind::I32));
static I64: Lazy<Type> = Lazy::new(|| Type::from_kind(Kind::I64));
static U8: Lazy<Type> = Lazy::new(|| Type::from_kind(Kind::U8));
static U16: Lazy<Type> = Lazy::new(|| Type::from_kind(Kind::U16));
static U32: Lazy<Type> = Lazy::new(|| Type::from_kind(Kind::U32));
static U64: Lazy<Type> = Lazy::new(|| Type::from_kind(Kind::U64));
static F32: Lazy<Type> = Lazy::new(|| Type::from_kind(Kind::F32));
static F64: Lazy<Type> = Lazy::new(|| Type::from_kind(Kind::F64));
static STR: Lazy<Type> = Lazy::new(|| Type::from_kind(Kind::Str));
static BYTES: Lazy<Type> = Lazy::new(|| Type::from_kind(Kind::Seq(Type::u8())));

impl Type {
    fn from_kind(kind: Kind) -> Self {
        Self {
            inner: Arc::new(kind),
        }
    }

    /// The boolean type.
    pub fn bool() -> Type {
        BOOL.clone()
    }

    /// The signed 8-bit integer type.
    pub fn i8() -> Type {
        I8.clone()
    }

    /// The signed 16-bit integer type.
    pub fn i16() -> Type {
        I16.clone()
    }

    /// The signed 32-bit integer type.
    pub fn i32() -> Type {
        I32.clone()
    }

    /// The signed 64-bit integer type.
    pub fn i64() -> Type {
        I64.clone()
    }

    /// The unsigned 8-bit integer type.
    pub fn u8() -> Type {
        U8.clone()
    }

    /// The unsigned 16-bit integer type.
    pub fn u16() -> Type {
        U16.clone()
    }

    /// The unsigned 32-bit integer type.
    pub fn u32() -> Type {
        U32.clone()
    }

    /// The unsigned 64-bit integer type.
    pub fn u64() -> Type {
        U64.clone()
    }

    /// The 32-bit float type.
    pub fn f32() -> Type {
        F32.clone()
    }

    /// The 64-bit float type.
    pub fn f64() -> Type {
        F64.clone()
    }

    /// The UTF-8 string type.
    pub fn string() -> Type {
        STR.clone()
    }

    /// The byte sequence type.
    ///
    /// This is the `seq<u8>` singleton; its value representation is the
    /// dedicated [`Value::Bytes`] variant, copied in bulk on both sides.
    pub fn bytes() -> Type {
        BYTES.clone()
    }

    /// A variable-length sequence of `elem`.
    pub fn seq(elem: Type) -> Type {
        Self::from_kind(Kind::Seq(elem))
    }

    /// A fixed-length array of `len` elements of `elem`.
    pub fn array(elem: Type, len: usize) -> Type {
        Self::from_kind(Kind::Array(elem, len))
    }

    /// An associative map from `key` to `value`.
    pub fn map(key: Type, value: Type) -> Type {
        Self::from_kind(Kind::Map(key, value))
    }

    /// A nullable reference to `elem`.
    pub fn nullable(elem: Type) -> Type {
        Self::from_kind(Kind::Nullable(elem))
    }

    /// A record with the given name and field list.
    pub fn record(name: impl Into<String>, fields: Vec<Field>) -> Type {
        let cell = OnceLock::new();
        let _ = cell.set(fields);
        Self::from_kind(Kind::Record(RecordShape {
            name: name.into(),
            fields: cell,
        }))
    }

    /// A record whose field list is supplied later with [`Type::define`].
    ///
    /// This is how self-referential shapes are constructed:
    ///
    /// ```
    /// use shapewire_codec::{Field, Type};
    ///
    /// let node = Type::deferred_record("Node");
    /// node.define(vec![
    ///     Field::new("label", Type::string()),
    ///     Field::new("next", Type::nullable(node.clone())),
    /// ])
    /// .unwrap();
    /// ```
    pub fn deferred_record(name: impl Into<String>) -> Type {
        Self::from_kind(Kind::Record(RecordShape {
            name: name.into(),
            fields: OnceLock::new(),
        }))
    }

    /// Supply the field list of a record created with
    /// [`Type::deferred_record`].
    ///
    /// # Errors
    ///
    /// Fails if the type is not a record or if its fields are already
    /// defined.
    pub fn define(&self, fields: Vec<Field>) -> CodecResult<()> {
        match self.kind() {
            Kind::Record(shape) => shape
                .fields
                .set(fields)
                .map_err(|_| CodecError::bad_argument("record fields already defined")),
            _ => Err(CodecError::bad_argument("define requires a record type")),
        }
    }

    /// A type carrying the user-customizable marshaling capability.
    pub fn custom(name: impl Into<String>, hooks: Arc<dyn MarshalHooks>) -> Type {
        Self::from_kind(Kind::Custom(CustomShape {
            name: name.into(),
            hooks,
        }))
    }

    /// A shape the engine cannot serialize; scanning it always fails.
    pub fn opaque(name: impl Into<String>) -> Type {
        Self::from_kind(Kind::Opaque(name.into()))
    }

    /// The structural kind of this type.
    pub fn kind(&self) -> &Kind {
        &self.inner
    }

    /// A human-readable description of the type, used in diagnostics.
    pub fn name(&self) -> String {
        match self.kind() {
            Kind::Bool => "bool".to_string(),
            Kind::I8 => "i8".to_string(),
            Kind::I16 => "i16".to_string(),
            Kind::I32 => "i32".to_string(),
            Kind::I64 => "i64".to_string(),
            Kind::U8 => "u8".to_string(),
            Kind::U16 => "u16".to_string(),
            Kind::U32 => "u32".to_string(),
            Kind::U64 => "u64".to_string(),
            Kind::F32 => "f32".to_string(),
            Kind::F64 => "f64".to_string(),
            Kind::Str => "string".to_string(),
            Kind::Array(elem, len) => format!("array<{}; {}>", elem.name(), len),
            Kind::Seq(elem) => format!("seq<{}>", elem.name()),
            Kind::Map(key, value) => format!("map<{}, {}>", key.name(), value.name()),
            Kind::Nullable(elem) => format!("nullable<{}>", elem.name()),
            Kind::Record(shape) => shape.name.clone(),
            Kind::Custom(shape) => shape.name.clone(),
            Kind::Opaque(name) => format!("opaque<{name}>"),
        }
    }

    /// Manufacture a zero value of this type: a correctly shaped,
    /// addressable decode target.
    ///
    /// Zeros are `false`, `0`, `0.0`, the empty string, empty containers,
    /// null references, and records with all fields zeroed. The zero of a
    /// custom type is a placeholder the reconstruct hook replaces wholesale.
    pub fn zero_value(&self) -> Value {
        match self.kind() {
            Kind::Bool => Value::Bool(false),
            Kind::I8 => Value::I8(0),
            Kind::I16 => Value::I16(0),
            Kind::I32 => Value::I32(0),
            Kind::I64 => Value::I64(0),
            Kind::U8 => Value::U8(0),
            Kind::U16 => Value::U16(0),
            Kind::U32 => Value::U32(0),
            Kind::U64 => Value::U64(0),
            Kind::F32 => Value::F32(0.0),
            Kind::F64 => Value::F64(0.0),
            Kind::Str => Value::Str(String::new()),
            Kind::Seq(elem) if matches!(elem.kind(), Kind::U8) => Value::Bytes(Vec::new()),
            Kind::Seq(_) => Value::Seq(SeqValue {
                ty: self.clone(),
                items: Vec::new(),
            }),
            Kind::Array(elem, len) => Value::Array(ArrayValue {
                ty: self.clone(),
                items: vec![elem.zero_value(); *len],
            }),
            Kind::Map(_, _) => Value::Map(MapValue {
                ty: self.clone(),
                entries: Vec::new(),
            }),
            Kind::Nullable(_) => Value::Nullable(NullableValue {
                ty: self.clone(),
                value: None,
            }),
            Kind::Record(shape) => Value::Record(RecordValue {
                ty: self.clone(),
                fields: shape
                    .fields()
                    .map(|fields| fields.iter().map(|f| f.ty().zero_value()).collect())
                    .unwrap_or_default(),
            }),
            Kind::Custom(_) => Value::Custom(CustomValue {
                ty: self.clone(),
                inner: Box::new(Value::Bytes(Vec::new())),
            }),
            Kind::Opaque(_) => Value::Bytes(Vec::new()),
        }
    }
}

impl PartialEq for Type {
    /// Identity equality: two handles are equal iff they are clones of the
    /// same constructed descriptor.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Type {}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.name())
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("skip", &self.skip)
            .finish()
    }
}
