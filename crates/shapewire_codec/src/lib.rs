//! # Shapewire Codec
//!
//! Reflective binary serialization for dynamically described values.
//!
//! The engine inspects the structural description of a type once, compiles a
//! reusable codec plan for it, caches the plan, and executes it for every
//! subsequent value of that type. The wire format is compact and
//! self-contained: varint-encoded integers and lengths, little-endian
//! fixed-width floats, length-prefixed containers, and no schema, magic, or
//! version bytes. The decoder must be handed a target of the expected type.
//!
//! ## Usage
//!
//! ```
//! use shapewire_codec::{Field, Input, Type, Value};
//!
//! // Describe the shape once, typically in a static.
//! let point = Type::record(
//!     "Point",
//!     vec![
//!         Field::new("x", Type::i64()),
//!         Field::new("y", Type::i64()),
//!     ],
//! );
//!
//! // Encode a value of that shape.
//! let value = Value::record(&point, vec![3i64.into(), (-4i64).into()]);
//! let bytes = shapewire_codec::to_bytes(&value).unwrap();
//!
//! // Decode into a zeroed target of the same shape.
//! let mut decoded = point.zero_value();
//! shapewire_codec::decode(Input::Buffer(&bytes), &mut decoded).unwrap();
//! assert_eq!(decoded, value);
//! ```
//!
//! ## Guarantees
//!
//! - Encoding is deterministic: the same value always yields the same bytes
//!   (maps iterate in insertion order).
//! - Decode followed by encode reproduces the original bytes for all types
//!   not containing maps.
//! - Codec plans are immutable after compilation and shared across threads;
//!   the schema cache is lock-protected with FIFO eviction.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod decoder;
mod encoder;
mod error;
mod instance;
mod message;
mod scanner;
mod types;
mod value;

pub use error::{BoxError, CodecError, CodecResult};
pub use instance::{Input, Instance, LogCallback, Output};
pub use message::{Message, MSG_ERROR, MSG_EVENT, MSG_REQUEST, MSG_RESPONSE};
pub use types::{CustomShape, Field, Kind, MarshalHooks, RecordShape, Type};
pub use value::{
    ArrayValue, CustomValue, MapValue, NullableValue, RecordValue, SeqValue, Value,
};

/// Encode `value` into the given output through the process-wide instance.
///
/// A [`Output::Buffer`] sink is replaced wholesale (and pre-grown); a
/// [`Output::Stream`] sink receives every primitive write directly.
///
/// # Errors
///
/// Fails if the value's type cannot be scanned, the value does not match
/// its type, or the underlying writer fails.
pub fn encode(value: &Value, output: Output<'_>) -> CodecResult<()> {
    instance::global().encode(value, output)
}

/// Decode from the given input into `target` through the process-wide
/// instance.
///
/// The target supplies the expected type; build one with
/// [`Type::zero_value`].
///
/// # Errors
///
/// Fails if the target's type cannot be scanned, the input ends mid-item,
/// or the underlying reader fails.
pub fn decode(input: Input<'_>, target: &mut Value) -> CodecResult<()> {
    instance::global().decode(input, target)
}

/// Encode `value` to a fresh byte vector through the process-wide instance.
///
/// # Errors
///
/// Fails if the underlying encode fails.
pub fn to_bytes(value: &Value) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    encode(value, Output::Buffer(&mut out))?;
    Ok(out)
}

/// Install or remove the diagnostics callback on the process-wide instance.
/// `None` disables logging.
pub fn set_log(callback: Option<LogCallback>) {
    instance::global().set_log(callback);
}
