//! The codec family.
//!
//! A codec is a pure object compiled once per shape: it holds only its
//! static sub-codecs and is safely shared across threads. `encode_to` walks
//! a value and writes bytes through the encoder; `decode_to` reads bytes and
//! fills an addressable target in place.

mod composite;
mod primitive;
mod sequence;

pub(crate) use composite::{CustomHookCodec, FieldCodec, MapCodec, NullableCodec, RecordCodec};
pub(crate) use primitive::{
    BoolCodec, Float32Codec, Float64Codec, StringCodec, UvarintCodec, VarintCodec,
};
pub(crate) use sequence::{
    ArrayCodec, BoolSeqCodec, ByteSeqCodec, NullableSeqCodec, SeqCodec, UvarintSeqCodec,
    VarintSeqCodec,
};

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// One compiled codec node.
pub(crate) trait Codec: Send + Sync {
    /// Encode `value` through the encoder.
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()>;

    /// Decode from the decoder into the addressable `target`.
    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()>;
}

impl std::fmt::Debug for dyn Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Codec")
    }
}

/// A value did not match the shape its codec was compiled for.
pub(crate) fn mismatch(expected: &str, got: &Value) -> CodecError {
    CodecError::bad_argument(format!(
        "expected {expected} value, got {}",
        got.ty().name()
    ))
}
