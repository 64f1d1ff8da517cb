//! Primitive codecs: one scalar per wire item.

use super::{mismatch, Codec};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::CodecResult;
use crate::value::Value;

/// One byte: `0x00` false, `0x01` true; any non-zero byte decodes as true.
pub(crate) struct BoolCodec;

impl Codec for BoolCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        match value {
            Value::Bool(b) => {
                e.write_bool(*b);
                Ok(())
            }
            other => Err(mismatch("bool", other)),
        }
    }

    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let v = d.read_bool()?;
        match target {
            Value::Bool(slot) => {
                *slot = v;
                Ok(())
            }
            other => Err(mismatch("bool", other)),
        }
    }
}

/// ZigZag-transformed varint, shared by every signed width.
pub(crate) struct VarintCodec;

impl Codec for VarintCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        match value.as_i64() {
            Some(v) => {
                e.write_varint(v);
                Ok(())
            }
            None => Err(mismatch("signed integer", value)),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let v = d.read_varint()?;
        match target {
            Value::I8(slot) => *slot = v as i8,
            Value::I16(slot) => *slot = v as i16,
            Value::I32(slot) => *slot = v as i32,
            Value::I64(slot) => *slot = v,
            other => return Err(mismatch("signed integer", other)),
        }
        Ok(())
    }
}

/// Base-128 varint, shared by every unsigned width.
pub(crate) struct UvarintCodec;

impl Codec for UvarintCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        match value.as_u64() {
            Some(v) => {
                e.write_uvarint(v);
                Ok(())
            }
            None => Err(mismatch("unsigned integer", value)),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let v = d.read_uvarint()?;
        match target {
            Value::U8(slot) => *slot = v as u8,
            Value::U16(slot) => *slot = v as u16,
            Value::U32(slot) => *slot = v as u32,
            Value::U64(slot) => *slot = v,
            other => return Err(mismatch("unsigned integer", other)),
        }
        Ok(())
    }
}

/// Raw IEEE-754 bit pattern, little-endian, 4 bytes.
pub(crate) struct Float32Codec;

impl Codec for Float32Codec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        match value {
            Value::F32(v) => {
                e.write_f32(*v);
                Ok(())
            }
            other => Err(mismatch("f32", other)),
        }
    }

    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let v = d.read_f32()?;
        match target {
            Value::F32(slot) => {
                *slot = v;
                Ok(())
            }
            other => Err(mismatch("f32", other)),
        }
    }
}

/// Raw IEEE-754 bit pattern, little-endian, 8 bytes.
pub(crate) struct Float64Codec;

impl Codec for Float64Codec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        match value {
            Value::F64(v) => {
                e.write_f64(*v);
                Ok(())
            }
            other => Err(mismatch("f64", other)),
        }
    }

    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let v = d.read_f64()?;
        match target {
            Value::F64(slot) => {
                *slot = v;
                Ok(())
            }
            other => Err(mismatch("f64", other)),
        }
    }
}

/// Varint byte length followed by the raw bytes.
pub(crate) struct StringCodec;

impl Codec for StringCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        match value {
            Value::Str(s) => {
                e.write_string(s);
                Ok(())
            }
            other => Err(mismatch("string", other)),
        }
    }

    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let s = d.read_string()?;
        match target {
            Value::Str(slot) => {
                *slot = s;
                Ok(())
            }
            other => Err(mismatch("string", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecoderCore;
    use crate::encoder::EncoderCore;

    fn roundtrip(codec: &dyn Codec, value: &Value, mut target: Value) -> (Vec<u8>, Value) {
        let mut bytes = Vec::new();
        let mut e = Encoder::new(&mut bytes, EncoderCore::default());
        codec.encode_to(&mut e, value).unwrap();
        let (_, err) = e.finish();
        assert!(err.is_none());

        let mut d = Decoder::over_slice(&bytes, DecoderCore::default());
        codec.decode_to(&mut d, &mut target).unwrap();
        (bytes, target)
    }

    #[test]
    fn bool_wire_is_one_byte() {
        let (bytes, decoded) = roundtrip(&BoolCodec, &Value::Bool(true), Value::Bool(false));
        assert_eq!(bytes, vec![0x01]);
        assert_eq!(decoded, Value::Bool(true));
    }

    #[test]
    fn varint_narrows_into_the_target_width() {
        let (bytes, decoded) = roundtrip(&VarintCodec, &Value::I16(-3), Value::I16(0));
        assert_eq!(bytes, vec![0x05]);
        assert_eq!(decoded, Value::I16(-3));
    }

    #[test]
    fn uvarint_narrows_into_the_target_width() {
        let (bytes, decoded) = roundtrip(&UvarintCodec, &Value::U32(300), Value::U32(0));
        assert_eq!(bytes, vec![0xac, 0x02]);
        assert_eq!(decoded, Value::U32(300));
    }

    #[test]
    fn floats_roundtrip_bit_exact() {
        let (_, decoded) = roundtrip(&Float64Codec, &Value::F64(-0.0), Value::F64(1.0));
        match decoded {
            Value::F64(v) => assert_eq!(v.to_bits(), (-0.0f64).to_bits()),
            other => panic!("expected f64, got {other:?}"),
        }
    }

    #[test]
    fn string_roundtrip() {
        let (bytes, decoded) = roundtrip(
            &StringCodec,
            &Value::Str("Roman".to_string()),
            Value::Str(String::new()),
        );
        assert_eq!(bytes, vec![0x05, b'R', b'o', b'm', b'a', b'n']);
        assert_eq!(decoded, Value::Str("Roman".to_string()));
    }

    #[test]
    fn type_mismatch_is_a_bad_argument() {
        let mut bytes = Vec::new();
        let mut e = Encoder::new(&mut bytes, EncoderCore::default());
        let err = BoolCodec.encode_to(&mut e, &Value::I32(1)).unwrap_err();
        assert!(matches!(err, crate::error::CodecError::BadArgument { .. }));
    }
}
