//! Sequence and array codecs.
//!
//! Sequences of primitive scalars get dedicated codecs that loop over the
//! elements directly instead of dispatching through a child codec per
//! element; only the generic sequence pays per-element virtual dispatch.

use std::sync::Arc;

use super::{mismatch, Codec};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::CodecResult;
use crate::types::{Kind, Type};
use crate::value::{NullableValue, Value};

/// `varint(length) || bytes`, copied in bulk on both sides.
pub(crate) struct ByteSeqCodec;

impl Codec for ByteSeqCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        match value {
            Value::Bytes(bytes) => {
                e.write_uvarint(bytes.len() as u64);
                e.write(bytes);
                Ok(())
            }
            other => Err(mismatch("byte sequence", other)),
        }
    }

    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let len = d.read_uvarint()? as usize;
        let data = d.read_slice(len)?.to_vec();
        match target {
            Value::Bytes(slot) => {
                *slot = data;
                Ok(())
            }
            other => Err(mismatch("byte sequence", other)),
        }
    }
}

/// `varint(length) || length bytes`, one byte per boolean.
pub(crate) struct BoolSeqCodec;

impl Codec for BoolSeqCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        let items = match value {
            Value::Seq(seq) => &seq.items,
            other => return Err(mismatch("boolean sequence", other)),
        };
        e.write_uvarint(items.len() as u64);
        for item in items {
            match item {
                Value::Bool(b) => e.write_bool(*b),
                other => return Err(mismatch("bool", other)),
            }
        }
        Ok(())
    }

    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let len = d.read_uvarint()? as usize;
        let bytes = d.read_slice(len)?;
        let items = bytes.iter().map(|b| Value::Bool(*b != 0)).collect();
        match target {
            Value::Seq(seq) => {
                seq.items = items;
                Ok(())
            }
            other => Err(mismatch("boolean sequence", other)),
        }
    }
}

/// `varint(length) || length varints`, ZigZag per element.
pub(crate) struct VarintSeqCodec {
    pub(crate) elem_ty: Type,
}

impl Codec for VarintSeqCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        let items = match value {
            Value::Seq(seq) => &seq.items,
            other => return Err(mismatch("signed integer sequence", other)),
        };
        e.write_uvarint(items.len() as u64);
        for item in items {
            match item.as_i64() {
                Some(v) => e.write_varint(v),
                None => return Err(mismatch("signed integer", item)),
            }
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let len = d.read_uvarint()? as usize;
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            let v = d.read_varint()?;
            items.push(match self.elem_ty.kind() {
                Kind::I8 => Value::I8(v as i8),
                Kind::I16 => Value::I16(v as i16),
                Kind::I32 => Value::I32(v as i32),
                _ => Value::I64(v),
            });
        }
        match target {
            Value::Seq(seq) => {
                seq.items = items;
                Ok(())
            }
            other => Err(mismatch("signed integer sequence", other)),
        }
    }
}

/// `varint(length) || length varints`, base-128 per element.
pub(crate) struct UvarintSeqCodec {
    pub(crate) elem_ty: Type,
}

impl Codec for UvarintSeqCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        let items = match value {
            Value::Seq(seq) => &seq.items,
            other => return Err(mismatch("unsigned integer sequence", other)),
        };
        e.write_uvarint(items.len() as u64);
        for item in items {
            match item.as_u64() {
                Some(v) => e.write_uvarint(v),
                None => return Err(mismatch("unsigned integer", item)),
            }
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let len = d.read_uvarint()? as usize;
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            let v = d.read_uvarint()?;
            items.push(match self.elem_ty.kind() {
                Kind::U16 => Value::U16(v as u16),
                Kind::U32 => Value::U32(v as u32),
                _ => Value::U64(v),
            });
        }
        match target {
            Value::Seq(seq) => {
                seq.items = items;
                Ok(())
            }
            other => Err(mismatch("unsigned integer sequence", other)),
        }
    }
}

/// `varint(length) || length × element codec`.
pub(crate) struct SeqCodec {
    pub(crate) elem_ty: Type,
    pub(crate) elem: Arc<dyn Codec>,
}

impl Codec for SeqCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        let items = match value {
            Value::Seq(seq) => &seq.items,
            other => return Err(mismatch("sequence", other)),
        };
        e.write_uvarint(items.len() as u64);
        for item in items {
            self.elem.encode_to(e, item)?;
            if e.failed() {
                break;
            }
        }
        Ok(())
    }

    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let len = d.read_uvarint()? as usize;
        // Allocate every slot first, then fill in order.
        let mut items = vec![self.elem_ty.zero_value(); len];
        for item in &mut items {
            self.elem.decode_to(d, item)?;
        }
        match target {
            Value::Seq(seq) => {
                seq.items = items;
                Ok(())
            }
            other => Err(mismatch("sequence", other)),
        }
    }
}

/// Sequence of nullable references: `varint(length)`, then per element a
/// one-byte null flag (`1` = null) followed by the element bytes when
/// present.
pub(crate) struct NullableSeqCodec {
    pub(crate) nullable_ty: Type,
    pub(crate) elem_ty: Type,
    pub(crate) elem: Arc<dyn Codec>,
}

impl Codec for NullableSeqCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        let items = match value {
            Value::Seq(seq) => &seq.items,
            other => return Err(mismatch("nullable sequence", other)),
        };
        e.write_uvarint(items.len() as u64);
        for item in items {
            let nullable = match item {
                Value::Nullable(n) => n,
                other => return Err(mismatch("nullable reference", other)),
            };
            match &nullable.value {
                None => e.write_bool(true),
                Some(inner) => {
                    e.write_bool(false);
                    self.elem.encode_to(e, inner)?;
                }
            }
            if e.failed() {
                break;
            }
        }
        Ok(())
    }

    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let len = d.read_uvarint()? as usize;
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            let is_nil = d.read_bool()?;
            let value = if is_nil {
                None
            } else {
                let mut fresh = self.elem_ty.zero_value();
                self.elem.decode_to(d, &mut fresh)?;
                Some(Box::new(fresh))
            };
            items.push(Value::Nullable(NullableValue {
                ty: self.nullable_ty.clone(),
                value,
            }));
        }
        match target {
            Value::Seq(seq) => {
                seq.items = items;
                Ok(())
            }
            other => Err(mismatch("nullable sequence", other)),
        }
    }
}

/// Fixed-length array: the elements back to back, no length prefix.
pub(crate) struct ArrayCodec {
    pub(crate) elem: Arc<dyn Codec>,
}

impl Codec for ArrayCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        let items = match value {
            Value::Array(arr) => &arr.items,
            other => return Err(mismatch("array", other)),
        };
        for item in items {
            self.elem.encode_to(e, item)?;
            if e.failed() {
                break;
            }
        }
        Ok(())
    }

    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let items = match target {
            Value::Array(arr) => &mut arr.items,
            other => return Err(mismatch("array", other)),
        };
        // The element count is static; the target supplies it.
        for item in items.iter_mut() {
            self.elem.decode_to(d, item)?;
        }
        Ok(())
    }
}
