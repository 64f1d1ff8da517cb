//! Composite codecs: maps, nullable references, records, and the custom
//! marshaling hook bridge.

use std::sync::Arc;

use super::{mismatch, Codec};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{CodecError, CodecResult};
use crate::types::{Kind, MarshalHooks, Type};
use crate::value::Value;

/// `varint(entry_count) || entry_count × (key bytes || value bytes)`.
///
/// Entries are written in the map's insertion order, so byte-level
/// round-trip is only guaranteed for a given value, not for logically equal
/// maps built in different orders.
pub(crate) struct MapCodec {
    pub(crate) key_ty: Type,
    pub(crate) value_ty: Type,
    pub(crate) key: Arc<dyn Codec>,
    pub(crate) value: Arc<dyn Codec>,
}

impl Codec for MapCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        let entries = match value {
            Value::Map(map) => &map.entries,
            other => return Err(mismatch("map", other)),
        };
        e.write_uvarint(entries.len() as u64);
        for (k, v) in entries {
            self.key.encode_to(e, k)?;
            self.value.encode_to(e, v)?;
            if e.failed() {
                break;
            }
        }
        Ok(())
    }

    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let count = d.read_uvarint()? as usize;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let mut key = self.key_ty.zero_value();
            self.key.decode_to(d, &mut key)?;
            let mut value = self.value_ty.zero_value();
            self.value.decode_to(d, &mut value)?;
            entries.push((key, value));
        }
        match target {
            Value::Map(map) => {
                map.entries = entries;
                Ok(())
            }
            other => Err(mismatch("map", other)),
        }
    }
}

/// One-byte null flag (`1` = null), then the referent bytes when present.
pub(crate) struct NullableCodec {
    pub(crate) elem_ty: Type,
    pub(crate) elem: Arc<dyn Codec>,
}

impl Codec for NullableCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        let nullable = match value {
            Value::Nullable(n) => n,
            other => return Err(mismatch("nullable reference", other)),
        };
        match &nullable.value {
            None => {
                e.write_bool(true);
                Ok(())
            }
            Some(inner) => {
                e.write_bool(false);
                self.elem.encode_to(e, inner)
            }
        }
    }

    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let is_nil = d.read_bool()?;
        let nullable = match target {
            Value::Nullable(n) => n,
            other => return Err(mismatch("nullable reference", other)),
        };
        if is_nil {
            nullable.value = None;
            return Ok(());
        }
        let slot = nullable
            .value
            .get_or_insert_with(|| Box::new(self.elem_ty.zero_value()));
        self.elem.decode_to(d, slot)
    }
}

/// Fields back to back in declaration order, each through its own codec.
/// Skipped fields occupy no bytes.
pub(crate) struct RecordCodec {
    pub(crate) fields: Vec<FieldCodec>,
}

/// A precomputed field descriptor: the declared slot index and the codec
/// compiled for the field's type.
pub(crate) struct FieldCodec {
    pub(crate) index: usize,
    pub(crate) codec: Arc<dyn Codec>,
}

impl Codec for RecordCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        let record = match value {
            Value::Record(r) => r,
            other => return Err(mismatch("record", other)),
        };
        for field in &self.fields {
            let slot = record.fields.get(field.index).ok_or_else(|| {
                CodecError::bad_argument(format!("record value missing field {}", field.index))
            })?;
            field.codec.encode_to(e, slot)?;
            if e.failed() {
                break;
            }
        }
        Ok(())
    }

    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let record = match target {
            Value::Record(r) => r,
            other => return Err(mismatch("record", other)),
        };
        for field in &self.fields {
            let slot = record.fields.get_mut(field.index).ok_or_else(|| {
                CodecError::bad_argument(format!("record target missing field {}", field.index))
            })?;
            field.codec.decode_to(d, slot)?;
        }
        Ok(())
    }
}

/// Bridge to the user-customizable marshaling capability.
///
/// Encode renders the value through the marshal hook and writes the buffer
/// length-prefixed; a null nullable writes `varint(0)` without invoking the
/// hook. Decode reads the prefixed buffer and hands it to the reconstruct
/// hook even when it is empty, so a hook-encoded null decodes as a present
/// value reconstructed from an empty buffer.
pub(crate) struct CustomHookCodec {
    pub(crate) hooks: Arc<dyn MarshalHooks>,
}

impl Codec for CustomHookCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        match value {
            Value::Custom(custom) => {
                let bytes = self
                    .hooks
                    .marshal(&custom.inner)
                    .map_err(CodecError::custom_hook)?;
                e.write_uvarint(bytes.len() as u64);
                if !bytes.is_empty() {
                    e.write(&bytes);
                }
                Ok(())
            }
            Value::Nullable(nullable) => match &nullable.value {
                None => {
                    e.write_uvarint(0);
                    Ok(())
                }
                Some(inner) => self.encode_to(e, inner),
            },
            other => Err(CodecError::not_addressable(format!(
                "cannot marshal {} through custom hooks",
                other.ty().name()
            ))),
        }
    }

    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        let len = d.read_uvarint()? as usize;
        let bytes = if len > 0 {
            d.read_slice(len)?.to_vec()
        } else {
            Vec::new()
        };
        self.fill(target, &bytes)
    }
}

impl CustomHookCodec {
    fn fill(&self, target: &mut Value, bytes: &[u8]) -> CodecResult<()> {
        match target {
            Value::Custom(custom) => {
                let inner = self
                    .hooks
                    .unmarshal(bytes)
                    .map_err(CodecError::custom_hook)?;
                custom.inner = Box::new(inner);
                Ok(())
            }
            Value::Nullable(nullable) => {
                let elem_ty = match nullable.ty.kind() {
                    Kind::Nullable(elem) => elem.clone(),
                    _ => {
                        return Err(CodecError::bad_argument(
                            "nullable target with non-nullable type",
                        ))
                    }
                };
                let slot = nullable
                    .value
                    .get_or_insert_with(|| Box::new(elem_ty.zero_value()));
                self.fill(slot, bytes)
            }
            other => Err(CodecError::not_addressable(format!(
                "cannot unmarshal into {} through custom hooks",
                other.ty().name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::primitive::{StringCodec, UvarintCodec, VarintCodec};
    use crate::decoder::DecoderCore;
    use crate::encoder::EncoderCore;
    use crate::error::BoxError;

    fn encode(codec: &dyn Codec, value: &Value) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut e = Encoder::new(&mut bytes, EncoderCore::default());
        codec.encode_to(&mut e, value).unwrap();
        let (_, err) = e.finish();
        assert!(err.is_none());
        bytes
    }

    fn decode(codec: &dyn Codec, bytes: &[u8], target: &mut Value) {
        let mut d = Decoder::over_slice(bytes, DecoderCore::default());
        codec.decode_to(&mut d, target).unwrap();
    }

    fn string_i64_map_codec() -> (Type, MapCodec) {
        let ty = Type::map(Type::string(), Type::i64());
        let codec = MapCodec {
            key_ty: Type::string(),
            value_ty: Type::i64(),
            key: Arc::new(StringCodec),
            value: Arc::new(VarintCodec),
        };
        (ty, codec)
    }

    #[test]
    fn map_wire_follows_insertion_order() {
        let (ty, codec) = string_i64_map_codec();
        let value = Value::map(
            &ty,
            vec![("one".into(), 1i64.into()), ("two".into(), 2i64.into())],
        );
        let bytes = encode(&codec, &value);
        assert_eq!(
            bytes,
            vec![0x02, 0x03, b'o', b'n', b'e', 0x02, 0x03, b't', b'w', b'o', 0x04]
        );

        let mut target = ty.zero_value();
        decode(&codec, &bytes, &mut target);
        assert_eq!(target, value);
    }

    #[test]
    fn map_decode_replaces_stale_entries() {
        let (ty, codec) = string_i64_map_codec();
        let mut target = Value::map(&ty, vec![("stale".into(), 9i64.into())]);
        decode(&codec, &[0x00], &mut target);
        assert_eq!(target, Value::map(&ty, Vec::new()));
    }

    #[test]
    fn nullable_null_is_one_byte() {
        let ty = Type::nullable(Type::u32());
        let codec = NullableCodec {
            elem_ty: Type::u32(),
            elem: Arc::new(UvarintCodec),
        };
        let bytes = encode(&codec, &Value::null(&ty));
        assert_eq!(bytes, vec![0x01]);

        let mut target = Value::some(&ty, 9u32.into());
        decode(&codec, &bytes, &mut target);
        assert!(target.is_null(), "null flag clears a reused target");
    }

    #[test]
    fn nullable_present_allocates_a_fresh_referent() {
        let ty = Type::nullable(Type::u32());
        let codec = NullableCodec {
            elem_ty: Type::u32(),
            elem: Arc::new(UvarintCodec),
        };
        let bytes = encode(&codec, &Value::some(&ty, 42u32.into()));
        assert_eq!(bytes, vec![0x00, 0x2a]);

        let mut target = ty.zero_value();
        decode(&codec, &bytes, &mut target);
        assert_eq!(target.as_referent(), Some(&Value::U32(42)));
    }

    struct HexHooks;

    impl MarshalHooks for HexHooks {
        fn marshal(&self, value: &Value) -> Result<Vec<u8>, BoxError> {
            let s = value.as_str().ok_or("expected string payload")?;
            Ok(s.as_bytes().to_vec())
        }

        fn unmarshal(&self, bytes: &[u8]) -> Result<Value, BoxError> {
            Ok(Value::Str(String::from_utf8(bytes.to_vec())?))
        }
    }

    fn hex_type() -> Type {
        Type::custom("Hex", Arc::new(HexHooks))
    }

    #[test]
    fn custom_codec_is_length_prefixed() {
        let ty = hex_type();
        let codec = CustomHookCodec {
            hooks: Arc::new(HexHooks),
        };
        let value = Value::custom(&ty, "2a".into());
        let bytes = encode(&codec, &value);
        assert_eq!(bytes, vec![0x02, b'2', b'a']);

        let mut target = ty.zero_value();
        decode(&codec, &bytes, &mut target);
        assert_eq!(target, value);
    }

    #[test]
    fn custom_null_skips_the_hook() {
        let ty = Type::nullable(hex_type());
        let codec = CustomHookCodec {
            hooks: Arc::new(HexHooks),
        };
        let bytes = encode(&codec, &Value::null(&ty));
        assert_eq!(bytes, vec![0x00]);

        // The reconstruct hook runs even on an empty buffer, so the decoded
        // value is present.
        let mut target = ty.zero_value();
        decode(&codec, &bytes, &mut target);
        assert_eq!(target.as_referent().and_then(Value::as_str), Some(""));
    }

    #[test]
    fn custom_hook_errors_are_wrapped() {
        let codec = CustomHookCodec {
            hooks: Arc::new(HexHooks),
        };
        let mut bytes = Vec::new();
        let mut e = Encoder::new(&mut bytes, EncoderCore::default());
        let err = codec
            .encode_to(&mut e, &Value::custom(&hex_type(), Value::I64(1)))
            .unwrap_err();
        assert!(matches!(err, CodecError::CustomHook { .. }));
    }

    #[test]
    fn custom_slot_misuse_is_not_addressable() {
        let codec = CustomHookCodec {
            hooks: Arc::new(HexHooks),
        };
        let mut bytes = Vec::new();
        let mut e = Encoder::new(&mut bytes, EncoderCore::default());
        let err = codec.encode_to(&mut e, &Value::I64(1)).unwrap_err();
        assert!(matches!(err, CodecError::NotAddressable { .. }));

        let mut target = Value::I64(0);
        let mut d = Decoder::over_slice(&[0x00], DecoderCore::default());
        let err = codec.decode_to(&mut d, &mut target).unwrap_err();
        assert!(matches!(err, CodecError::NotAddressable { .. }));
    }

    #[test]
    fn record_concatenates_fields_in_order() {
        use crate::types::Field;

        let ty = Type::record(
            "Entry",
            vec![
                Field::new("name", Type::string()),
                Field::new("count", Type::u32()),
            ],
        );
        let codec = RecordCodec {
            fields: vec![
                FieldCodec {
                    index: 0,
                    codec: Arc::new(StringCodec),
                },
                FieldCodec {
                    index: 1,
                    codec: Arc::new(UvarintCodec),
                },
            ],
        };
        let value = Value::record(&ty, vec!["a".into(), 7u32.into()]);
        let bytes = encode(&codec, &value);
        assert_eq!(bytes, vec![0x01, b'a', 0x07]);

        let mut target = ty.zero_value();
        decode(&codec, &bytes, &mut target);
        assert_eq!(target, value);
    }
}
