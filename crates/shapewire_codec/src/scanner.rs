//! Type introspection and codec compilation.
//!
//! The scanner walks a [`Type`] recursively and composes a codec tree whose
//! shape mirrors the type. Dispatch checks the outer kind first and the
//! element kind second, so sequences of primitive scalars get their
//! specialized codecs instead of per-element virtual dispatch.
//!
//! Self-referential shapes are handled with a thunk: re-entering a record
//! that is currently being scanned yields a forward declaration that is
//! patched to the finished codec once the outer scan completes.

use std::sync::{Arc, OnceLock};

use crate::codec::{
    ArrayCodec, BoolCodec, BoolSeqCodec, ByteSeqCodec, Codec, CustomHookCodec, FieldCodec,
    Float32Codec, Float64Codec, MapCodec, NullableCodec, NullableSeqCodec, RecordCodec, SeqCodec,
    StringCodec, UvarintCodec, UvarintSeqCodec, VarintCodec, VarintSeqCodec,
};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{CodecError, CodecResult};
use crate::types::{Kind, Type};
use crate::value::Value;

/// Compile a codec tree for `ty`.
pub(crate) fn scan(ty: &Type) -> CodecResult<Arc<dyn Codec>> {
    let mut ctx = ScanContext::default();
    scan_with(&mut ctx, ty)
}

#[derive(Default)]
struct ScanContext {
    in_progress: Vec<InProgress>,
}

struct InProgress {
    ty: Type,
    thunk: Option<Arc<ThunkCodec>>,
}

fn scan_with(ctx: &mut ScanContext, ty: &Type) -> CodecResult<Arc<dyn Codec>> {
    match ty.kind() {
        // The custom capability wins over everything, whether declared on
        // the type itself or reached through a nullable reference to it.
        Kind::Custom(shape) => Ok(Arc::new(CustomHookCodec {
            hooks: shape.hooks().clone(),
        })),
        Kind::Nullable(elem) if matches!(elem.kind(), Kind::Custom(_)) => {
            scan_with(ctx, elem)
        }
        Kind::Nullable(elem) => Ok(Arc::new(NullableCodec {
            elem_ty: elem.clone(),
            elem: scan_with(ctx, elem)?,
        })),
        Kind::Seq(elem) => scan_seq(ctx, elem),
        Kind::Array(elem, _) => Ok(Arc::new(ArrayCodec {
            elem: scan_with(ctx, elem)?,
        })),
        Kind::Map(key, value) => Ok(Arc::new(MapCodec {
            key_ty: key.clone(),
            value_ty: value.clone(),
            key: scan_with(ctx, key)?,
            value: scan_with(ctx, value)?,
        })),
        Kind::Record(_) => scan_record(ctx, ty),
        Kind::Bool => Ok(Arc::new(BoolCodec)),
        Kind::I8 | Kind::I16 | Kind::I32 | Kind::I64 => Ok(Arc::new(VarintCodec)),
        Kind::U8 | Kind::U16 | Kind::U32 | Kind::U64 => Ok(Arc::new(UvarintCodec)),
        Kind::F32 => Ok(Arc::new(Float32Codec)),
        Kind::F64 => Ok(Arc::new(Float64Codec)),
        Kind::Str => Ok(Arc::new(StringCodec)),
        Kind::Opaque(_) => Err(CodecError::unsupported_type(ty.name())),
    }
}

fn scan_seq(ctx: &mut ScanContext, elem: &Type) -> CodecResult<Arc<dyn Codec>> {
    match elem.kind() {
        Kind::U8 => Ok(Arc::new(ByteSeqCodec)),
        Kind::Bool => Ok(Arc::new(BoolSeqCodec)),
        Kind::I8 | Kind::I16 | Kind::I32 | Kind::I64 => Ok(Arc::new(VarintSeqCodec {
            elem_ty: elem.clone(),
        })),
        Kind::U16 | Kind::U32 | Kind::U64 => Ok(Arc::new(UvarintSeqCodec {
            elem_ty: elem.clone(),
        })),
        Kind::Nullable(inner) => Ok(Arc::new(NullableSeqCodec {
            nullable_ty: elem.clone(),
            elem_ty: inner.clone(),
            elem: scan_with(ctx, inner)?,
        })),
        _ => Ok(Arc::new(SeqCodec {
            elem_ty: elem.clone(),
            elem: scan_with(ctx, elem)?,
        })),
    }
}

fn scan_record(ctx: &mut ScanContext, ty: &Type) -> CodecResult<Arc<dyn Codec>> {
    // Re-entry: hand out a forward declaration instead of recursing forever.
    if let Some(entry) = ctx.in_progress.iter_mut().find(|entry| entry.ty == *ty) {
        let thunk = entry
            .thunk
            .get_or_insert_with(|| Arc::new(ThunkCodec::new(ty.name())))
            .clone();
        return Ok(thunk as Arc<dyn Codec>);
    }

    let fields = match ty.kind() {
        Kind::Record(shape) => shape.fields().ok_or_else(|| {
            CodecError::unsupported_type(format!("{} (fields not defined)", shape.name()))
        })?,
        _ => return Err(CodecError::unsupported_type(ty.name())),
    };

    ctx.in_progress.push(InProgress {
        ty: ty.clone(),
        thunk: None,
    });
    let mut compiled = Vec::new();
    let mut failure = None;
    for (index, field) in fields.iter().enumerate() {
        if field.is_skipped() {
            continue;
        }
        match scan_with(ctx, field.ty()) {
            Ok(codec) => compiled.push(FieldCodec { index, codec }),
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }
    let entry = ctx.in_progress.pop();

    if let Some(err) = failure {
        return Err(err);
    }

    let codec: Arc<dyn Codec> = Arc::new(RecordCodec { fields: compiled });
    if let Some(InProgress {
        thunk: Some(thunk), ..
    }) = entry
    {
        thunk.resolve(codec.clone());
    }
    Ok(codec)
}

/// A forward-declared codec, patched once the shape it stands in for has
/// finished compiling.
struct ThunkCodec {
    type_name: String,
    cell: OnceLock<Arc<dyn Codec>>,
}

impl ThunkCodec {
    fn new(type_name: String) -> Self {
        Self {
            type_name,
            cell: OnceLock::new(),
        }
    }

    fn resolve(&self, codec: Arc<dyn Codec>) {
        let _ = self.cell.set(codec);
    }

    fn resolved(&self) -> CodecResult<&Arc<dyn Codec>> {
        self.cell
            .get()
            .ok_or_else(|| CodecError::nil_codec(self.type_name.clone()))
    }
}

impl Codec for ThunkCodec {
    fn encode_to(&self, e: &mut Encoder<'_>, value: &Value) -> CodecResult<()> {
        self.resolved()?.encode_to(e, value)
    }

    fn decode_to(&self, d: &mut Decoder<'_>, target: &mut Value) -> CodecResult<()> {
        self.resolved()?.decode_to(d, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecoderCore;
    use crate::encoder::EncoderCore;
    use crate::error::BoxError;
    use crate::types::{Field, MarshalHooks};

    fn roundtrip(ty: &Type, value: &Value) -> Value {
        let codec = scan(ty).unwrap();
        let mut bytes = Vec::new();
        let mut e = Encoder::new(&mut bytes, EncoderCore::default());
        codec.encode_to(&mut e, value).unwrap();
        let (_, err) = e.finish();
        assert!(err.is_none());

        let mut target = ty.zero_value();
        let mut d = Decoder::over_slice(&bytes, DecoderCore::default());
        codec.decode_to(&mut d, &mut target).unwrap();
        target
    }

    #[test]
    fn scans_primitives() {
        for ty in [
            Type::bool(),
            Type::i32(),
            Type::u64(),
            Type::f32(),
            Type::f64(),
            Type::string(),
        ] {
            assert!(scan(&ty).is_ok(), "failed to scan {}", ty.name());
        }
    }

    #[test]
    fn rejects_opaque_kinds() {
        let err = scan(&Type::opaque("channel")).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedType { .. }));
    }

    #[test]
    fn rejects_records_with_opaque_fields() {
        let ty = Type::record(
            "Holder",
            vec![
                Field::new("ok", Type::i64()),
                Field::new("ch", Type::opaque("channel")),
            ],
        );
        let err = scan(&ty).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedType { .. }));
    }

    #[test]
    fn rejects_undefined_deferred_records() {
        let ty = Type::deferred_record("Pending");
        let err = scan(&ty).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedType { .. }));
    }

    #[test]
    fn nested_composites_roundtrip() {
        let ty = Type::seq(Type::map(Type::string(), Type::i64()));
        let map_ty = match ty.kind() {
            Kind::Seq(elem) => elem.clone(),
            _ => unreachable!(),
        };
        let value = Value::seq(
            &ty,
            vec![
                Value::map(&map_ty, vec![("a".into(), 1i64.into())]),
                Value::map(&map_ty, vec![("b".into(), 2i64.into())]),
            ],
        );
        assert_eq!(roundtrip(&ty, &value), value);
    }

    #[test]
    fn recursive_record_roundtrips_through_the_thunk() {
        let node = Type::deferred_record("Node");
        node.define(vec![
            Field::new("label", Type::string()),
            Field::new("next", Type::nullable(node.clone())),
        ])
        .unwrap();
        // The nullable field type inside the record is its own handle;
        // reuse it so value identity matches.
        let field_next_ty = match node.kind() {
            Kind::Record(shape) => shape.fields().unwrap()[1].ty().clone(),
            _ => unreachable!(),
        };

        let leaf = Value::record(
            &node,
            vec!["tail".into(), Value::null(&field_next_ty)],
        );
        let list = Value::record(
            &node,
            vec!["head".into(), Value::some(&field_next_ty, leaf)],
        );
        assert_eq!(roundtrip(&node, &list), list);
    }

    struct UpperHooks;

    impl MarshalHooks for UpperHooks {
        fn marshal(&self, value: &Value) -> Result<Vec<u8>, BoxError> {
            Ok(value.as_str().ok_or("expected string")?.as_bytes().to_vec())
        }

        fn unmarshal(&self, bytes: &[u8]) -> Result<Value, BoxError> {
            Ok(Value::Str(
                String::from_utf8_lossy(bytes).to_uppercase(),
            ))
        }
    }

    #[test]
    fn custom_capability_wins_over_nullable_dispatch() {
        let custom = Type::custom("Upper", Arc::new(UpperHooks));
        let nullable = Type::nullable(custom.clone());
        let value = Value::some(&nullable, Value::custom(&custom, "abc".into()));

        let decoded = roundtrip(&nullable, &value);
        // A present nullable-of-custom goes through the hooks, not the
        // nullable flag byte.
        assert_eq!(
            decoded.as_referent().and_then(|v| match v {
                Value::Custom(c) => c.inner().as_str(),
                _ => None,
            }),
            Some("ABC")
        );
    }

    #[test]
    fn seq_of_nullable_gets_per_element_flags() {
        let nullable = Type::nullable(Type::i64());
        let ty = Type::seq(nullable.clone());
        let value = Value::seq(
            &ty,
            vec![Value::some(&nullable, 5i64.into()), Value::null(&nullable)],
        );
        assert_eq!(roundtrip(&ty, &value), value);
    }
}
