//! Shared value builders for the codec benchmarks.

#![deny(unsafe_code)]

use once_cell::sync::Lazy;
use shapewire_codec::{Field, Type, Value};

static USER_TYPE: Lazy<Type> = Lazy::new(|| {
    Type::record(
        "User",
        vec![
            Field::new("name", Type::string()),
            Field::new("email", Type::string()),
            Field::new("age", Type::u32()),
            Field::new("scores", Type::seq(Type::i64())),
            Field::new("avatar", Type::bytes()),
        ],
    )
});

/// The record type the benchmarks encode.
pub fn user_type() -> Type {
    USER_TYPE.clone()
}

/// A small representative record value.
pub fn simple_user() -> Value {
    let ty = user_type();
    let scores_ty = scores_type(&ty);
    Value::record(
        &ty,
        vec![
            "Alice".into(),
            "alice@example.com".into(),
            30u32.into(),
            Value::seq(&scores_ty, vec![90i64.into(), 85i64.into(), 99i64.into()]),
            vec![0u8; 16].into(),
        ],
    )
}

/// A record value whose byte payload has the given size.
pub fn sized_user(payload: usize) -> Value {
    let ty = user_type();
    let scores_ty = scores_type(&ty);
    Value::record(
        &ty,
        vec![
            "Bob".into(),
            "bob@example.com".into(),
            41u32.into(),
            Value::seq(&scores_ty, Vec::new()),
            vec![0xabu8; payload].into(),
        ],
    )
}

fn scores_type(ty: &Type) -> Type {
    match ty.kind() {
        shapewire_codec::Kind::Record(shape) => shape.fields().unwrap()[3].ty().clone(),
        _ => unreachable!(),
    }
}
