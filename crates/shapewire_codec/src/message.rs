//! The standard inter-module communication envelope.
//!
//! Pub/sub traffic between modules is wrapped in a [`Message`] before
//! transmission: a routing topic, a kind discriminator, a correlation id,
//! and an already-encoded payload body.

use once_cell::sync::Lazy;

use crate::error::{CodecError, CodecResult};
use crate::instance::Input;
use crate::types::{Field, Type};
use crate::value::Value;

/// Event message kind.
pub const MSG_EVENT: u8 = 0;
/// Request message kind.
pub const MSG_REQUEST: u8 = 1;
/// Response message kind.
pub const MSG_RESPONSE: u8 = 2;
/// Error message kind.
pub const MSG_ERROR: u8 = 3;

static MESSAGE_TYPE: Lazy<Type> = Lazy::new(|| {
    Type::record(
        "Message",
        vec![
            Field::new("topic", Type::string()),
            Field::new("kind", Type::u8()),
            Field::new("id", Type::u32()),
            Field::new("payload", Type::bytes()),
        ],
    )
});

/// The standard inter-module communication envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Routing key, e.g. `users.created` or `auth.logout`.
    pub topic: String,
    /// One of [`MSG_EVENT`], [`MSG_REQUEST`], [`MSG_RESPONSE`],
    /// [`MSG_ERROR`].
    pub kind: u8,
    /// Correlation id for request/response pairs.
    pub id: u32,
    /// Binary-encoded body (a domain-specific value).
    pub payload: Vec<u8>,
}

impl Message {
    /// The process-wide record type describing the envelope.
    #[must_use]
    pub fn shape() -> Type {
        MESSAGE_TYPE.clone()
    }

    /// Render this envelope as a dynamic value of [`Message::shape`].
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::record(
            &Self::shape(),
            vec![
                self.topic.clone().into(),
                self.kind.into(),
                self.id.into(),
                self.payload.clone().into(),
            ],
        )
    }

    /// Rebuild an envelope from a dynamic value of [`Message::shape`].
    ///
    /// # Errors
    ///
    /// Fails if the value is not a `Message` record.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_value(value: &Value) -> CodecResult<Self> {
        let malformed = || CodecError::bad_argument("value is not a Message record");
        Ok(Self {
            topic: value
                .field("topic")
                .and_then(Value::as_str)
                .ok_or_else(malformed)?
                .to_string(),
            kind: value
                .field("kind")
                .and_then(Value::as_u64)
                .ok_or_else(malformed)? as u8,
            id: value
                .field("id")
                .and_then(Value::as_u64)
                .ok_or_else(malformed)? as u32,
            payload: value
                .field("payload")
                .and_then(Value::as_bytes)
                .ok_or_else(malformed)?
                .to_vec(),
        })
    }

    /// Encode this envelope to bytes.
    ///
    /// # Errors
    ///
    /// Fails if the underlying encode fails.
    pub fn to_bytes(&self) -> CodecResult<Vec<u8>> {
        crate::to_bytes(&self.to_value())
    }

    /// Decode an envelope from bytes.
    ///
    /// # Errors
    ///
    /// Fails if the bytes are truncated or malformed.
    pub fn from_bytes(bytes: &[u8]) -> CodecResult<Self> {
        let mut target = Self::shape().zero_value();
        crate::decode(Input::Buffer(bytes), &mut target)?;
        Self::from_value(&target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_roundtrip() {
        let message = Message {
            topic: "users.created".to_string(),
            kind: MSG_EVENT,
            id: 42,
            payload: vec![0x01, 0x02, 0x03],
        };
        let bytes = message.to_bytes().unwrap();
        assert_eq!(Message::from_bytes(&bytes).unwrap(), message);
    }

    #[test]
    fn empty_envelope_is_four_zero_bytes() {
        // Empty topic, kind 0, id 0, empty payload: each encodes to one
        // zero byte.
        let bytes = Message::default().to_bytes().unwrap();
        assert_eq!(bytes, vec![0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn from_value_rejects_foreign_shapes() {
        let err = Message::from_value(&Value::Bool(true)).unwrap_err();
        assert!(matches!(err, CodecError::BadArgument { .. }));
    }

    #[test]
    fn truncated_envelope_fails() {
        let message = Message {
            topic: "t".to_string(),
            kind: MSG_REQUEST,
            id: 7,
            payload: vec![0xaa; 8],
        };
        let bytes = message.to_bytes().unwrap();
        let err = Message::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEnd));
    }
}
