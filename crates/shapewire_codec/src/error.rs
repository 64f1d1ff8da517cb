//! Error types for the serialization engine.

use thiserror::Error;

/// Boxed error type returned by user-supplied marshal hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during scanning, encoding or decoding.
///
/// The taxonomy is closed: every failure in the engine maps onto one of
/// these kinds, and intermediate codecs propagate errors upward unchanged.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The engine was handed an argument whose shape it cannot use, such as
    /// a value that does not match the type its codec was compiled for.
    #[error("bad argument: {context}")]
    BadArgument {
        /// Description of the offending argument.
        context: String,
    },

    /// The scanner encountered a type it cannot build a codec for.
    #[error("unsupported type: {type_name}")]
    UnsupportedType {
        /// Name of the unsupported type.
        type_name: String,
    },

    /// A decode target (or marshal source) cannot be written through.
    #[error("target is not addressable: {context}")]
    NotAddressable {
        /// Description of the slot that could not be written.
        context: String,
    },

    /// The reader reached end-of-input in the middle of an item.
    #[error("unexpected end of input")]
    UnexpectedEnd,

    /// A user-supplied marshal or unmarshal hook failed.
    ///
    /// The hook's error is carried verbatim as the source.
    #[error("custom hook failed: {source}")]
    CustomHook {
        /// The hook's own error.
        #[source]
        source: BoxError,
    },

    /// The underlying writer or reader failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A compiled codec is missing where one was expected.
    ///
    /// Guards against cache corruption; should never surface in practice.
    #[error("missing codec for {context}")]
    NilCodec {
        /// What the missing codec was supposed to handle.
        context: String,
    },
}

impl CodecError {
    /// Create a bad argument error.
    pub fn bad_argument(context: impl Into<String>) -> Self {
        Self::BadArgument {
            context: context.into(),
        }
    }

    /// Create an unsupported type error.
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// Create a not addressable error.
    pub fn not_addressable(context: impl Into<String>) -> Self {
        Self::NotAddressable {
            context: context.into(),
        }
    }

    /// Wrap a user hook failure.
    pub fn custom_hook(source: BoxError) -> Self {
        Self::CustomHook { source }
    }

    /// Create a missing codec error.
    pub fn nil_codec(context: impl Into<String>) -> Self {
        Self::NilCodec {
            context: context.into(),
        }
    }
}
