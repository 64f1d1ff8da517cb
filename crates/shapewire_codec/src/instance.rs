//! The coordinator: schema cache, object pools, and the process-wide
//! instance.
//!
//! An [`Instance`] owns the compiled codec plans for every type it has seen,
//! recycles encoder/decoder state across calls, and serializes cache
//! mutation under concurrent traffic. A single global instance backs the
//! crate-level [`encode`](crate::encode)/[`decode`](crate::decode) functions;
//! explicit instances are available for isolation.

use std::io;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::debug;

use crate::codec::Codec;
use crate::decoder::{Decoder, DecoderCore};
use crate::encoder::{Encoder, EncoderCore};
use crate::error::CodecResult;
use crate::scanner;
use crate::types::Type;
use crate::value::Value;

/// Ceiling on cached schema entries; the oldest entry is dropped before a
/// new one is appended once the ceiling is reached.
const SCHEMA_CACHE_LIMIT: usize = 1000;

/// How many idle cores each pool retains.
const POOL_RETAIN_LIMIT: usize = 32;

/// Output vectors are pre-grown to this many bytes before encoding.
const OUTPUT_PREGROW: usize = 64;

/// An injectable diagnostics callback. `None` disables logging.
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Where encoded bytes go.
pub enum Output<'a> {
    /// Replace the contents of a byte vector on success; the vector is left
    /// untouched when encoding fails.
    Buffer(&'a mut Vec<u8>),
    /// Write through a streaming writer, one primitive at a time.
    Stream(&'a mut dyn io::Write),
}

/// Where decoded bytes come from.
pub enum Input<'a> {
    /// A borrowed byte buffer, read zero-copy.
    Buffer(&'a [u8]),
    /// A streaming reader, buffered internally.
    Stream(&'a mut dyn io::Read),
}

struct SchemaEntry {
    ty: Type,
    codec: Arc<dyn Codec>,
}

/// Recyclable state that a pool knows how to re-initialize on checkout.
trait Recycle: Default {
    fn recycle(&mut self);
}

impl Recycle for EncoderCore {
    fn recycle(&mut self) {
        self.reset();
    }
}

impl Recycle for DecoderCore {
    fn recycle(&mut self) {
        self.reset();
    }
}

struct Pool<T> {
    items: Mutex<Vec<T>>,
}

impl<T: Recycle> Pool<T> {
    fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    fn checkout(&self) -> T {
        match self.items.lock().pop() {
            Some(mut item) => {
                item.recycle();
                item
            }
            None => T::default(),
        }
    }

    fn release(&self, item: T) {
        let mut items = self.items.lock();
        if items.len() < POOL_RETAIN_LIMIT {
            items.push(item);
        }
    }
}

/// A self-contained encoder/decoder coordinator.
///
/// Holds the schema cache behind a reader-writer lock, one pool of encoder
/// cores and one of decoder cores, and an optional diagnostics callback.
/// Codecs are immutable once compiled, so an instance is safe to share
/// across threads.
pub struct Instance {
    log: RwLock<Option<LogCallback>>,
    schemas: RwLock<Vec<SchemaEntry>>,
    encoders: Pool<EncoderCore>,
    decoders: Pool<DecoderCore>,
}

impl Instance {
    /// Create an instance with no logging callback.
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: RwLock::new(None),
            schemas: RwLock::new(Vec::with_capacity(100)),
            encoders: Pool::new(),
            decoders: Pool::new(),
        }
    }

    /// Create an instance with a diagnostics callback installed.
    #[must_use]
    pub fn with_log(callback: LogCallback) -> Self {
        let instance = Self::new();
        *instance.log.write() = Some(callback);
        instance
    }

    /// Install or remove the diagnostics callback.
    pub fn set_log(&self, callback: Option<LogCallback>) {
        *self.log.write() = callback;
    }

    fn emit(&self, message: impl FnOnce() -> String) {
        if let Some(callback) = self.log.read().as_ref() {
            callback(&message());
        }
    }

    /// Encode `value` into the given output.
    ///
    /// # Errors
    ///
    /// Fails if the value's type cannot be scanned, the value does not match
    /// its type, or the underlying writer fails.
    pub fn encode(&self, value: &Value, output: Output<'_>) -> CodecResult<()> {
        match output {
            Output::Buffer(buf) => {
                let mut staging = Vec::with_capacity(OUTPUT_PREGROW);
                self.encode_to(value, &mut staging)?;
                *buf = staging;
                Ok(())
            }
            Output::Stream(writer) => self.encode_to(value, writer),
        }
    }

    fn encode_to(&self, value: &Value, out: &mut dyn io::Write) -> CodecResult<()> {
        let codec = self.scan_to_cache(&value.ty())?;

        let core = self.encoders.checkout();
        let mut encoder = Encoder::new(out, core);
        let result = codec.encode_to(&mut encoder, value);
        let (core, sticky) = encoder.finish();
        // The core goes back to the pool unconditionally, error or not.
        self.encoders.release(core);

        result?;
        match sticky {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Decode from the given input into `target`, which must be a value of
    /// the expected type (see [`Type::zero_value`]).
    ///
    /// # Errors
    ///
    /// Fails if the target's type cannot be scanned, the input ends
    /// mid-item, or the underlying reader fails.
    pub fn decode(&self, input: Input<'_>, target: &mut Value) -> CodecResult<()> {
        let codec = self.scan_to_cache(&target.ty())?;

        let core = self.decoders.checkout();
        let mut decoder = match input {
            Input::Buffer(data) => Decoder::over_slice(data, core),
            Input::Stream(src) => Decoder::over_stream(src, core),
        };
        let result = codec.decode_to(&mut decoder, target);
        self.decoders.release(decoder.into_core());
        result
    }

    /// Return the cached codec for `ty`, compiling and caching it on first
    /// use.
    pub(crate) fn scan_to_cache(&self, ty: &Type) -> CodecResult<Arc<dyn Codec>> {
        if let Some(codec) = self.find_schema(ty) {
            return Ok(codec);
        }

        let codec = scanner::scan(ty)?;
        self.add_schema(ty.clone(), codec.clone());
        Ok(codec)
    }

    fn find_schema(&self, ty: &Type) -> Option<Arc<dyn Codec>> {
        // Linear scan: the number of distinct types in one process is small
        // and descriptor identity comparison is a pointer compare.
        self.schemas
            .read()
            .iter()
            .find(|entry| entry.ty == *ty)
            .map(|entry| entry.codec.clone())
    }

    fn add_schema(&self, ty: Type, codec: Arc<dyn Codec>) {
        let mut schemas = self.schemas.write();
        if schemas.len() >= SCHEMA_CACHE_LIMIT {
            let evicted = schemas.remove(0);
            debug!(type_name = %evicted.ty.name(), "schema cache full, evicting oldest entry");
            self.emit(|| format!("schema evicted: {}", evicted.ty.name()));
        }
        debug!(type_name = %ty.name(), "caching compiled codec");
        self.emit(|| format!("schema cached: {}", ty.name()));
        schemas.push(SchemaEntry { ty, codec });
    }

    #[cfg(test)]
    fn schema_count(&self) -> usize {
        self.schemas.read().len()
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: Lazy<Instance> = Lazy::new(Instance::new);

/// The process-wide instance, lazily constructed on first use.
pub(crate) fn global() -> &'static Instance {
    &GLOBAL
}
