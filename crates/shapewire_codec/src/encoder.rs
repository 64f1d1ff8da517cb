//! Byte-level writer with a sticky error.
//!
//! Every primitive write goes straight to the bound sink. Once a write
//! fails, the error sticks: all subsequent writes are elided and the error
//! surfaces once at the top of the encode call. This keeps the per-primitive
//! write sites free of error plumbing.

use std::io;

use crate::error::CodecError;

/// Reusable encoder state, recycled through the instance pool.
///
/// Holds the scratch buffer for varint and fixed-width writes plus the
/// sticky error; both are re-initialized on checkout.
#[derive(Default)]
pub(crate) struct EncoderCore {
    scratch: [u8; 10],
    err: Option<CodecError>,
}

impl EncoderCore {
    pub(crate) fn reset(&mut self) {
        self.err = None;
    }
}

/// A binary encoder bound to an output sink for the duration of one call.
pub(crate) struct Encoder<'a> {
    out: &'a mut dyn io::Write,
    core: EncoderCore,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(out: &'a mut dyn io::Write, core: EncoderCore) -> Self {
        Self { out, core }
    }

    /// Whether the sticky error is set.
    pub(crate) fn failed(&self) -> bool {
        self.core.err.is_some()
    }

    /// Unbind from the sink, yielding the recyclable core and the sticky
    /// error, if any.
    pub(crate) fn finish(self) -> (EncoderCore, Option<CodecError>) {
        let mut core = self.core;
        let err = core.err.take();
        (core, err)
    }

    /// Write raw bytes.
    pub(crate) fn write(&mut self, p: &[u8]) {
        if self.core.err.is_some() {
            return;
        }
        if let Err(e) = self.out.write_all(p) {
            self.core.err = Some(CodecError::Io(e));
        }
    }

    fn flush_scratch(&mut self, n: usize) {
        if self.core.err.is_some() {
            return;
        }
        if let Err(e) = self.out.write_all(&self.core.scratch[..n]) {
            self.core.err = Some(CodecError::Io(e));
        }
    }

    /// Write an unsigned base-128 varint.
    pub(crate) fn write_uvarint(&mut self, mut x: u64) {
        let mut n = 0;
        while x >= 0x80 {
            self.core.scratch[n] = (x as u8) | 0x80;
            x >>= 7;
            n += 1;
        }
        self.core.scratch[n] = x as u8;
        self.flush_scratch(n + 1);
    }

    /// Write a signed integer as a ZigZag-transformed varint.
    pub(crate) fn write_varint(&mut self, v: i64) {
        let mut x = (v as u64) << 1;
        if v < 0 {
            x = !x;
        }
        self.write_uvarint(x);
    }

    /// Write a fixed-width little-endian u16.
    pub(crate) fn write_u16(&mut self, v: u16) {
        self.core.scratch[..2].copy_from_slice(&v.to_le_bytes());
        self.flush_scratch(2);
    }

    /// Write a fixed-width little-endian u32.
    pub(crate) fn write_u32(&mut self, v: u32) {
        self.core.scratch[..4].copy_from_slice(&v.to_le_bytes());
        self.flush_scratch(4);
    }

    /// Write a fixed-width little-endian u64.
    pub(crate) fn write_u64(&mut self, v: u64) {
        self.core.scratch[..8].copy_from_slice(&v.to_le_bytes());
        self.flush_scratch(8);
    }

    /// Write a 32-bit float as its raw bit pattern.
    pub(crate) fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    /// Write a 64-bit float as its raw bit pattern.
    pub(crate) fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    /// Write a boolean as a single byte.
    pub(crate) fn write_bool(&mut self, v: bool) {
        self.core.scratch[0] = u8::from(v);
        self.flush_scratch(1);
    }

    /// Write a string as a varint byte length followed by its bytes.
    pub(crate) fn write_string(&mut self, v: &str) {
        self.write_uvarint(v.len() as u64);
        self.write(v.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_with(f: impl FnOnce(&mut Encoder<'_>)) -> Vec<u8> {
        let mut out = Vec::new();
        let mut encoder = Encoder::new(&mut out, EncoderCore::default());
        f(&mut encoder);
        let (_, err) = encoder.finish();
        assert!(err.is_none());
        out
    }

    #[test]
    fn uvarint_small_values_are_one_byte() {
        assert_eq!(encode_with(|e| e.write_uvarint(0)), vec![0x00]);
        assert_eq!(encode_with(|e| e.write_uvarint(1)), vec![0x01]);
        assert_eq!(encode_with(|e| e.write_uvarint(127)), vec![0x7f]);
    }

    #[test]
    fn uvarint_continuation_bytes() {
        assert_eq!(encode_with(|e| e.write_uvarint(128)), vec![0x80, 0x01]);
        assert_eq!(encode_with(|e| e.write_uvarint(300)), vec![0xac, 0x02]);
    }

    #[test]
    fn uvarint_max_is_ten_bytes() {
        let bytes = encode_with(|e| e.write_uvarint(u64::MAX));
        assert_eq!(bytes.len(), 10);
        assert_eq!(bytes[9], 0x01);
    }

    #[test]
    fn varint_zigzag_folds_sign() {
        assert_eq!(encode_with(|e| e.write_varint(0)), vec![0x00]);
        assert_eq!(encode_with(|e| e.write_varint(-1)), vec![0x01]);
        assert_eq!(encode_with(|e| e.write_varint(1)), vec![0x02]);
        assert_eq!(encode_with(|e| e.write_varint(-2)), vec![0x03]);
        assert_eq!(encode_with(|e| e.write_varint(2)), vec![0x04]);
    }

    #[test]
    fn fixed_width_writes_are_little_endian() {
        assert_eq!(encode_with(|e| e.write_u16(0x0102)), vec![0x02, 0x01]);
        assert_eq!(
            encode_with(|e| e.write_u32(0x01020304)),
            vec![0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(
            encode_with(|e| e.write_u64(0x0102030405060708)),
            vec![0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn floats_write_their_bit_pattern() {
        assert_eq!(
            encode_with(|e| e.write_f32(1.0)),
            1.0f32.to_bits().to_le_bytes().to_vec()
        );
        assert_eq!(
            encode_with(|e| e.write_f64(-2.5)),
            (-2.5f64).to_bits().to_le_bytes().to_vec()
        );
    }

    #[test]
    fn string_is_length_prefixed() {
        assert_eq!(encode_with(|e| e.write_string("")), vec![0x00]);
        assert_eq!(
            encode_with(|e| e.write_string("abc")),
            vec![0x03, b'a', b'b', b'c']
        );
    }

    struct FailingWriter;

    impl io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "sink refused"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sticky_error_elides_later_writes() {
        let mut sink = FailingWriter;
        let mut encoder = Encoder::new(&mut sink, EncoderCore::default());
        encoder.write_bool(true);
        assert!(encoder.failed());
        // Subsequent writes are no-ops; the first error survives.
        encoder.write_uvarint(12345);
        encoder.write_string("ignored");
        let (_, err) = encoder.finish();
        assert!(matches!(err, Some(CodecError::Io(_))));
    }

    #[test]
    fn finish_takes_the_error_out_of_the_core() {
        let mut sink = FailingWriter;
        let mut encoder = Encoder::new(&mut sink, EncoderCore::default());
        encoder.write_bool(true);
        let (mut core, err) = encoder.finish();
        assert!(matches!(err, Some(CodecError::Io(_))));
        assert!(core.err.is_none());
        core.reset();
        assert!(core.err.is_none());
    }
}
