//! Byte-level readers.
//!
//! Two readers sit behind one contract: a *slice reader* that cursors over a
//! borrowed byte buffer and hands out zero-copy views, and a *stream reader*
//! that wraps an arbitrary byte source and buffers internally until the
//! requested count is satisfied. Short reads surface as
//! [`CodecError::UnexpectedEnd`].

use std::io;

use crate::error::{CodecError, CodecResult};

/// Largest encoded size of a 64-bit varint.
const MAX_VARINT_BYTES: usize = 10;

/// Stream reads are filled in chunks of at most this many bytes, so a
/// truncated input fails before the full claimed length is allocated.
const STREAM_CHUNK: usize = 64 * 1024;

/// Reusable decoder state, recycled through the instance pool.
///
/// Carries the stream reader's internal buffer so its capacity survives
/// across calls.
#[derive(Default)]
pub(crate) struct DecoderCore {
    buf: Vec<u8>,
}

impl DecoderCore {
    pub(crate) fn reset(&mut self) {
        self.buf.clear();
    }
}

/// A cursor into a borrowed byte buffer.
struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    fn read_slice(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if n > self.data.len() - self.pos {
            return Err(CodecError::UnexpectedEnd);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}

/// A buffered reader over an arbitrary byte source.
struct StreamReader<'a> {
    src: &'a mut dyn io::Read,
    buf: Vec<u8>,
}

impl StreamReader<'_> {
    fn read_slice(&mut self, n: usize) -> CodecResult<&[u8]> {
        self.buf.clear();
        while self.buf.len() < n {
            let chunk = (n - self.buf.len()).min(STREAM_CHUNK);
            let start = self.buf.len();
            self.buf.resize(start + chunk, 0);
            match self.src.read_exact(&mut self.buf[start..]) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(CodecError::UnexpectedEnd);
                }
                Err(e) => return Err(CodecError::Io(e)),
            }
        }
        Ok(&self.buf[..n])
    }
}

enum Reader<'a> {
    Slice(SliceReader<'a>),
    Stream(StreamReader<'a>),
}

/// A binary decoder bound to an input source for the duration of one call.
pub(crate) struct Decoder<'a> {
    reader: Reader<'a>,
    /// Parks the core's buffer while the slice reader (which has no use for
    /// it) is active, so the capacity still makes it back to the pool.
    parked: Vec<u8>,
}

impl<'a> Decoder<'a> {
    /// Bind to a borrowed byte buffer.
    pub(crate) fn over_slice(data: &'a [u8], core: DecoderCore) -> Self {
        Self {
            reader: Reader::Slice(SliceReader { data, pos: 0 }),
            parked: core.buf,
        }
    }

    /// Bind to a streaming byte source.
    pub(crate) fn over_stream(src: &'a mut dyn io::Read, core: DecoderCore) -> Self {
        Self {
            reader: Reader::Stream(StreamReader {
                src,
                buf: core.buf,
            }),
            parked: Vec::new(),
        }
    }

    /// Unbind, yielding the recyclable core.
    pub(crate) fn into_core(self) -> DecoderCore {
        match self.reader {
            Reader::Slice(_) => DecoderCore { buf: self.parked },
            Reader::Stream(stream) => DecoderCore { buf: stream.buf },
        }
    }

    /// Read exactly `n` bytes. Zero-copy on the slice path.
    pub(crate) fn read_slice(&mut self, n: usize) -> CodecResult<&[u8]> {
        match &mut self.reader {
            Reader::Slice(r) => r.read_slice(n),
            Reader::Stream(r) => r.read_slice(n),
        }
    }

    fn read_byte(&mut self) -> CodecResult<u8> {
        Ok(self.read_slice(1)?[0])
    }

    /// Read a boolean byte. Permissive: any non-zero byte is true.
    pub(crate) fn read_bool(&mut self) -> CodecResult<bool> {
        Ok(self.read_byte()? != 0)
    }

    /// Read an unsigned base-128 varint, at most 10 bytes.
    pub(crate) fn read_uvarint(&mut self) -> CodecResult<u64> {
        let mut x = 0u64;
        let mut shift = 0u32;
        for _ in 0..MAX_VARINT_BYTES {
            let b = self.read_byte()?;
            if b < 0x80 {
                if shift == 63 && b > 1 {
                    return Err(CodecError::bad_argument("varint overflows 64 bits"));
                }
                return Ok(x | (u64::from(b) << shift));
            }
            x |= u64::from(b & 0x7f) << shift;
            shift += 7;
        }
        Err(CodecError::bad_argument("varint exceeds 10 bytes"))
    }

    /// Read a ZigZag-transformed signed varint.
    pub(crate) fn read_varint(&mut self) -> CodecResult<i64> {
        let x = self.read_uvarint()?;
        let mut v = (x >> 1) as i64;
        if x & 1 != 0 {
            v = !v;
        }
        Ok(v)
    }

    /// Read a fixed-width little-endian u16.
    pub(crate) fn read_u16(&mut self) -> CodecResult<u16> {
        let b = self.read_slice(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a fixed-width little-endian u32.
    pub(crate) fn read_u32(&mut self) -> CodecResult<u32> {
        let b = self.read_slice(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a fixed-width little-endian u64.
    pub(crate) fn read_u64(&mut self) -> CodecResult<u64> {
        let b = self.read_slice(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read a 32-bit float from its raw bit pattern.
    pub(crate) fn read_f32(&mut self) -> CodecResult<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Read a 64-bit float from its raw bit pattern.
    pub(crate) fn read_f64(&mut self) -> CodecResult<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Read a varint-length-prefixed string.
    ///
    /// Bytes are copied verbatim; invalid UTF-8 is replaced rather than
    /// rejected, mirroring the permissive boolean decode.
    pub(crate) fn read_string(&mut self) -> CodecResult<String> {
        let len = self.read_uvarint()? as usize;
        let bytes = self.read_slice(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
