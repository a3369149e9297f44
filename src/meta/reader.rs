/// Typed reads over shared, immutable file bytes
///
/// A `ByteView` is a window into a loaded file. Views are cheap to clone and
/// many of them may alias the same buffer. Offsets passed to the read methods
/// are relative to the start of the view, but bounds are enforced only
/// against the underlying buffer: decoders trust header-declared offsets.
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::sync::Arc;

use crate::error::{DecodeError, Result};

/// Byte order for multi-byte reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Absolute byte range within a view's base buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub offset: usize,
    pub length: usize,
}

impl ByteRange {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

#[derive(Clone)]
pub struct ByteView {
    buf: Arc<[u8]>,
    offset: usize,
    len: usize,
}

impl std::fmt::Debug for ByteView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteView")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .field("buffer_len", &self.buf.len())
            .finish()
    }
}

impl ByteView {
    /// View over an entire buffer
    pub fn new(buf: impl Into<Arc<[u8]>>) -> Self {
        let buf = buf.into();
        let len = buf.len();
        Self { buf, offset: 0, len }
    }

    /// Sub-view sharing the same buffer. `range` is absolute.
    pub fn slice(&self, range: ByteRange) -> Self {
        Self {
            buf: Arc::clone(&self.buf),
            offset: range.offset,
            len: range.length,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute offset of this view in the base buffer
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Absolute range covered by this view
    pub fn range(&self) -> ByteRange {
        ByteRange::new(self.offset, self.len)
    }

    /// Bytes of the view, clamped to the base buffer
    pub fn as_slice(&self) -> &[u8] {
        let start = self.offset.min(self.buf.len());
        let end = self.range().end().min(self.buf.len());
        &self.buf[start..end]
    }

    /// Bytes at an absolute range of the base buffer
    pub fn absolute(&self, range: ByteRange) -> Result<&[u8]> {
        self.raw(range.offset, range.length)
    }

    fn raw(&self, abs: usize, len: usize) -> Result<&[u8]> {
        abs.checked_add(len)
            .and_then(|end| self.buf.get(abs..end))
            .ok_or(DecodeError::OutOfBounds {
                at: abs,
                len,
                buffer_len: self.buf.len(),
            })
    }

    fn at(&self, at: usize, len: usize) -> Result<&[u8]> {
        self.raw(self.offset + at, len)
    }

    pub fn u8(&self, at: usize) -> Result<u8> {
        Ok(self.at(at, 1)?[0])
    }

    pub fn i8(&self, at: usize) -> Result<i8> {
        Ok(self.u8(at)? as i8)
    }

    pub fn u16(&self, at: usize, endian: Endian) -> Result<u16> {
        let b = self.at(at, 2)?;
        Ok(match endian {
            Endian::Little => LittleEndian::read_u16(b),
            Endian::Big => BigEndian::read_u16(b),
        })
    }

    pub fn i16(&self, at: usize, endian: Endian) -> Result<i16> {
        Ok(self.u16(at, endian)? as i16)
    }

    pub fn u32(&self, at: usize, endian: Endian) -> Result<u32> {
        let b = self.at(at, 4)?;
        Ok(match endian {
            Endian::Little => LittleEndian::read_u32(b),
            Endian::Big => BigEndian::read_u32(b),
        })
    }

    pub fn i32(&self, at: usize, endian: Endian) -> Result<i32> {
        Ok(self.u32(at, endian)? as i32)
    }

    /// Unsigned rational as a quotient. A zero denominator is not guarded
    /// and yields inf or NaN.
    pub fn rational(&self, at: usize, endian: Endian) -> Result<f64> {
        let num = self.u32(at, endian)?;
        let den = self.u32(at + 4, endian)?;
        Ok(num as f64 / den as f64)
    }

    /// Signed rational as a quotient, same zero-denominator rule as `rational`.
    pub fn srational(&self, at: usize, endian: Endian) -> Result<f64> {
        let num = self.i32(at, endian)?;
        let den = self.i32(at + 4, endian)?;
        Ok(num as f64 / den as f64)
    }

    /// Fixed-length byte block, returned as an absolute range
    pub fn bytes(&self, at: usize, len: usize) -> Result<ByteRange> {
        self.at(at, len)?;
        Ok(ByteRange::new(self.offset + at, len))
    }

    /// Fixed-length ASCII block, cut at the first NUL and trimmed
    pub fn ascii(&self, at: usize, len: usize) -> Result<String> {
        let b = self.at(at, len)?;
        let end = b.iter().position(|&c| c == 0).unwrap_or(b.len());
        Ok(String::from_utf8_lossy(&b[..end]).trim().to_string())
    }

    /// True when the view holds `tag` at `at`
    pub fn matches(&self, at: usize, tag: &[u8]) -> bool {
        self.at(at, tag.len()).map(|b| b == tag).unwrap_or(false)
    }

    /// Whether `len` bytes starting at `at` lie inside the base buffer
    pub fn has(&self, at: usize, len: usize) -> bool {
        self.at(at, len).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endian_reads() {
        let view = ByteView::new(vec![0x12, 0x34, 0x56, 0x78]);
        assert_eq!(view.u16(0, Endian::Big).unwrap(), 0x1234);
        assert_eq!(view.u16(0, Endian::Little).unwrap(), 0x3412);
        assert_eq!(view.u32(0, Endian::Big).unwrap(), 0x12345678);
        assert_eq!(view.u32(0, Endian::Little).unwrap(), 0x78563412);
    }

    #[test]
    fn test_signed_reads() {
        let view = ByteView::new(vec![0xFF, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(view.i8(0).unwrap(), -1);
        assert_eq!(view.i16(0, Endian::Big).unwrap(), -2);
        assert_eq!(view.i32(2, Endian::Big).unwrap(), -1);
    }

    #[test]
    fn test_subview_reads_are_relative() {
        let base = ByteView::new(vec![0, 0, 0, 0xAB, 0xCD]);
        let view = base.slice(ByteRange::new(3, 2));
        assert_eq!(view.u16(0, Endian::Big).unwrap(), 0xABCD);
        assert_eq!(view.offset(), 3);
        assert_eq!(view.as_slice(), &[0xAB, 0xCD]);
    }

    #[test]
    fn test_ascii_stops_at_nul_and_trims() {
        let view = ByteView::new(b"  Canon \0garbage".to_vec());
        assert_eq!(view.ascii(0, 16).unwrap(), "Canon");
    }

    #[test]
    fn test_rational_divide_by_zero_propagates() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&0i32.to_be_bytes());
        data.extend_from_slice(&0i32.to_be_bytes());
        let view = ByteView::new(data);
        assert_eq!(view.rational(0, Endian::Big).unwrap(), f64::INFINITY);
        assert!(view.srational(8, Endian::Big).unwrap().is_nan());
    }

    #[test]
    fn test_read_past_buffer_is_fatal() {
        let view = ByteView::new(vec![1, 2, 3]);
        let err = view.u32(0, Endian::Big).unwrap_err();
        assert!(matches!(err, DecodeError::OutOfBounds { at: 0, len: 4, buffer_len: 3 }));
    }

    #[test]
    fn test_window_does_not_bound_reads() {
        // Only the base buffer limits reads, not the view length
        let base = ByteView::new(vec![0, 1, 2, 3]);
        let view = base.slice(ByteRange::new(0, 1));
        assert_eq!(view.u8(3).unwrap(), 3);
    }
}
