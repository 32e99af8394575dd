use crate::error::{Error, Result};
use crate::string::FString;

/// Growth step for the writer's backing buffer.
const WRITE_CHUNK: usize = 64 * 1024;

/// Symmetric primitive I/O shared by the read and write cursors.
///
/// Every primitive takes its value in place: a reading archive overwrites
/// `*v` with what it decodes, a writing archive encodes `*v` unchanged. A
/// codec written once against this trait therefore runs in both directions.
/// All multi-byte values are little-endian.
pub trait Archive {
    fn is_reading(&self) -> bool;

    /// Current byte position.
    fn position(&self) -> usize;

    /// Length of the underlying data (bytes written so far, for a writer).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seek to an absolute position.
    fn seek(&mut self, pos: usize) -> Result<()>;

    fn u8(&mut self, v: &mut u8) -> Result<()>;
    fn i8(&mut self, v: &mut i8) -> Result<()>;
    fn u16(&mut self, v: &mut u16) -> Result<()>;
    fn i16(&mut self, v: &mut i16) -> Result<()>;
    fn u32(&mut self, v: &mut u32) -> Result<()>;
    fn i32(&mut self, v: &mut i32) -> Result<()>;
    fn u64(&mut self, v: &mut u64) -> Result<()>;
    fn i64(&mut self, v: &mut i64) -> Result<()>;
    fn f32(&mut self, v: &mut f32) -> Result<()>;
    fn f64(&mut self, v: &mut f64) -> Result<()>;

    /// Raw byte range. Reading replaces `v` with `len` bytes; writing ignores
    /// `len` and emits `v` as-is.
    fn bytes(&mut self, v: &mut Vec<u8>, len: usize) -> Result<()>;

    /// Length-prefixed string.
    fn fstring(&mut self, v: &mut FString) -> Result<()>;

    /// Backpatch the i32 size field at `field` with the number of bytes
    /// written since `payload_start`. Reading archives have nothing to patch.
    fn patch_size(&mut self, field: usize, payload_start: usize) -> Result<()>;
}

/// Read cursor over a byte slice. All reads are little-endian.
#[derive(Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of underlying data.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether every byte has been consumed.
    pub fn is_eof(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Remaining bytes from current position.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Seek to an absolute position inside `[0, len)`.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos >= self.data.len() {
            return Err(Error::SeekOutOfBounds {
                pos,
                len: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Read a slice of `n` bytes without copying.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Slice of the underlying data, clamped to its bounds.
    pub fn peek_range(&self, start: usize, end: usize) -> &'a [u8] {
        let end = end.min(self.data.len());
        &self.data[start.min(end)..end]
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::UnexpectedEof {
                offset: self.pos,
                need: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }
}

/// Writer that builds a byte buffer. All writes are little-endian.
///
/// The backing buffer grows in chunks ahead of the write position, so the
/// position can always be seeked back to after a backpatch.
pub struct Writer {
    buf: Vec<u8>,
    pos: usize,
    end: usize,
}

impl Writer {
    pub fn new() -> Self {
        Self::with_capacity(WRITE_CHUNK)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: vec![0; cap.max(1)],
            pos: 0,
            end: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes written (the high-water mark, not the position).
    pub fn len(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    /// Seek to an absolute position inside the written region.
    ///
    /// The append point (`len()`) is a valid target.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.end {
            return Err(Error::SeekOutOfBounds { pos, len: self.end });
        }
        self.pos = pos;
        Ok(())
    }

    /// Temporarily seek to `pos`, run `f`, then restore the position.
    ///
    /// `f` receives the position that will be restored.
    pub fn go_back<T>(
        &mut self,
        pos: usize,
        f: impl FnOnce(&mut Self, usize) -> Result<T>,
    ) -> Result<T> {
        let head = self.pos;
        self.seek(pos)?;
        let out = f(self, head)?;
        self.seek(head)?;
        Ok(out)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        self.end = self.end.max(self.pos);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u16(&mut self, v: u16) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i16(&mut self, v: i16) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_f64(&mut self, v: f64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.buf.truncate(self.end);
        self.buf
    }

    /// Keep the buffer strictly larger than `pos + n`.
    fn reserve(&mut self, n: usize) {
        let needed = self.pos + n;
        if needed >= self.buf.len() {
            let grown = (self.buf.len() * 2).max(needed + WRITE_CHUNK);
            self.buf.resize(grown, 0);
        }
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Archive for Reader<'_> {
    fn is_reading(&self) -> bool {
        true
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn seek(&mut self, pos: usize) -> Result<()> {
        Reader::seek(self, pos)
    }

    fn u8(&mut self, v: &mut u8) -> Result<()> {
        *v = self.read_u8()?;
        Ok(())
    }

    fn i8(&mut self, v: &mut i8) -> Result<()> {
        *v = self.read_i8()?;
        Ok(())
    }

    fn u16(&mut self, v: &mut u16) -> Result<()> {
        *v = self.read_u16()?;
        Ok(())
    }

    fn i16(&mut self, v: &mut i16) -> Result<()> {
        *v = self.read_i16()?;
        Ok(())
    }

    fn u32(&mut self, v: &mut u32) -> Result<()> {
        *v = self.read_u32()?;
        Ok(())
    }

    fn i32(&mut self, v: &mut i32) -> Result<()> {
        *v = self.read_i32()?;
        Ok(())
    }

    fn u64(&mut self, v: &mut u64) -> Result<()> {
        *v = self.read_u64()?;
        Ok(())
    }

    fn i64(&mut self, v: &mut i64) -> Result<()> {
        *v = self.read_i64()?;
        Ok(())
    }

    fn f32(&mut self, v: &mut f32) -> Result<()> {
        *v = self.read_f32()?;
        Ok(())
    }

    fn f64(&mut self, v: &mut f64) -> Result<()> {
        *v = self.read_f64()?;
        Ok(())
    }

    fn bytes(&mut self, v: &mut Vec<u8>, len: usize) -> Result<()> {
        *v = self.read_bytes(len)?.to_vec();
        Ok(())
    }

    fn fstring(&mut self, v: &mut FString) -> Result<()> {
        *v = FString::read(self)?;
        Ok(())
    }

    fn patch_size(&mut self, _field: usize, _payload_start: usize) -> Result<()> {
        Ok(())
    }
}

impl Archive for Writer {
    fn is_reading(&self) -> bool {
        false
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn len(&self) -> usize {
        self.end
    }

    fn seek(&mut self, pos: usize) -> Result<()> {
        Writer::seek(self, pos)
    }

    fn u8(&mut self, v: &mut u8) -> Result<()> {
        self.write_u8(*v);
        Ok(())
    }

    fn i8(&mut self, v: &mut i8) -> Result<()> {
        self.write_i8(*v);
        Ok(())
    }

    fn u16(&mut self, v: &mut u16) -> Result<()> {
        self.write_u16(*v);
        Ok(())
    }

    fn i16(&mut self, v: &mut i16) -> Result<()> {
        self.write_i16(*v);
        Ok(())
    }

    fn u32(&mut self, v: &mut u32) -> Result<()> {
        self.write_u32(*v);
        Ok(())
    }

    fn i32(&mut self, v: &mut i32) -> Result<()> {
        self.write_i32(*v);
        Ok(())
    }

    fn u64(&mut self, v: &mut u64) -> Result<()> {
        self.write_u64(*v);
        Ok(())
    }

    fn i64(&mut self, v: &mut i64) -> Result<()> {
        self.write_i64(*v);
        Ok(())
    }

    fn f32(&mut self, v: &mut f32) -> Result<()> {
        self.write_f32(*v);
        Ok(())
    }

    fn f64(&mut self, v: &mut f64) -> Result<()> {
        self.write_f64(*v);
        Ok(())
    }

    fn bytes(&mut self, v: &mut Vec<u8>, _len: usize) -> Result<()> {
        self.write_bytes(v);
        Ok(())
    }

    fn fstring(&mut self, v: &mut FString) -> Result<()> {
        v.write(self)
    }

    fn patch_size(&mut self, field: usize, payload_start: usize) -> Result<()> {
        crate::patch::SizeField::at(field).patch(self, payload_start)?;
        Ok(())
    }
}

/// Implement [`Archive`] for a type by forwarding to one of its cursor fields.
macro_rules! forward_archive {
    ($ty:ty, $field:ident) => {
        impl $crate::cursor::Archive for $ty {
            fn is_reading(&self) -> bool {
                $crate::cursor::Archive::is_reading(&self.$field)
            }
            fn position(&self) -> usize {
                $crate::cursor::Archive::position(&self.$field)
            }
            fn len(&self) -> usize {
                $crate::cursor::Archive::len(&self.$field)
            }
            fn seek(&mut self, pos: usize) -> $crate::error::Result<()> {
                $crate::cursor::Archive::seek(&mut self.$field, pos)
            }
            fn u8(&mut self, v: &mut u8) -> $crate::error::Result<()> {
                $crate::cursor::Archive::u8(&mut self.$field, v)
            }
            fn i8(&mut self, v: &mut i8) -> $crate::error::Result<()> {
                $crate::cursor::Archive::i8(&mut self.$field, v)
            }
            fn u16(&mut self, v: &mut u16) -> $crate::error::Result<()> {
                $crate::cursor::Archive::u16(&mut self.$field, v)
            }
            fn i16(&mut self, v: &mut i16) -> $crate::error::Result<()> {
                $crate::cursor::Archive::i16(&mut self.$field, v)
            }
            fn u32(&mut self, v: &mut u32) -> $crate::error::Result<()> {
                $crate::cursor::Archive::u32(&mut self.$field, v)
            }
            fn i32(&mut self, v: &mut i32) -> $crate::error::Result<()> {
                $crate::cursor::Archive::i32(&mut self.$field, v)
            }
            fn u64(&mut self, v: &mut u64) -> $crate::error::Result<()> {
                $crate::cursor::Archive::u64(&mut self.$field, v)
            }
            fn i64(&mut self, v: &mut i64) -> $crate::error::Result<()> {
                $crate::cursor::Archive::i64(&mut self.$field, v)
            }
            fn f32(&mut self, v: &mut f32) -> $crate::error::Result<()> {
                $crate::cursor::Archive::f32(&mut self.$field, v)
            }
            fn f64(&mut self, v: &mut f64) -> $crate::error::Result<()> {
                $crate::cursor::Archive::f64(&mut self.$field, v)
            }
            fn bytes(&mut self, v: &mut Vec<u8>, len: usize) -> $crate::error::Result<()> {
                $crate::cursor::Archive::bytes(&mut self.$field, v, len)
            }
            fn fstring(
                &mut self,
                v: &mut $crate::string::FString,
            ) -> $crate::error::Result<()> {
                $crate::cursor::Archive::fstring(&mut self.$field, v)
            }
            fn patch_size(
                &mut self,
                field: usize,
                payload_start: usize,
            ) -> $crate::error::Result<()> {
                $crate::cursor::Archive::patch_size(&mut self.$field, field, payload_start)
            }
        }
    };
}

pub(crate) use forward_archive;
