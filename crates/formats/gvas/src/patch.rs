//! Placeholder-then-backpatch protocol for size-prefixed regions.
//!
//! The size of a property value, a struct-array element run, or a
//! size-prefixed save blob is only known once its payload has been written.
//! [`SizeField::reserve`] writes a zero placeholder and remembers where it
//! went; [`SizeField::patch`] later seeks back, writes the byte count of the
//! payload, and restores the write position. Each field patches only its own
//! slot, so regions nest to any depth.

use crate::cursor::Writer;
use crate::error::{Error, Result};

/// Location of an `i32` size field awaiting its final value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a reserved size field must be patched"]
pub struct SizeField {
    offset: usize,
}

impl SizeField {
    /// Write a zero placeholder at the current position.
    pub fn reserve(w: &mut Writer) -> Self {
        let offset = w.position();
        w.write_i32(0);
        Self { offset }
    }

    /// A field written earlier at `offset`.
    pub(crate) fn at(offset: usize) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Fill in the number of bytes written since `payload_start` and return it.
    pub fn patch(self, w: &mut Writer, payload_start: usize) -> Result<i32> {
        w.go_back(self.offset, |w, head| {
            let size = head
                .checked_sub(payload_start)
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| Error::Parse {
                    context: "size patch",
                    message: format!(
                        "payload start {payload_start:#x} is past write head {head:#x}"
                    ),
                })?;
            w.write_i32(size);
            Ok(size)
        })
    }
}
