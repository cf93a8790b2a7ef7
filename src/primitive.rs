//! Simple building-block data that can be read in one go.
//! All primitives have a known, fixed size, except for variable-length integers.
//! Also, primitives advance the cursor when read.

use crate::prelude::*;

/// A sequential reader over an in-memory byte buffer, with an explicit position.
///
/// Reads never go past the end of the buffer: they return `None` (or a `TruncatedStream` error)
/// and leave the position untouched.
#[derive(Copy, Clone, Debug)]
pub struct Cursor<'a> {
    raw: &'a [u8],
    pos: usize,
}
impl<'a> Cursor<'a> {
    #[inline]
    pub fn new(raw: &'a [u8]) -> Cursor<'a> {
        Cursor { raw, pos: 0 }
    }

    /// Current byte offset from the start of the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Amount of bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.raw.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The bytes that have not been read yet.
    #[inline]
    pub fn unread(&self) -> &'a [u8] {
        &self.raw[self.pos..]
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.raw.get(self.pos).copied()
    }

    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Extract the next `len` bytes, advancing past them.
    #[inline]
    pub fn split(&mut self, len: usize) -> Option<&'a [u8]> {
        if len > self.remaining() {
            None
        } else {
            let extracted = &self.raw[self.pos..self.pos + len];
            self.pos += len;
            Some(extracted)
        }
    }

    /// Move the position back by `count` bytes, never before the start of the buffer.
    #[inline]
    pub fn rewind(&mut self, count: usize) {
        self.pos = self.pos.saturating_sub(count);
    }
}

/// Implemented on integer types for reading as big-endian.
pub(crate) trait IntRead: Sized {
    /// Reads a big-endian integer.
    fn read(raw: &mut Cursor) -> StdResult<Self, ErrorKind>;
}

/// Implement simple big endian integer reads.
macro_rules! impl_read_int {
    {$( $int:ty ),*} => {
        $(
            impl IntRead for $int {
                #[inline]
                fn read(raw: &mut Cursor) -> StdResult<$int, ErrorKind> {
                    let bytes = raw.split(mem::size_of::<$int>())
                        .ok_or(err_truncated!("failed to read the expected integer"))?;
                    Ok(bytes.iter().fold(0, |acc, byte| {
                        acc.checked_shl(8).unwrap_or(0) | *byte as $int
                    }))
                }
            }
        )*
    }
}
impl_read_int! {u8,u16,u32}

/// Slightly restricted integers.
macro_rules! restricted_int {
    {$(#[$attr:meta])* $name:ident : $inner:tt => $bits:expr} => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
        #[repr(transparent)]
        #[allow(non_camel_case_types)]
        pub struct $name($inner);
        impl From<$inner> for $name {
            /// Lossy conversion, loses the top bits.
            #[inline]
            fn from(raw: $inner) -> $name {
                $name::new(raw)
            }
        }
        impl From<$name> for $inner {
            #[inline]
            fn from(restricted: $name) -> $inner {restricted.0}
        }
        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
        impl $name {
            const MASK: $inner = (1 << $bits) - 1;

            /// The maximum value that this restricted integer can hold.
            #[inline]
            pub const fn max_value() -> $name {
                $name(Self::MASK)
            }

            /// Creates a restricted int from its non-restricted counterpart by masking off the
            /// extra bits.
            #[inline]
            pub const fn new(raw: $inner) -> $name {
                $name(raw & Self::MASK)
            }

            /// Returns `Some` if the raw integer is within range of the restricted integer, and
            /// `None` otherwise.
            #[inline]
            pub fn try_from(raw: $inner) -> Option<$name> {
                if raw <= Self::MASK {
                    Some($name(raw))
                } else {
                    None
                }
            }

            /// Get the inner integer out of the wrapper.
            #[inline]
            pub fn as_int(self) -> $inner {
                self.0
            }
        }
        impl PartialEq<$inner> for $name {
            fn eq(&self, rhs: &$inner) -> bool {
                self.as_int() == *rhs
            }
        }
    };
}
restricted_int! {
    /// A 7-bit integer type, as carried by MIDI data bytes.
    ///
    /// Wraps the `u8` type and ensures that the top bit is always zero.
    u7: u8 => 7
}
restricted_int! {
    /// A 4-bit integer type, used for MIDI channels.
    ///
    /// Wraps the `u8` type and ensures that the top 4 bits are always zero.
    u4: u8 => 4
}
restricted_int! {
    /// A 24-bit integer type, used for tempo values in microseconds per quarter note.
    ///
    /// Wraps the `u32` type and ensures that the top 8 bits are always zero.
    u24: u32 => 24
}

impl IntRead for u7 {
    #[inline]
    fn read(raw: &mut Cursor) -> StdResult<u7, ErrorKind> {
        let byte = raw
            .read_u8()
            .ok_or(err_truncated!("failed to read data byte"))?;
        if cfg!(feature = "strict") {
            Ok(u7::try_from(byte).ok_or(err_malformed!("data byte with top bit set"))?)
        } else {
            //Throw away the extra bit
            Ok(u7::new(byte))
        }
    }
}

impl IntRead for u24 {
    fn read(raw: &mut Cursor) -> StdResult<u24, ErrorKind> {
        let bytes = raw
            .split(3)
            .ok_or(err_truncated!("failed to read u24 bytes"))?;
        //Using lossy `new` because value is guaranteed to be 24 bits (3 bytes)
        Ok(u24::new(
            bytes.iter().fold(0, |acc, byte| acc << 8 | *byte as u32),
        ))
    }
}

/// Maximum amount of bytes a variable-length integer may span.
const VARLEN_MAX_BYTES: usize = 5;

/// Read a variable-length integer: 7 bits per byte, most significant group first, with the top
/// bit of each byte flagging that another byte follows.
///
/// Up to 4 continuation bytes are accepted. A continuation flag on the 5th byte, or a value that
/// does not fit in 32 bits, is a `ValueTooLarge` error.
pub fn read_varlen(raw: &mut Cursor) -> StdResult<u32, ErrorKind> {
    let mut int: u32 = 0;
    for _ in 0..VARLEN_MAX_BYTES {
        let byte = raw
            .read_u8()
            .ok_or(err_truncated!("unexpected eof while reading varlen int"))?;
        ensure!(int >> 25 == 0, ErrorKind::ValueTooLarge);
        int = int << 7 | bit_range(byte, 0..7) as u32;
        if bit_range(byte, 7..8) == 0 {
            return Ok(int);
        }
    }
    Err(ErrorKind::ValueTooLarge)
}

/// Encode an integer using the variable-length encoding understood by `read_varlen`.
///
/// Leading zero groups are skipped, so small values take a single byte.
pub fn encode_varlen(int: u32, out: &mut Vec<u8>) {
    let mut skipping = true;
    for i in (0..VARLEN_MAX_BYTES).rev() {
        let byte = ((int as u64 >> (i * 7)) & 0x7F) as u8;
        if skipping && byte == 0 && i != 0 {
            //Skip these leading zeros
        } else {
            skipping = false;
            out.push(if i == 0 { byte } else { byte | 0x80 });
        }
    }
}

/// Reads a slice represented in the input as a varlen `len` followed by `len` bytes.
pub(crate) fn read_varlen_slice<'a>(raw: &mut Cursor<'a>) -> Result<&'a [u8]> {
    let len = read_varlen(raw).context("reading varlen slice length")?;
    Ok(raw
        .split(len as usize)
        .ok_or(err_truncated!("incomplete varlen slice"))?)
}

/// The order in which tracks should be laid out when playing back this SMF file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Format {
    /// This file should have a single track only.
    SingleTrack,
    /// This file has several tracks that should be played simultaneously.
    ///
    /// Usually the first track controls tempo and other song metadata.
    Parallel,
    /// This file has several tracks, each one a separate song.
    Sequential,
}
impl Format {
    pub(crate) fn read(raw: &mut Cursor) -> Result<Format> {
        let format = u16::read(raw)?;
        Ok(match format {
            0 => Format::SingleTrack,
            1 => Format::Parallel,
            2 => Format::Sequential,
            _ => bail!(err_malformed!("invalid smf format")),
        })
    }
}
