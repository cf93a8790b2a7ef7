//! Bit-exact packing of note intervals into single 32-bit words.
//!
//! Fields are laid out from the low bit up:
//!
//! | Bits      | Field                                     |
//! |-----------|-------------------------------------------|
//! | `0..11`   | start tick                                |
//! | `11..18`  | duration in ticks                         |
//! | `18..25`  | note number                               |
//! | `25..28`  | dense program index                       |
//! | `28..31`  | velocity, top 3 of its 7 bits             |
//!
//! Values are masked to their field width, never range-checked: overflowing fields silently wrap
//! around. `encode_all` counts and logs such overflows.

use crate::{merge::NoteInterval, prelude::*};

pub const BITS_TICK_BEGIN: u32 = 11;
pub const BITS_DURATION: u32 = 7;
pub const BITS_NOTE: u32 = 7;
pub const BITS_PROGRAM: u32 = 3;
pub const BITS_VELOCITY: u32 = 3;

pub const OFFSET_TICK_BEGIN: u32 = 0;
pub const OFFSET_DURATION: u32 = OFFSET_TICK_BEGIN + BITS_TICK_BEGIN;
pub const OFFSET_NOTE: u32 = OFFSET_DURATION + BITS_DURATION;
pub const OFFSET_PROGRAM: u32 = OFFSET_NOTE + BITS_NOTE;
pub const OFFSET_VELOCITY: u32 = OFFSET_PROGRAM + BITS_PROGRAM;

#[inline]
const fn mask(bits: u32) -> u32 {
    (1 << bits) - 1
}

/// A note interval packed into one word.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Default)]
#[repr(transparent)]
pub struct PackedNote(pub u32);
impl PackedNote {
    /// Pack raw field values, masking each one to its width.
    ///
    /// `velocity` is the full 7-bit MIDI velocity, only its top 3 bits are kept.
    #[inline]
    pub fn encode(tick_begin: u32, duration: u32, note: u7, program: u7, velocity: u7) -> PackedNote {
        let velocity = velocity.as_int() as u32 >> (7 - BITS_VELOCITY);
        PackedNote(
            (tick_begin & mask(BITS_TICK_BEGIN)) << OFFSET_TICK_BEGIN
                | (duration & mask(BITS_DURATION)) << OFFSET_DURATION
                | (note.as_int() as u32 & mask(BITS_NOTE)) << OFFSET_NOTE
                | (program.as_int() as u32 & mask(BITS_PROGRAM)) << OFFSET_PROGRAM
                | (velocity & mask(BITS_VELOCITY)) << OFFSET_VELOCITY,
        )
    }

    #[inline]
    pub fn tick_begin(self) -> u32 {
        bit_range(self.0, OFFSET_TICK_BEGIN..OFFSET_DURATION)
    }

    #[inline]
    pub fn duration(self) -> u32 {
        bit_range(self.0, OFFSET_DURATION..OFFSET_NOTE)
    }

    #[inline]
    pub fn note(self) -> u7 {
        u7::new(bit_range(self.0, OFFSET_NOTE..OFFSET_PROGRAM) as u8)
    }

    /// Dense program index.
    #[inline]
    pub fn program(self) -> u8 {
        bit_range(self.0, OFFSET_PROGRAM..OFFSET_VELOCITY) as u8
    }

    /// The top 3 bits of the velocity, in `0..8`.
    #[inline]
    pub fn velocity(self) -> u8 {
        bit_range(self.0, OFFSET_VELOCITY..OFFSET_VELOCITY + BITS_VELOCITY) as u8
    }
}
impl From<&NoteInterval> for PackedNote {
    #[inline]
    fn from(note: &NoteInterval) -> PackedNote {
        PackedNote::encode(
            note.tick_begin,
            note.duration_ticks(),
            note.note,
            note.program,
            note.velocity,
        )
    }
}
impl From<PackedNote> for u32 {
    #[inline]
    fn from(packed: PackedNote) -> u32 {
        packed.0
    }
}
impl fmt::Display for PackedNote {
    /// Formats the word as a GLSL unsigned literal.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:08X}u", self.0)
    }
}

/// Pack every note, in order.
///
/// Start ticks and durations too large for their fields are still packed (wrapped), and a warning
/// with the amount of affected notes is logged.
pub fn encode_all(notes: &[NoteInterval]) -> Vec<PackedNote> {
    let mut tick_overflows = 0;
    let mut duration_overflows = 0;
    let words = notes
        .iter()
        .map(|note| {
            if note.tick_begin > mask(BITS_TICK_BEGIN) {
                tick_overflows += 1;
            }
            if note.duration_ticks() > mask(BITS_DURATION) {
                duration_overflows += 1;
            }
            PackedNote::from(note)
        })
        .collect();
    if tick_overflows > 0 {
        log::warn!(
            "{} note(s) start past tick {} and wrap around",
            tick_overflows,
            mask(BITS_TICK_BEGIN)
        );
    }
    if duration_overflows > 0 {
        log::warn!(
            "{} note(s) last longer than {} ticks and wrap around",
            duration_overflows,
            mask(BITS_DURATION)
        );
    }
    words
}
