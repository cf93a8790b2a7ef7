//! # Overview
//!
//! `shadermidi` converts Standard Midi Files (.mid) into compact arrays meant to be embedded in
//! a GPU shader for audio-visual playback.
//!
//! Conversion happens in a fixed sequence of stages, each one in its own module:
//!
//! - Decoding: the SMF container and its track chunks, including variable-length integers and
//!   running status (`Smf::parse`).
//! - Timing: optional quantization of tick positions, then resolution of ticks into seconds
//!   through the tempo map (`timing`).
//! - Merging: note-on and note-off messages are paired per channel into note intervals, carrying
//!   the channel program and panning (`merge`).
//! - Indexing: programs are renumbered densely (`remap`) and a per-second range index of audible
//!   notes is built (`range`).
//! - Packing: every note is packed into a single 32-bit word (`pack`).
//!
//! The [`convert`](fn.convert.html) function runs the whole pipeline:
//!
//! ```rust
//! use shadermidi::{convert, Config};
//!
//! let bytes = [
//!     b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0,
//!     b'M', b'T', b'r', b'k', 0, 0, 0, 13,
//!     0x00, 0x90, 60, 100,
//!     0x83, 0x60, 0x80, 60, 64,
//!     0x00, 0xFF, 0x2F, 0x00,
//! ];
//! let conv = convert(&bytes, &Config::default()).unwrap();
//! assert_eq!(conv.words.len(), 1);
//! assert_eq!(conv.words[0].note().as_int(), 60);
//! ```
//!
//! The result can then be written out as GLSL source with `glsl::write_shader`, together with
//! an OPL2 instrument bank loaded by `InstrumentBank::parse`.
//!
//! # About features
//!
//! - The `parallel` feature (enabled by default) decodes track chunks in parallel through
//!   `rayon`.
//!
//! - The `strict` feature
//!
//!   By default the decoder plows through slightly non-standard files, masking data bytes with
//!   their top bit set and skipping extra header bytes. With the `strict` feature such files are
//!   rejected with `ErrorKind::MalformedContainer`.
//!
//! # Logging
//!
//! Data-quality anomalies (unmatched note-offs, repeated tempo events, programs or ticks that do
//! not fit the packed encoding) are not errors. They are reported through the `log` facade and
//! resolved by the policies in [`Config`](struct.Config.html).

macro_rules! bail {
    ($err:expr) => {{
        return Err($err.into());
    }};
}
macro_rules! ensure {
    ($cond:expr, $err:expr) => {{
        if !$cond {
            bail!($err)
        }
    }};
}

/// All of the errors this crate produces.
#[macro_use]
mod error;

mod prelude {
    pub(crate) use crate::{
        error::{ErrorKind, Result, ResultExt, StdResult},
        primitive::{u24, u4, u7, IntRead},
    };
    pub(crate) use core::{fmt, mem, ops};

    pub(crate) fn bit_range<T>(val: T, range: ops::Range<u32>) -> T
    where
        T: From<u8>
            + ops::Shr<u32, Output = T>
            + ops::Shl<u32, Output = T>
            + ops::Not<Output = T>
            + ops::BitAnd<Output = T>,
    {
        let mask = !((!T::from(0)) << (range.end - range.start));
        (val >> range.start) & mask
    }
}

mod event;
mod primitive;
mod smf;

pub mod bank;
pub mod config;
pub mod convert;
pub mod glsl;
pub mod instrument;
pub mod merge;
pub mod pack;
pub mod range;
pub mod remap;
pub mod timing;

pub use crate::{
    bank::InstrumentBank,
    config::Config,
    convert::{convert, Conversion},
    error::{Error, ErrorKind, Result},
    event::{
        EventIter, EventKind, MetaMessage, MidiMessage, RawEvent, TrackEvent, TrackEventKind,
        PAN_CONTROLLER,
    },
    merge::NoteInterval,
    pack::PackedNote,
    primitive::{encode_varlen, read_varlen, Cursor, Format},
    range::RangeBucket,
    remap::ProgramMap,
    smf::{Header, Smf, Track},
    timing::TimeBase,
};

/// Exotically-sized integers used by the MIDI standard.
pub mod num {
    pub use crate::primitive::{u24, u4, u7};
}
