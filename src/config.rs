//! Conversion settings.
//!
//! Several behaviors of the converter are policy choices rather than facts about the input file.
//! Each of them is one field of `Config`, and `Config::default()` reproduces the classic
//! converter output.

use crate::prelude::*;

/// Tempo used before (or in absence of) any tempo event: 120 beats per minute.
pub const DEFAULT_TEMPO: u32 = 500_000;

/// How tempo meta events turn ticks into seconds.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum TempoPolicy {
    /// The first tempo event found anywhere sets a single scale for the whole piece.
    /// Further tempo events are reported and ignored.
    Single,
    /// Every tempo event starts a new segment of the tick axis, and seconds accumulate from one
    /// segment to the next.
    ///
    /// Only note times follow the tempo changes. Packed ticks and the emitted tick length keep
    /// the tempo of tick zero, so they drift from the range index after the first change.
    Piecewise,
}

/// Which notes are considered percussion and dropped while merging.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum PercussionFilter {
    /// Drop every note played on this channel (General MIDI uses channel 9, zero-based).
    Channel(u4),
    /// Drop every note whose channel program is 0 when the note ends.
    ProgramZero,
    /// Keep every note.
    Keep,
}

/// Snapping of tick positions before timing resolution.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Quantize {
    /// Keep tick positions as found in the file.
    Off,
    /// Snap to a grid of `ticks_per_quarter / n` ticks and express ticks in grid units.
    Subdivision(u16),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub tempo: TempoPolicy,
    pub percussion: PercussionFilter,
    pub quantize: Quantize,
    /// Tempo in microseconds per quarter note assumed before the first tempo event.
    pub default_tempo: u24,
    /// Length of the analysis window, starting at the first note. Notes outside are dropped.
    pub window_seconds: f64,
    /// How long a note stays audible after its note-off.
    pub release_seconds: f64,
    /// Length of each bucket of the range index.
    pub bucket_seconds: f64,
}
impl Default for Config {
    fn default() -> Config {
        Config {
            tempo: TempoPolicy::Single,
            percussion: PercussionFilter::Channel(u4::new(9)),
            quantize: Quantize::Subdivision(8),
            default_tempo: u24::new(DEFAULT_TEMPO),
            window_seconds: 120.0,
            release_seconds: 1.0,
            bucket_seconds: 1.0,
        }
    }
}
impl Config {
    /// Check that the numeric settings make sense.
    pub fn validate(&self) -> StdResult<(), &'static str> {
        if !(self.bucket_seconds > 0.0) {
            return Err("bucket length must be positive");
        }
        if !(self.window_seconds >= 0.0) {
            return Err("analysis window must not be negative");
        }
        if !(self.release_seconds >= 0.0) {
            return Err("release time must not be negative");
        }
        if self.default_tempo.as_int() == 0 {
            return Err("default tempo must not be zero");
        }
        if self.quantize == Quantize::Subdivision(0) {
            return Err("quantization subdivision must not be zero");
        }
        Ok(())
    }
}
