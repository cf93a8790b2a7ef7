//! The whole conversion pipeline, from file bytes to the packed arrays.

use crate::{
    config::{Config, Quantize},
    merge::{self, NoteInterval},
    pack::{self, PackedNote},
    prelude::*,
    range::{self, RangeBucket},
    remap::ProgramMap,
    smf::Smf,
    timing::{self, TimeBase},
};

/// Everything produced by converting one file.
#[derive(Clone, Debug, PartialEq)]
pub struct Conversion {
    /// Note intervals in start order, shifted so the first one starts at zero, with their
    /// programs rewritten to dense indices.
    pub notes: Vec<NoteInterval>,
    /// One packed word per note, in the same order.
    pub words: Vec<PackedNote>,
    /// Dense program table.
    pub programs: ProgramMap,
    /// Range index over `notes`.
    pub ranges: Vec<RangeBucket>,
    /// Time base of the tick values in `notes` and `words`.
    pub time_base: TimeBase,
    /// Names of the decoded tracks, in file order. Unnamed tracks have an empty name.
    pub track_names: Vec<String>,
}
impl Conversion {
    /// Length of one packed tick under the tempo in force at tick zero.
    ///
    /// Under `TempoPolicy::Piecewise` this is wrong for notes after the first tempo change.
    #[inline]
    pub fn seconds_per_tick(&self) -> f64 {
        self.time_base.seconds_per_tick()
    }

    #[inline]
    pub fn ticks_per_second(&self) -> f64 {
        self.time_base.ticks_per_second()
    }

    /// Average panning of the notes played with a dense program, rounded down.
    ///
    /// Programs without notes are centered (64).
    pub fn average_panning(&self, dense: u7) -> u7 {
        let (sum, count) = self
            .notes
            .iter()
            .filter(|note| note.program == dense)
            .fold((0u32, 0u32), |(sum, count), note| {
                (sum + note.panning.as_int() as u32, count + 1)
            });
        if count == 0 {
            u7::new(64)
        } else {
            u7::new((sum / count) as u8)
        }
    }
}

/// Convert a Standard Midi File held in memory.
///
/// Stages run in order: decode, quantize, resolve timing, merge, clip to the analysis window,
/// build the range index, remap programs and pack. Only decoding can fail; data anomalies are
/// logged and resolved by the policies in `config`.
///
/// The numeric settings of `config` are assumed to pass `Config::validate`.
pub fn convert(raw: &[u8], config: &Config) -> Result<Conversion> {
    let mut smf = Smf::parse(raw).context("decoding midi file")?;
    let quantum = match config.quantize {
        Quantize::Off => 1,
        Quantize::Subdivision(subdivision) => timing::quantize(&mut smf, subdivision),
    };
    let time_base = timing::resolve(&mut smf, config.tempo, config.default_tempo, quantum);

    let mut notes = merge::merge(&smf.tracks, config.percussion);
    if let Some(last) = notes.iter().map(|note| note.tick_end).max() {
        log::info!("last note end tick: {}", last);
    }
    if let Some(longest) = notes.iter().map(NoteInterval::duration_ticks).max() {
        log::info!("longest note duration: {} ticks", longest);
    }
    merge::clip_to_window(&mut notes, config.window_seconds, config.release_seconds);

    let ranges = range::build(&notes, config.bucket_seconds, config.release_seconds);
    let programs = ProgramMap::remap(&mut notes);
    let words = pack::encode_all(&notes);
    log::debug!(
        "{} note(s), {} program(s), {} range bucket(s)",
        notes.len(),
        programs.len(),
        ranges.len()
    );
    if notes.is_empty() {
        log::warn!("no playable notes found");
    }

    Ok(Conversion {
        notes,
        words,
        programs,
        ranges,
        time_base,
        track_names: smf.tracks.into_iter().map(|track| track.name).collect(),
    })
}
