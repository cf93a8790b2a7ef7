//! Pairing of note-on and note-off events into note intervals.

use crate::{
    config::PercussionFilter,
    event::{EventKind, MidiMessage, RawEvent, PAN_CONTROLLER},
    prelude::*,
    smf::Track,
};

/// A note with a start, an end, and the channel state it was played with.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct NoteInterval {
    pub time_begin: f64,
    pub time_end: f64,
    pub tick_begin: u32,
    /// Always greater than `tick_begin`.
    pub tick_end: u32,
    pub channel: u4,
    /// The channel program when the note ended. Rewritten to a dense index by the program
    /// remapper.
    pub program: u7,
    pub note: u7,
    /// Velocity of the note-on.
    pub velocity: u7,
    /// The channel panning when the note ended.
    pub panning: u7,
}
impl NoteInterval {
    /// Length of the note in ticks.
    #[inline]
    pub fn duration_ticks(&self) -> u32 {
        self.tick_end - self.tick_begin
    }

    /// Whether the note, extended by `release` seconds after its end, is audible at some point
    /// of `[from, to]`.
    #[inline]
    pub fn overlaps(&self, from: f64, to: f64, release: f64) -> bool {
        from <= self.time_end + release && to >= self.time_begin
    }
}

/// Mutable per-channel state while scanning a track.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ChannelState {
    pub program: u7,
    pub panning: u7,
}
impl Default for ChannelState {
    fn default() -> ChannelState {
        ChannelState {
            program: u7::new(0),
            panning: u7::new(64),
        }
    }
}

/// A note-on still waiting for its note-off.
#[derive(Copy, Clone, Debug)]
struct OpenNote {
    channel: u4,
    key: u7,
    vel: u7,
    tick: u32,
    time: f64,
}

/// Merges the events of a single track.
///
/// Channel states and open notes only live for the duration of one track.
struct TrackMerger {
    percussion: PercussionFilter,
    channels: [ChannelState; 16],
    open: Vec<OpenNote>,
    unmatched: usize,
}
impl TrackMerger {
    fn new(percussion: PercussionFilter) -> TrackMerger {
        TrackMerger {
            percussion,
            channels: [ChannelState::default(); 16],
            open: Vec::new(),
            unmatched: 0,
        }
    }

    fn feed(&mut self, ev: &RawEvent, out: &mut Vec<NoteInterval>) {
        let msg = match ev.kind {
            EventKind::Midi(msg) => msg,
            EventKind::Tempo(_) => return,
        };
        let state = &mut self.channels[ev.channel.as_int() as usize];
        match msg {
            MidiMessage::NoteOn { key, vel } => self.open.push(OpenNote {
                channel: ev.channel,
                key,
                vel,
                tick: ev.tick,
                time: ev.time,
            }),
            MidiMessage::NoteOff { key, .. } => {
                let idx = match self
                    .open
                    .iter()
                    .position(|on| on.channel == ev.channel && on.key == key)
                {
                    Some(idx) => idx,
                    None => {
                        self.unmatched += 1;
                        return;
                    }
                };
                let on = self.open.remove(idx);
                let ChannelState { program, panning } = *state;
                let dropped = match self.percussion {
                    PercussionFilter::Channel(channel) => ev.channel == channel,
                    PercussionFilter::ProgramZero => program.as_int() == 0,
                    PercussionFilter::Keep => false,
                };
                if dropped {
                    return;
                }
                let mut tick_end = ev.tick;
                if tick_end == on.tick {
                    tick_end += 1;
                }
                out.push(NoteInterval {
                    time_begin: on.time,
                    time_end: ev.time,
                    tick_begin: on.tick,
                    tick_end,
                    channel: ev.channel,
                    program,
                    note: key,
                    velocity: on.vel,
                    panning,
                });
            }
            MidiMessage::ProgramChange { program } => state.program = program,
            MidiMessage::Controller { controller, value } => {
                if controller.as_int() == PAN_CONTROLLER {
                    state.panning = value;
                }
            }
            MidiMessage::PitchBend { .. } => {}
        }
    }
}

/// Merge a single track, appending its note intervals to `out` in note-off order.
pub fn merge_track(track: &Track, percussion: PercussionFilter, out: &mut Vec<NoteInterval>) {
    let mut merger = TrackMerger::new(percussion);
    for ev in track.events.iter() {
        merger.feed(ev, out);
    }
    if merger.unmatched > 0 {
        log::debug!(
            "track {}: discarded {} note-off(s) without a matching note-on",
            track.index,
            merger.unmatched
        );
    }
    if !merger.open.is_empty() {
        log::debug!(
            "track {}: discarded {} note-on(s) never released",
            track.index,
            merger.open.len()
        );
    }
}

/// Merge every track and sort the result by start time.
///
/// The sort is stable: notes starting at the same time keep track order, then note-off order.
pub fn merge(tracks: &[Track], percussion: PercussionFilter) -> Vec<NoteInterval> {
    let mut merged = Vec::new();
    for track in tracks {
        merge_track(track, percussion, &mut merged);
    }
    merged.sort_by(|a, b| a.time_begin.total_cmp(&b.time_begin));
    merged
}

/// Keep only the notes audible within `window` seconds from the start of the first note, then
/// shift every note so the first one starts at time zero and tick zero.
///
/// `notes` must be sorted by start time.
pub fn clip_to_window(notes: &mut Vec<NoteInterval>, window: f64, release: f64) {
    let first = match notes.first() {
        Some(first) => *first,
        None => return,
    };
    let (from, to) = (first.time_begin, first.time_begin + window);
    let before = notes.len();
    notes.retain(|note| note.overlaps(from, to, release));
    if notes.len() < before {
        log::info!(
            "dropped {} note(s) outside the {}s analysis window",
            before - notes.len(),
            window
        );
    }
    for note in notes.iter_mut() {
        note.time_begin -= first.time_begin;
        note.time_end -= first.time_begin;
        note.tick_begin = note.tick_begin.saturating_sub(first.tick_begin);
        note.tick_end = note.tick_end.saturating_sub(first.tick_begin);
    }
}
