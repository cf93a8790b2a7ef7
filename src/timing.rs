//! Conversion of tick positions into seconds.

use crate::{
    config::TempoPolicy,
    event::{EventKind, RawEvent},
    prelude::*,
    smf::Smf,
};

/// The time base of a resolved file.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TimeBase {
    /// Ticks per quarter note as declared by the header.
    pub ticks_per_quarter: u16,
    /// How many original ticks make up one tick after quantization. 1 if not quantized.
    pub quantum: u32,
    /// Tempo in force at tick zero, in microseconds per quarter note.
    pub tempo: u24,
}
impl TimeBase {
    /// Ticks per quarter note in quantized units.
    #[inline]
    pub fn effective_ticks_per_quarter(&self) -> f64 {
        self.ticks_per_quarter as f64 / self.quantum as f64
    }

    /// Length of one (quantized) tick under the given tempo.
    #[inline]
    pub fn seconds_per_tick_at(&self, tempo: u24) -> f64 {
        tempo.as_int() as f64 / 1_000_000.0 / self.effective_ticks_per_quarter()
    }

    /// Length of one (quantized) tick under the initial tempo.
    ///
    /// With several tempo segments this does not hold past the first tempo change.
    #[inline]
    pub fn seconds_per_tick(&self) -> f64 {
        self.seconds_per_tick_at(self.tempo)
    }

    #[inline]
    pub fn ticks_per_second(&self) -> f64 {
        1.0 / self.seconds_per_tick()
    }
}

/// Snap every event to a grid of `ticks_per_quarter / subdivision` ticks, and rewrite tick
/// positions in grid units.
///
/// Returns the grid size in original ticks. Ticks halfway between two grid lines round up.
/// A grid smaller than 2 ticks leaves the file untouched.
pub fn quantize(smf: &mut Smf, subdivision: u16) -> u32 {
    let quantum = (smf.header.ticks_per_quarter / subdivision.max(1)) as u32;
    if quantum <= 1 {
        return 1;
    }
    for ev in smf.tracks.iter_mut().flat_map(|track| track.events.iter_mut()) {
        let align = ev.tick % quantum;
        if align < quantum / 2 {
            ev.tick -= align;
        } else {
            ev.tick = ev.tick.saturating_add(quantum - align);
        }
        ev.tick /= quantum;
    }
    quantum
}

#[derive(Copy, Clone, PartialEq, Debug)]
struct TempoSegment {
    tick: u32,
    seconds: f64,
    tempo: u24,
}

/// Partition of the tick axis into ranges of constant tempo.
#[derive(Clone, PartialEq, Debug)]
pub struct TempoMap {
    /// Sorted by tick, the first segment always starts at tick zero.
    segments: Vec<TempoSegment>,
}
impl TempoMap {
    /// A map with a single tempo for the whole piece.
    pub fn constant(tempo: u24) -> TempoMap {
        TempoMap {
            segments: vec![TempoSegment {
                tick: 0,
                seconds: 0.0,
                tempo,
            }],
        }
    }

    /// Build the map for the given policy from the tempo events of every track.
    pub fn from_events<'a>(
        events: impl IntoIterator<Item = &'a RawEvent>,
        policy: TempoPolicy,
        default_tempo: u24,
        base: &TimeBase,
    ) -> TempoMap {
        let tempos = events.into_iter().filter_map(|ev| match ev.kind {
            EventKind::Tempo(tempo) if tempo.as_int() == 0 => {
                log::warn!("ignoring zero tempo at tick {}", ev.tick);
                None
            }
            EventKind::Tempo(tempo) => Some((ev.tick, tempo)),
            EventKind::Midi(_) => None,
        });
        match policy {
            TempoPolicy::Single => {
                let mut first: Option<u24> = None;
                for (_tick, tempo) in tempos {
                    match first {
                        Some(prev) => log::warn!(
                            "song has multiple tempos specified: previous = {}, new = {}",
                            prev,
                            tempo
                        ),
                        None => first = Some(tempo),
                    }
                }
                TempoMap::constant(first.unwrap_or(default_tempo))
            }
            TempoPolicy::Piecewise => {
                let mut changes = tempos.collect::<Vec<_>>();
                changes.sort_by_key(|&(tick, _)| tick);
                let mut map = TempoMap::constant(default_tempo);
                for (tick, tempo) in changes {
                    map.push(tick, tempo, base);
                }
                map
            }
        }
    }

    fn push(&mut self, tick: u32, tempo: u24, base: &TimeBase) {
        let last = match self.segments.last_mut() {
            Some(last) => last,
            None => return,
        };
        if last.tick == tick {
            //Several changes on the same tick, the last one wins
            last.tempo = tempo;
            return;
        }
        let seconds = last.seconds + (tick - last.tick) as f64 * base.seconds_per_tick_at(last.tempo);
        self.segments.push(TempoSegment {
            tick,
            seconds,
            tempo,
        });
    }

    /// Tempo in force at tick zero.
    pub fn initial_tempo(&self) -> u24 {
        self.segments[0].tempo
    }

    /// Amount of tempo segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Position of a tick in seconds.
    pub fn seconds_at(&self, tick: u32, base: &TimeBase) -> f64 {
        let idx = self.segments.partition_point(|seg| seg.tick <= tick) - 1;
        let seg = &self.segments[idx];
        seg.seconds + (tick - seg.tick) as f64 * base.seconds_per_tick_at(seg.tempo)
    }
}

/// Fill in the `time` field of every event.
///
/// `quantum` is the grid size returned by `quantize`, or 1 if the file was not quantized.
pub fn resolve(smf: &mut Smf, policy: TempoPolicy, default_tempo: u24, quantum: u32) -> TimeBase {
    let mut base = TimeBase {
        ticks_per_quarter: smf.header.ticks_per_quarter,
        quantum: quantum.max(1),
        tempo: default_tempo,
    };
    let map = TempoMap::from_events(smf.events(), policy, default_tempo, &base);
    base.tempo = map.initial_tempo();
    if map.len() > 1 {
        log::warn!(
            "{} tempo segments, packed ticks are scaled by the initial tempo only",
            map.len()
        );
    }
    log::debug!(
        "resolving timing with {} tempo segment(s), initial tempo {}us per quarter note",
        map.len(),
        base.tempo
    );
    for ev in smf.tracks.iter_mut().flat_map(|track| track.events.iter_mut()) {
        ev.time = map.seconds_at(ev.tick, &base);
    }
    base
}
