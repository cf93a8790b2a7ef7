//! Track events and their decoders.

use crate::{
    prelude::*,
    primitive::{read_varlen, read_varlen_slice, Cursor},
};

/// Controller number carrying the channel panning.
pub const PAN_CONTROLLER: u8 = 10;

/// A decoded event with its absolute position, as produced by the track decoder.
///
/// The `time` field is zero until the timing resolver fills it in.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct RawEvent {
    /// Index of the track chunk this event was decoded from.
    pub track: u16,
    /// Absolute position in ticks since the start of the track.
    pub tick: u32,
    /// Absolute position in seconds.
    pub time: f64,
    /// The MIDI channel. Always zero for tempo events.
    pub channel: u4,
    pub kind: EventKind,
}

/// The events that survive track decoding.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum EventKind {
    /// A channel message.
    Midi(MidiMessage),
    /// A tempo meta event, in microseconds per quarter note.
    Tempo(u24),
}

/// Represents a single event read straight off a track chunk.
///
/// Consists of a delta time (in MIDI ticks relative to the previous event) and the actual track
/// event.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct TrackEvent<'a> {
    /// How many MIDI ticks after the previous event should this event fire.
    pub delta: u32,
    /// The type of event along with event-specific data.
    pub kind: TrackEventKind<'a>,
}
impl<'a> TrackEvent<'a> {
    /// Advances the cursor and updates `running_status`.
    ///
    /// In case of failure the cursor might be left in the middle of an event!
    pub(crate) fn read(
        raw: &mut Cursor<'a>,
        running_status: &mut Option<u8>,
    ) -> Result<TrackEvent<'a>> {
        let delta = read_varlen(raw).context("reading event deltatime")?;
        let kind = TrackEventKind::read(raw, running_status).context("parsing event")?;
        Ok(TrackEvent { delta, kind })
    }
}

/// Represents the different kinds of SMF events and their associated data.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum TrackEventKind<'a> {
    /// A message associated to a MIDI channel carrying musical data.
    Midi { channel: u4, message: MidiMessage },
    /// A System Exclusive message (or an escape sequence), carrying arbitrary data.
    SysEx(&'a [u8]),
    /// A meta-message, giving extra information for correct playback, like tempo or track name.
    Meta(MetaMessage<'a>),
}
impl<'a> TrackEventKind<'a> {
    fn read(raw: &mut Cursor<'a>, running_status: &mut Option<u8>) -> Result<TrackEventKind<'a>> {
        let mut status = raw
            .read_u8()
            .ok_or(err_truncated!("failed to read status"))?;
        if status < 0x80 {
            //Running status! This byte is the first data byte of the event
            raw.rewind(1);
            status = running_status.ok_or(ErrorKind::UnknownEventType(status))?;
        }
        let kind = match status {
            0x80..=0xEF if MidiMessage::msg_length(status) > 0 => {
                *running_status = Some(status);
                let message = MidiMessage::read(status, raw)?;
                TrackEventKind::Midi {
                    channel: u4::new(status),
                    message,
                }
            }
            0xFF => {
                *running_status = None;
                TrackEventKind::Meta(MetaMessage::read(raw).context("reading meta event")?)
            }
            0xF0 => {
                *running_status = None;
                TrackEventKind::SysEx(read_varlen_slice(raw).context("reading sysex event")?)
            }
            _ => bail!(ErrorKind::UnknownEventType(status)),
        };
        Ok(kind)
    }
}

/// Represents a MIDI channel message.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum MidiMessage {
    /// Stop playing a note.
    ///
    /// A `NoteOn` with a velocity of zero is decoded as a `NoteOff`.
    NoteOff { key: u7, vel: u7 },
    /// Start playing a note.
    NoteOn { key: u7, vel: u7 },
    /// Modify the value of a MIDI controller.
    ///
    /// Controller `PAN_CONTROLLER` sets the channel panning.
    Controller { controller: u7, value: u7 },
    /// Change the program (also known as instrument) for a channel.
    ProgramChange { program: u7 },
    /// Set the pitch wheel value for the entire channel, as its two raw data bytes.
    PitchBend { lsb: u7, msb: u7 },
}
impl MidiMessage {
    /// Midi messages have a known length.
    ///
    /// Zero for the statuses that are not decoded, aftertouch included.
    pub(crate) fn msg_length(status: u8) -> usize {
        const LENGTH_BY_STATUS: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 2, 2, 0, 2, 1, 0, 2, 0];
        LENGTH_BY_STATUS[(status >> 4) as usize] as usize
    }

    /// Read the data bytes following a channel `status` byte.
    ///
    /// Panics if the `status` is not a supported MIDI message status, that is one with a nonzero
    /// `msg_length`.
    pub(crate) fn read(status: u8, raw: &mut Cursor) -> Result<MidiMessage> {
        let mut data = [u7::new(0); 2];
        for byte in data.iter_mut().take(Self::msg_length(status)) {
            *byte = u7::read(raw).context("reading midi message data")?;
        }
        Ok(match status >> 4 {
            0x8 => MidiMessage::NoteOff {
                key: data[0],
                vel: data[1],
            },
            0x9 if data[1].as_int() == 0 => MidiMessage::NoteOff {
                key: data[0],
                vel: data[1],
            },
            0x9 => MidiMessage::NoteOn {
                key: data[0],
                vel: data[1],
            },
            0xB => MidiMessage::Controller {
                controller: data[0],
                value: data[1],
            },
            0xC => MidiMessage::ProgramChange { program: data[0] },
            0xE => MidiMessage::PitchBend {
                lsb: data[0],
                msb: data[1],
            },
            _ => panic!("parsed midi message before checking that status is in range"),
        })
    }
}

/// A "meta message", as defined by the SMF spec.
///
/// Only the messages the converter cares about are decoded; the rest keep their raw payload.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum MetaMessage<'a> {
    /// Information about the name of the track, usually ASCII.
    TrackName(&'a [u8]),
    /// Obligatory at track end.
    EndOfTrack,
    /// Amount of microseconds per beat (quarter note).
    Tempo(u24),
    /// Any other meta message, with its raw type byte and payload.
    Other(u8, &'a [u8]),
}
impl<'a> MetaMessage<'a> {
    fn read(raw: &mut Cursor<'a>) -> Result<MetaMessage<'a>> {
        let type_byte = u8::read(raw).context("reading meta message type")?;
        let data = read_varlen_slice(raw).context("reading meta message data")?;
        Ok(match type_byte {
            0x03 => MetaMessage::TrackName(data),
            0x2F => MetaMessage::EndOfTrack,
            0x51 if data.len() >= 3 => MetaMessage::Tempo(u24::read(&mut Cursor::new(data))?),
            _ => MetaMessage::Other(type_byte, data),
        })
    }
}

/// An iterator of events over a single track chunk.
///
/// Decoding stops at the first error, which is yielded once.
#[derive(Clone, Debug)]
pub struct EventIter<'a> {
    raw: Cursor<'a>,
    running_status: Option<u8>,
}
impl<'a> EventIter<'a> {
    pub fn new(raw: &'a [u8]) -> EventIter<'a> {
        EventIter {
            raw: Cursor::new(raw),
            running_status: None,
        }
    }

    /// Get the remaining unread bytes.
    pub fn unread(&self) -> &'a [u8] {
        self.raw.unread()
    }

    /// Get the current running status of the track.
    pub fn running_status(&self) -> Option<u8> {
        self.running_status
    }
}
impl<'a> Iterator for EventIter<'a> {
    type Item = Result<TrackEvent<'a>>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.raw.is_empty() {
            return None;
        }
        let read_result = TrackEvent::read(&mut self.raw, &mut self.running_status);
        if read_result.is_err() {
            //Do not read from the middle of a broken event again
            self.raw = Cursor::new(&[]);
        }
        Some(read_result)
    }
}
