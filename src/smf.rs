//! Specific to the SMF packaging of MIDI streams.

use crate::{
    event::{EventIter, EventKind, MetaMessage, RawEvent, TrackEventKind},
    prelude::*,
    primitive::{Cursor, Format},
};

/// A decoded Standard Midi File: its header and every non-empty track.
#[derive(Clone, Debug, PartialEq)]
pub struct Smf {
    pub header: Header,
    /// Tracks in file order. Tracks that decoded to no events are dropped, so `Track::index` may
    /// skip values.
    pub tracks: Vec<Track>,
}
impl Smf {
    pub fn new(header: Header, tracks: Vec<Track>) -> Smf {
        Smf { header, tracks }
    }

    /// Decode a whole file held in memory.
    ///
    /// Fails with `MalformedContainer` if a chunk tag or header field is wrong, and with
    /// `TruncatedStream` if any read runs past the end of the buffer.
    pub fn parse(raw: &[u8]) -> Result<Smf> {
        let mut raw = Cursor::new(raw);
        let header_chunk = read_chunk(&mut raw, b"MThd").context("reading header chunk")?;
        let header = Header::read(header_chunk)?;
        let mut chunks = Vec::with_capacity(header.track_count as usize);
        for _ in 0..header.track_count {
            chunks.push(read_chunk(&mut raw, b"MTrk").context("reading track chunk")?);
        }
        if !raw.is_empty() {
            log::debug!("ignoring {} trailing bytes after the last track", raw.remaining());
        }
        let tracks = decode_tracks(&chunks)?
            .into_iter()
            .filter(|track| !track.events.is_empty())
            .collect::<Vec<_>>();
        log::debug!(
            "decoded {} of {} tracks with events",
            tracks.len(),
            header.track_count
        );
        Ok(Smf { header, tracks })
    }

    /// Iterate over every event of every track, in track order.
    pub fn events(&self) -> impl Iterator<Item = &RawEvent> {
        self.tracks.iter().flat_map(|track| track.events.iter())
    }
}

/// Read a chunk with the given tag, returning its payload.
fn read_chunk<'a>(raw: &mut Cursor<'a>, tag: &[u8; 4]) -> Result<&'a [u8]> {
    let id = raw
        .split(4)
        .ok_or(err_truncated!("failed to read chunk id"))?;
    ensure!(
        id == tag,
        if tag == b"MThd" {
            err_malformed!("expected MThd header chunk")
        } else {
            err_malformed!("expected MTrk track chunk")
        }
    );
    let len = u32::read(raw).context("reading chunk length")?;
    Ok(raw
        .split(len as usize)
        .ok_or(err_truncated!("reached eof before chunk ended"))?)
}

#[cfg(feature = "parallel")]
fn decode_tracks(chunks: &[&[u8]]) -> Result<Vec<Track>> {
    use rayon::prelude::*;

    if chunks.len() > 1 {
        return chunks
            .par_iter()
            .enumerate()
            .map(|(idx, chunk)| Track::decode(idx as u16, chunk))
            .collect();
    }
    chunks
        .iter()
        .enumerate()
        .map(|(idx, chunk)| Track::decode(idx as u16, chunk))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn decode_tracks(chunks: &[&[u8]]) -> Result<Vec<Track>> {
    chunks
        .iter()
        .enumerate()
        .map(|(idx, chunk)| Track::decode(idx as u16, chunk))
        .collect()
}

/// A MIDI file header.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Header {
    pub format: Format,
    /// Amount of track chunks declared by the header.
    pub track_count: u16,
    /// Metrical timing, in ticks per quarter note. Never zero.
    pub ticks_per_quarter: u16,
}
impl Header {
    pub fn new(format: Format, track_count: u16, ticks_per_quarter: u16) -> Header {
        Header {
            format,
            track_count,
            ticks_per_quarter,
        }
    }

    fn read(chunk: &[u8]) -> Result<Header> {
        if cfg!(feature = "strict") {
            ensure!(chunk.len() == 6, err_malformed!("header chunk length is not 6"));
        }
        let mut raw = Cursor::new(chunk);
        let format = Format::read(&mut raw).context("reading smf format")?;
        let track_count = u16::read(&mut raw).context("reading track count")?;
        let ticks_per_quarter = u16::read(&mut raw).context("reading midi timing")?;
        ensure!(
            bit_range(ticks_per_quarter, 15..16) == 0,
            err_malformed!("timecode timing is not supported")
        );
        ensure!(
            ticks_per_quarter != 0,
            err_malformed!("zero ticks per quarter note")
        );
        Ok(Header::new(format, track_count, ticks_per_quarter))
    }
}

/// A single decoded track.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    /// Position of the chunk in the file.
    pub index: u16,
    /// The last track name meta event, lossily decoded as text.
    pub name: String,
    /// Events with absolute tick positions, in non-decreasing tick order.
    pub events: Vec<RawEvent>,
}
impl Track {
    /// Decode the events of one track chunk.
    ///
    /// Channel messages and tempo meta events are kept, SysEx and all other meta events are
    /// skipped.
    pub fn decode(index: u16, chunk: &[u8]) -> Result<Track> {
        let mut track = Track {
            index,
            name: String::new(),
            events: Vec::with_capacity(chunk.len() / 3),
        };
        let mut tick: u32 = 0;
        for ev in EventIter::new(chunk) {
            let ev = ev.context("decoding track")?;
            tick = tick.saturating_add(ev.delta);
            let (channel, kind) = match ev.kind {
                TrackEventKind::Midi { channel, message } => (channel, EventKind::Midi(message)),
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    (u4::new(0), EventKind::Tempo(tempo))
                }
                TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
                    track.name = String::from_utf8_lossy(name).into_owned();
                    continue;
                }
                TrackEventKind::Meta(_) | TrackEventKind::SysEx(_) => continue,
            };
            track.events.push(RawEvent {
                track: index,
                tick,
                time: 0.0,
                channel,
                kind,
            });
        }
        Ok(track)
    }
}
