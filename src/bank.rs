//! OPL2 instrument banks in the OP2 format (`GENMIDI.op2`).
//!
//! The file is an 8-byte `#OPL_II#` tag, followed by `BANK_SIZE` fixed-size little-endian
//! instrument records and then `BANK_SIZE` 32-byte instrument names.

use crate::{instrument::GM_NAMES, prelude::*, primitive::Cursor};

/// Tag at the start of every OP2 bank.
pub const OP2_MAGIC: &[u8; 8] = b"#OPL_II#";
/// Amount of instruments in a bank: 128 melodic programs followed by 47 percussion notes.
pub const BANK_SIZE: usize = 175;
const NAME_LEN: usize = 32;

fn read_le_u16(raw: &mut Cursor) -> StdResult<u16, ErrorKind> {
    let bytes = raw
        .split(2)
        .ok_or(err_truncated!("failed to read little-endian u16"))?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// One operator of an OPL2 voice, with its packed envelope nibbles split out.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Default)]
pub struct Opl2Operator {
    /// Tremolo, vibrato, sustain, key scaling and frequency multiplier flags.
    pub characteristic: u8,
    pub attack: u8,
    pub decay: u8,
    pub sustain: u8,
    pub release: u8,
    pub wave_select: u8,
    pub scale: u8,
    pub level: u8,
}
impl Opl2Operator {
    fn read(raw: &mut Cursor) -> Result<Opl2Operator> {
        let bytes = raw
            .split(6)
            .ok_or(err_truncated!("failed to read opl2 operator"))?;
        Ok(Opl2Operator {
            characteristic: bytes[0],
            attack: bytes[1] >> 4,
            decay: bytes[1] & 0x0F,
            sustain: bytes[2] >> 4,
            release: bytes[2] & 0x0F,
            wave_select: bytes[3],
            scale: bytes[4],
            level: bytes[5],
        })
    }
}

/// A modulator/carrier pair.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Default)]
pub struct Opl2Voice {
    pub modulator: Opl2Operator,
    pub feedback: u8,
    pub carrier: Opl2Operator,
    /// Semitones added to every note played by this voice.
    pub note_offset: i16,
}
impl Opl2Voice {
    fn read(raw: &mut Cursor) -> Result<Opl2Voice> {
        let modulator = Opl2Operator::read(raw).context("reading modulator")?;
        let feedback = u8::read(raw)?;
        let carrier = Opl2Operator::read(raw).context("reading carrier")?;
        let _reserved = u8::read(raw)?;
        let note_offset = read_le_u16(raw)? as i16;
        Ok(Opl2Voice {
            modulator,
            feedback,
            carrier,
            note_offset,
        })
    }
}

/// A two-voice OPL2 instrument.
#[derive(Clone, PartialEq, Eq, Debug, Hash, Default)]
pub struct Opl2Instrument {
    pub name: String,
    pub flags: u16,
    pub fine_tune: u8,
    /// Note played regardless of the note-on key, if the fixed-pitch flag is set.
    pub fixed_note: u8,
    pub voices: [Opl2Voice; 2],
}
impl Opl2Instrument {
    fn read(raw: &mut Cursor) -> Result<Opl2Instrument> {
        let flags = read_le_u16(raw)?;
        let fine_tune = u8::read(raw)?;
        let fixed_note = u8::read(raw)?;
        let first = Opl2Voice::read(raw).context("reading first voice")?;
        let second = Opl2Voice::read(raw).context("reading second voice")?;
        Ok(Opl2Instrument {
            name: String::new(),
            flags,
            fine_tune,
            fixed_note,
            voices: [first, second],
        })
    }
}

/// Decode an instrument name: printable bytes up to the first control byte, trimmed.
fn read_name(raw: &[u8]) -> String {
    let len = raw.iter().position(|&b| b < 0x20).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..len]).trim().to_string()
}

/// An ordered table of OPL2 instruments, indexed by General MIDI program.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct InstrumentBank {
    pub instruments: Vec<Opl2Instrument>,
}
impl InstrumentBank {
    /// A bank without instruments, used when no bank file is available.
    pub fn empty() -> InstrumentBank {
        InstrumentBank::default()
    }

    /// Decode an OP2 bank held in memory.
    pub fn parse(raw: &[u8]) -> Result<InstrumentBank> {
        let mut raw = Cursor::new(raw);
        let magic = raw
            .split(OP2_MAGIC.len())
            .ok_or(err_truncated!("failed to read op2 header"))?;
        ensure!(magic == OP2_MAGIC, err_malformed!("invalid op2 header"));
        let mut instruments = Vec::with_capacity(BANK_SIZE);
        for _ in 0..BANK_SIZE {
            instruments.push(Opl2Instrument::read(&mut raw).context("reading op2 instrument")?);
        }
        for (idx, instr) in instruments.iter_mut().enumerate() {
            let name = raw
                .split(NAME_LEN)
                .ok_or(err_truncated!("failed to read op2 instrument name"))?;
            instr.name = read_name(name);
            if instr.name.is_empty() && idx < GM_NAMES.len() {
                instr.name = GM_NAMES[idx].to_string();
            }
        }
        Ok(InstrumentBank { instruments })
    }

    /// Instrument for a General MIDI program.
    ///
    /// Programs past the end of the bank fall back to the first instrument. Returns `None` only
    /// if the bank is empty.
    pub fn lookup(&self, program: u7) -> Option<&Opl2Instrument> {
        self.instruments
            .get(program.as_int() as usize)
            .or_else(|| self.instruments.first())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}
