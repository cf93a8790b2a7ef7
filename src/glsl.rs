//! GLSL source emission for a converted file.
//!
//! The output declares the instrument tables, the packed note array, the range index, the time
//! base constants and a `FillNoteEvent` function unpacking one note word.

use crate::{
    bank::{InstrumentBank, Opl2Instrument, Opl2Operator},
    convert::Conversion,
    instrument::{SynthPreset, GM_NAMES},
    pack::{BITS_DURATION, BITS_NOTE, BITS_PROGRAM, BITS_TICK_BEGIN, BITS_VELOCITY},
    prelude::*,
};

/// Packed notes per line of the `noteEvents` array.
pub const NOTES_PER_LINE: usize = 15;
/// Range buckets per line of the `timeEventRanges` array.
pub const RANGES_PER_LINE: usize = 8;

/// Write a constant GLSL array, `per_line` items per line.
fn write_array<W, T, F>(
    out: &mut W,
    ty: &str,
    name: &str,
    items: &[T],
    per_line: usize,
    mut write_item: F,
) -> fmt::Result
where
    W: fmt::Write,
    F: FnMut(&mut W, &T) -> fmt::Result,
{
    writeln!(out, "const {0} {1}[{2}] = {0}[](", ty, name, items.len())?;
    write!(out, "    ")?;
    for (i, item) in items.iter().enumerate() {
        let last = i + 1 == items.len();
        write_item(&mut *out, item)?;
        if !last {
            write!(out, ", ")?;
        }
        if (i + 1) % per_line == 0 {
            if last {
                write!(out, " ")?;
            } else {
                write!(out, "\n    ")?;
            }
        }
    }
    writeln!(out, " );")
}

/// A time value in fixed-point decimal notation.
struct Fixed(f64);
impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.9}", self.0)
    }
}

struct Vec4<T>([T; 4]);
impl<T: fmt::Display> fmt::Display for Vec4<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [x, y, z, w] = &self.0;
        write!(f, "vec4({}, {}, {}, {})", x, y, z, w)
    }
}

fn operator_params(op: &Opl2Operator) -> Vec4<u8> {
    Vec4([op.characteristic, op.wave_select, op.scale, op.level])
}

fn operator_adsr(op: &Opl2Operator) -> Vec4<u8> {
    Vec4([op.attack, op.decay, op.sustain, op.release])
}

fn write_opl2_instrument<W: fmt::Write>(out: &mut W, instr: &Opl2Instrument) -> fmt::Result {
    write!(out, "OPL2Instrument(")?;
    for (i, voice) in instr.voices.iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
        }
        write!(
            out,
            "{}, {}, {}, {}",
            operator_params(&voice.modulator),
            operator_adsr(&voice.modulator),
            operator_params(&voice.carrier),
            operator_adsr(&voice.carrier),
        )?;
    }
    write!(out, ")")
}

fn write_opl2_table<W: fmt::Write>(
    out: &mut W,
    conv: &Conversion,
    bank: &InstrumentBank,
) -> fmt::Result {
    let zeroed = Opl2Instrument::default();
    writeln!(out, "struct OPL2Operator {{ vec4 params, adsr; }};")?;
    writeln!(
        out,
        "struct OPL2Voice {{ OPL2Operator mod, car; int feedback, noteOffset; }};"
    )?;
    writeln!(out, "struct OPL2Instrument\n{{")?;
    writeln!(out, "    vec4 mod0Params, mod0ADSR, car0Params, car0ADSR;")?;
    writeln!(out, "    vec4 mod1Params, mod1ADSR, car1Params, car1ADSR;")?;
    writeln!(out, "}};\n")?;
    let programs = conv.programs.programs();
    writeln!(
        out,
        "const OPL2Instrument opl2instruments[{0}] = OPL2Instrument[](",
        programs.len()
    )?;
    for (i, &program) in programs.iter().enumerate() {
        let instr = bank.lookup(program).unwrap_or(&zeroed);
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(
            out,
            "    // {}: \"{}\" (program {})",
            i, instr.name, program
        )?;
        write!(out, "    ")?;
        write_opl2_instrument(out, instr)?;
        if i + 1 < programs.len() {
            writeln!(out, ",")?;
        } else {
            writeln!(out)?;
        }
    }
    writeln!(out, ");\n")
}

fn write_preset_table<W: fmt::Write>(out: &mut W, conv: &Conversion) -> fmt::Result {
    writeln!(
        out,
        "struct Instrument {{ vec4 oscilators, octaves, adsr, fx; }};\n"
    )?;
    let programs = conv.programs.programs();
    writeln!(
        out,
        "const Instrument instruments[{0}] = Instrument[](",
        programs.len()
    )?;
    for (i, &program) in programs.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(
            out,
            "    // {}: \"{}\" (program {})",
            i,
            GM_NAMES[program.as_int() as usize],
            program
        )?;
        let mut preset = SynthPreset::for_program(program);
        preset.set_panning(conv.average_panning(u7::new(i as u8)));
        write!(
            out,
            "    Instrument( {}, {}, {}, {} )",
            Vec4(preset.oscillators),
            Vec4(preset.octaves),
            Vec4(preset.adsr),
            Vec4(preset.fx),
        )?;
        if i + 1 < programs.len() {
            writeln!(out, ",")?;
        } else {
            writeln!(out)?;
        }
    }
    writeln!(out, ");\n")
}

fn write_unpack_fn<W: fmt::Write>(out: &mut W) -> fmt::Result {
    let mask = |bits: u32| (1u32 << bits) - 1;
    writeln!(out, "void FillNoteEvent(in int i, out uvec4 e)\n{{")?;
    writeln!(out, "    uint n = noteEvents[i];\n")?;
    writeln!(out, "    // {} bits for note begin in ticks", BITS_TICK_BEGIN)?;
    writeln!(
        out,
        "    e.x = n & {}u; n = n >> {};\n",
        mask(BITS_TICK_BEGIN),
        BITS_TICK_BEGIN
    )?;
    writeln!(out, "    // {} bits for note duration in ticks", BITS_DURATION)?;
    writeln!(
        out,
        "    e.y = e.x + (n & {}u); n = n >> {};\n",
        mask(BITS_DURATION),
        BITS_DURATION
    )?;
    writeln!(out, "    // {} bits for note", BITS_NOTE)?;
    writeln!(
        out,
        "    e.z = n & {}u; n = n >> {};\n",
        mask(BITS_NOTE),
        BITS_NOTE
    )?;
    writeln!(
        out,
        "    // {} bits for instrument index with {} bits for velocity",
        BITS_PROGRAM, BITS_VELOCITY
    )?;
    //The velocity lands on bits 4.. of e.w
    writeln!(
        out,
        "    e.w = (n & {0}u) | ((n & ~{0}u) << {1});",
        mask(BITS_PROGRAM),
        4 - BITS_PROGRAM
    )?;
    writeln!(out, "}}")
}

/// Write the complete shader source for a conversion.
///
/// `bank` supplies the OPL2 instrument of every used program. If it is empty, zeroed instruments
/// are written instead.
pub fn write_shader<W: fmt::Write>(
    out: &mut W,
    conv: &Conversion,
    bank: &InstrumentBank,
) -> fmt::Result {
    write_opl2_table(out, conv, bank)?;
    write_preset_table(out, conv)?;

    write_array(out, "uint", "noteEvents", &conv.words, NOTES_PER_LINE, |out, word| {
        write!(out, "{}", word)
    })?;
    writeln!(out)?;

    writeln!(out, "// First usable noteEvent index for every second")?;
    write_array(
        out,
        "ivec2",
        "timeEventRanges",
        &conv.ranges,
        RANGES_PER_LINE,
        |out, range| write!(out, "ivec2({}, {})", range.start, range.end),
    )?;
    writeln!(out)?;

    writeln!(
        out,
        "const float secsPerTick = {};",
        Fixed(conv.seconds_per_tick())
    )?;
    writeln!(
        out,
        "const float ticksPerSec = {};\n",
        Fixed(conv.ticks_per_second())
    )?;
    write_unpack_fn(out)
}

/// Render the complete shader source for a conversion into a string.
pub fn to_shader(conv: &Conversion, bank: &InstrumentBank) -> String {
    let mut out = String::new();
    //Formatting into a `String` cannot fail
    let _ = write_shader(&mut out, conv, bank);
    out
}
