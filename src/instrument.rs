//! General MIDI program names and the synthesis presets used by the shader synthesizer.

use crate::prelude::*;

/// Names of the 128 General MIDI programs.
pub const GM_NAMES: [&str; 128] = [
    "Acoustic Grand Piano", "Bright Acoustic Piano", "Electric Grand Piano", "Honky-tonk Piano",
    "Electric Piano 1", "Electric Piano 2", "Harpsichord", "Clavi", "Celesta", "Glockenspiel",
    "Music Box", "Vibraphone", "Marimba", "Xylophone", "Tubular Bells", "Dulcimer", "Drawbar Organ",
    "Percussive Organ", "Rock Organ", "Church Organ", "Reed Organ", "Accordion", "Harmonica",
    "Tango Accordion", "Acoustic Guitar (nylon)", "Acoustic Guitar (steel)",
    "Electric Guitar (jazz)", "Electric Guitar (clean)", "Electric Guitar (muted)",
    "Overdriven Guitar", "Distortion Guitar", "Guitar harmonics", "Acoustic Bass",
    "Electric Bass (finger)", "Electric Bass (pick)", "Fretless Bass", "Slap Bass 1", "Slap Bass 2",
    "Synth Bass 1", "Synth Bass 2", "Violin", "Viola", "Cello", "Contrabass", "Tremolo Strings",
    "Pizzicato Strings", "Orchestral Harp", "Timpani", "String Ensemble 1", "String Ensemble 2",
    "SynthStrings 1", "SynthStrings 2", "Choir Aahs", "Voice Oohs", "Synth Voice", "Orchestra Hit",
    "Trumpet", "Trombone", "Tuba", "Muted Trumpet", "French Horn", "Brass Section", "SynthBrass 1",
    "SynthBrass 2", "Soprano Sax", "Alto Sax", "Tenor Sax", "Baritone Sax", "Oboe", "English Horn",
    "Bassoon", "Clarinet", "Piccolo", "Flute", "Recorder", "Pan Flute", "Blown Bottle",
    "Shakuhachi", "Whistle", "Ocarina", "Lead 1 (square)", "Lead 2 (sawtooth)", "Lead 3 (calliope)",
    "Lead 4 (chiff)", "Lead 5 (charang)", "Lead 6 (voice)", "Lead 7 (fifths)",
    "Lead 8 (bass + lead)", "Pad 1 (new age)", "Pad 2 (warm)", "Pad 3 (polysynth)", "Pad 4 (choir)",
    "Pad 5 (bowed)", "Pad 6 (metallic)", "Pad 7 (halo)", "Pad 8 (sweep)", "FX 1 (rain)",
    "FX 2 (soundtrack)", "FX 3 (crystal)", "FX 4 (atmosphere)", "FX 5 (brightness)",
    "FX 6 (goblins)", "FX 7 (echoes)", "FX 8 (sci-fi)", "Sitar", "Banjo", "Shamisen", "Koto",
    "Kalimba", "Bag pipe", "Fiddle", "Shanai", "Tinkle Bell", "Agogo", "Steel Drums", "Woodblock",
    "Taiko Drum", "Melodic Tom", "Synth Drum", "Reverse Cymbal", "Guitar Fret Noise",
    "Breath Noise", "Seashore", "Bird Tweet", "Telephone Ring", "Helicopter", "Applause", "Gunshot",
];

/// Parameters of the shader's additive synthesizer for one instrument.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SynthPreset {
    /// Amplitude of each oscillator.
    pub oscillators: [f32; 4],
    /// Frequency multiplier of each oscillator.
    pub octaves: [f32; 4],
    /// Attack, decay, sustain and release.
    pub adsr: [f32; 4],
    /// Effect parameters. `fx[1]` holds the panning, from 0 (left) to 1 (right).
    pub fx: [f32; 4],
}
impl Default for SynthPreset {
    /// A plain sine with a short envelope.
    fn default() -> SynthPreset {
        SynthPreset {
            oscillators: [0.5, 0.0, 0.0, 0.0],
            octaves: [1.0, 1.0, 1.0, 1.0],
            adsr: [0.005, 0.005, 0.5, 0.1],
            fx: [0.0, 0.0, 0.0, 0.0],
        }
    }
}
impl SynthPreset {
    const fn new(oscillators: [f32; 4], octaves: [f32; 4], adsr: [f32; 4], fx: [f32; 4]) -> Self {
        SynthPreset {
            oscillators,
            octaves,
            adsr,
            fx,
        }
    }

    /// Preset for a General MIDI program, by instrument family.
    ///
    /// Families without a tuned preset get the default one, and a warning is logged.
    pub fn for_program(program: u7) -> SynthPreset {
        let preset = match program.as_int() {
            //Guitar
            24..=31 => Some(SynthPreset::new(
                [0.99, 0.5, 1.5, 0.0],
                [2.0, 1.001, 1.0, 1.0],
                [0.001, 0.001, 0.1, 0.2],
                [0.0; 4],
            )),
            //Bass
            32..=39 => Some(SynthPreset::new(
                [0.99, 0.5, 0.0, 0.0],
                [1.0, 2.0, 1.0, 1.0],
                [0.002, 0.001, 0.75, 0.1],
                [0.0; 4],
            )),
            //Orchestral harp
            46 => Some(SynthPreset::new(
                [1.25, 1.0625, 0.0, 0.0],
                [1.0, 2.00001, 1.001, 1.0],
                [0.001, 0.01, 0.75, 0.5],
                [0.0; 4],
            )),
            //Strings and ensembles
            40..=55 => Some(SynthPreset::new(
                [0.125, 1.0625, 0.0, 0.0],
                [1.0, 2.00001, 1.001, 1.0],
                [0.5, 0.5, 0.75, 0.5],
                [0.0; 4],
            )),
            //Tenor sax
            66 => Some(SynthPreset::new(
                [1.5, 1.25, 2.25, 0.0],
                [1.0, 0.5, 0.501, 1.0],
                [0.01, 0.01, 0.5, 0.1],
                [0.025, 0.0, 0.0, 0.0],
            )),
            //Reed
            64..=71 => Some(SynthPreset::new(
                [0.5, 1.25, 2.25, 0.0],
                [1.0, 1.0, 1.001, 1.0],
                [0.001, 0.01, 0.5, 0.05],
                [0.02, 0.0, 0.0, 0.0],
            )),
            _ => None,
        };
        preset.unwrap_or_else(|| {
            log::warn!(
                "no preset for program {} ({}), using generic",
                program,
                GM_NAMES[program.as_int() as usize]
            );
            SynthPreset::default()
        })
    }

    /// Set the panning effect parameter from a MIDI panning value.
    #[inline]
    pub fn set_panning(&mut self, panning: u7) {
        self.fx[1] = panning.as_int() as f32 / 127.0;
    }
}
