use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use shadermidi::{
    config::{Config, PercussionFilter, Quantize, TempoPolicy},
    glsl,
    num::u4,
    InstrumentBank,
};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TempoArg {
    /// The first tempo event sets the tempo of the whole piece.
    Single,
    /// Every tempo event applies from its position onwards.
    Piecewise,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PercussionArg {
    /// Drop the notes of the drum channel.
    Channel,
    /// Drop the notes played with program 0.
    ProgramZero,
    /// Keep every note.
    Keep,
}

#[derive(Parser, Debug)]
#[command(version, about = "Convert MIDI files into GLSL note tables for shader playback")]
struct Args {
    /// MIDI files to convert. Each one is written as `<input>.glsl`.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// OPL2 instrument bank in OP2 format.
    #[arg(short, long, default_value = "GENMIDI.op2")]
    bank: PathBuf,

    /// Write the shaders into this directory instead of next to each input.
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = TempoArg::Single)]
    tempo: TempoArg,

    #[arg(long, value_enum, default_value_t = PercussionArg::Channel)]
    percussion: PercussionArg,

    /// Zero-based channel dropped by `--percussion channel`.
    #[arg(long, default_value_t = 9, value_parser = clap::value_parser!(u8).range(0..16))]
    drum_channel: u8,

    /// Snap notes to 1/N of a quarter note. 0 disables quantization.
    #[arg(long, default_value_t = 8)]
    quantize: u16,

    /// Seconds of music kept after the first note.
    #[arg(long, default_value_t = 120.0)]
    window: f64,

    /// Seconds a note stays audible after it is released.
    #[arg(long, default_value_t = 1.0)]
    release: f64,

    /// Length in seconds of each bucket of the range index.
    #[arg(long, default_value_t = 1.0)]
    bucket: f64,
}
impl Args {
    fn config(&self) -> Config {
        Config {
            tempo: match self.tempo {
                TempoArg::Single => TempoPolicy::Single,
                TempoArg::Piecewise => TempoPolicy::Piecewise,
            },
            percussion: match self.percussion {
                PercussionArg::Channel => PercussionFilter::Channel(u4::new(self.drum_channel)),
                PercussionArg::ProgramZero => PercussionFilter::ProgramZero,
                PercussionArg::Keep => PercussionFilter::Keep,
            },
            quantize: match self.quantize {
                0 => Quantize::Off,
                n => Quantize::Subdivision(n),
            },
            window_seconds: self.window,
            release_seconds: self.release,
            bucket_seconds: self.bucket,
            ..Config::default()
        }
    }
}

/// Load the instrument bank, falling back to an empty one.
fn load_bank(path: &Path) -> InstrumentBank {
    let loaded = fs::read(path)
        .context("failed to read file")
        .and_then(|raw| InstrumentBank::parse(&raw).context("failed to decode bank"));
    match loaded {
        Ok(bank) => {
            log::info!("loaded {} instruments from {}", bank.len(), path.display());
            bank
        }
        Err(err) => {
            log::warn!(
                "could not load {}: {:#}, using zeroed OPL2 instruments",
                path.display(),
                err
            );
            InstrumentBank::empty()
        }
    }
}

fn output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let glsl = input.with_extension("glsl");
    match (out_dir, glsl.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => glsl,
    }
}

/// Convert a single file, returning the path of the written shader.
fn convert_file(
    input: &Path,
    out_dir: Option<&Path>,
    config: &Config,
    bank: &InstrumentBank,
) -> Result<PathBuf> {
    let output = output_path(input, out_dir);
    log::info!("converting {} into {}", input.display(), output.display());
    let raw = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let conv = shadermidi::convert(&raw, config)
        .with_context(|| format!("failed to convert {}", input.display()))?;
    log::info!(
        "{}: {} notes, {} instruments, {} range buckets",
        input.display(),
        conv.words.len(),
        conv.programs.len(),
        conv.ranges.len()
    );
    fs::write(&output, glsl::to_shader(&conv, bank))
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(output)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = args.config();
    config.validate().map_err(anyhow::Error::msg)?;

    let bank = load_bank(&args.bank);
    let out_dir = args.out_dir.as_deref();
    if let Some(dir) = out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    //A broken file must not stop the rest of the batch
    let failed = args
        .inputs
        .par_iter()
        .filter(|input| match convert_file(input, out_dir, &config, &bank) {
            Ok(_) => false,
            Err(err) => {
                log::error!("{:#}", err);
                true
            }
        })
        .count();
    if failed > 0 {
        bail!("{} of {} file(s) failed to convert", failed, args.inputs.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadermidi::num::u24;

    /// One note on channel 0, a quarter note long at 96 ticks per quarter.
    const ONE_NOTE: &[u8] = &[
        b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0, 96, //
        b'M', b'T', b'r', b'k', 0, 0, 0, 12, //
        0x00, 0x90, 60, 100, //
        0x60, 0x80, 60, 64, //
        0x00, 0xFF, 0x2F, 0x00,
    ];

    #[test]
    fn default_arguments() {
        let args = Args::try_parse_from(["shadermidi", "song.mid"]).unwrap();
        assert_eq!(args.config(), Config::default());
        assert_eq!(args.bank, PathBuf::from("GENMIDI.op2"));
    }

    #[test]
    fn policy_arguments() {
        let args = Args::try_parse_from([
            "shadermidi",
            "--tempo",
            "piecewise",
            "--percussion",
            "program-zero",
            "--quantize",
            "0",
            "a.mid",
            "b.mid",
        ])
        .unwrap();
        let config = args.config();
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(config.tempo, TempoPolicy::Piecewise);
        assert_eq!(config.percussion, PercussionFilter::ProgramZero);
        assert_eq!(config.quantize, Quantize::Off);
        assert_eq!(config.default_tempo, u24::new(500_000));
    }

    #[test]
    fn rejects_bad_drum_channel() {
        assert!(Args::try_parse_from(["shadermidi", "--drum-channel", "16", "a.mid"]).is_err());
        assert!(Args::try_parse_from(["shadermidi"]).is_err());
    }

    #[test]
    fn output_next_to_input_or_in_dir() {
        assert_eq!(
            output_path(Path::new("music/song.mid"), None),
            PathBuf::from("music/song.glsl")
        );
        assert_eq!(
            output_path(Path::new("music/song.mid"), Some(Path::new("out"))),
            PathBuf::from("out/song.glsl")
        );
    }

    #[test]
    fn converts_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("one.mid");
        fs::write(&input, ONE_NOTE).unwrap();
        let output = convert_file(&input, None, &Config::default(), &InstrumentBank::empty())
            .unwrap();
        assert_eq!(output, dir.path().join("one.glsl"));
        let shader = fs::read_to_string(&output).unwrap();
        assert!(shader.contains("const uint noteEvents[1] = uint[]("));
        assert!(shader.contains("void FillNoteEvent(in int i, out uvec4 e)"));
    }

    #[test]
    fn reports_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.mid");
        fs::write(&input, &ONE_NOTE[..20]).unwrap();
        let err = convert_file(&input, None, &Config::default(), &InstrumentBank::empty())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("truncated stream"));
        assert!(!dir.path().join("broken.glsl").exists());
    }

    #[test]
    fn missing_bank_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_bank(&dir.path().join("GENMIDI.op2")).is_empty());
    }
}
