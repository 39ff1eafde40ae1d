use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;

use midi_to_jukebox::{mml, output, ConversionConfig, Converter, MidiSource};

#[derive(Parser, Debug)]
#[command(name = "midi-to-jukebox")]
#[command(about = "Convert MIDI files to jukebox song text", long_about = None)]
struct Args {
    /// Path to the MIDI file
    input: PathBuf,

    /// Song tempo in BPM; overrides the tempo embedded in the file
    /// (120 when neither is given)
    #[arg(short, long)]
    tempo: Option<f64>,

    /// Disable note velocity, so all notes have the same volume
    #[arg(long = "disable_vel")]
    disable_vel: bool,

    /// Scale all start times and durations; 2.0 doubles every value
    #[arg(long = "speed_mult", default_value = "1.0")]
    speed_mult: f64,

    /// Output encoding
    #[arg(short, long, value_enum, default_value_t = Format::Lines)]
    format: Format,

    /// Output file path (default: `<midi-name>.<format extension>`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print output to stdout instead of file
    #[arg(long)]
    stdout: bool,

    /// Suppress informational messages (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    /// Delimited note lines: pitch, start, duration, velocity
    Lines,
    /// The game's macro-language song format
    Mml,
    /// JSON event list
    Json,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Lines => "txt",
            Format::Mml => "mml",
            Format::Json => "json",
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConversionConfig {
        tempo_bpm: args.tempo,
        velocity_enabled: !args.disable_vel,
        speed_multiplier: args.speed_mult,
    };
    config.validate()?;

    if !args.input.exists() {
        anyhow::bail!("MIDI file not found: {}", args.input.display());
    }

    // Determine output path (mirrors the input file name)
    let output_path = if let Some(path) = args.output {
        path
    } else {
        let stem = args
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        PathBuf::from(format!("{}.{}", stem, args.format.extension()))
    };

    if !args.quiet {
        eprintln!("Processing MIDI file: {}", args.input.display());
    }

    let source = MidiSource::from_file(&args.input)?;
    let conversion = Converter::new(config).convert(&source);

    if conversion.unmatched > 0 && !args.quiet {
        eprintln!(
            "Warning: dropped {} note-on event(s) with no matching note-off",
            conversion.unmatched
        );
    }

    let rendered = match args.format {
        Format::Lines => output::to_lines(&conversion.events),
        Format::Mml => format!("{}\n", mml::encode_song(&conversion)),
        Format::Json => {
            let json = output::to_json(&conversion).context("Failed to serialize conversion")?;
            format!("{}\n", json)
        }
    };

    if args.stdout {
        // Print directly to stdout (clean, no logs)
        print!("{}", rendered);
    } else {
        fs::write(&output_path, &rendered)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        if !args.quiet {
            eprintln!("Output saved to {}", output_path.display());
        }
    }

    Ok(())
}
