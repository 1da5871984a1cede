use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use songbook::convert::extract_audio;
use songbook::model_tier::ModelTier;
use songbook::opts::Opts;
use songbook::output_type::OutputType;
use songbook::separator::{CommandSeparator, Separator, DEFAULT_SEPARATOR_PROGRAM};
use songbook::songbook::Songbook;

fn main() -> Result<()> {
    songbook::logging::init();

    let params = Params::parse();
    match params.command {
        Command::Analyze(args) => analyze(args),
        Command::Convert(args) => convert(args),
        Command::Separate(args) => separate(args),
    }
}

#[derive(Parser, Debug)]
#[command(name = "songbook")]
#[command(about = "Recover lyrics and chords from sung recordings")]
struct Params {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transcribe a recording and print its chord sheet.
    Analyze(AnalyzeArgs),

    /// Extract audio from any container into a mono 16 kHz WAV.
    Convert(ConvertArgs),

    /// Split a recording into vocal and instrumental stems.
    Separate(SeparateArgs),
}

#[derive(clap::Args, Debug)]
struct AnalyzeArgs {
    /// Audio or video file to analyze.
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Directory containing ggml model files.
    #[arg(short = 'm', long = "models-dir", default_value = "./models")]
    models_dir: PathBuf,

    /// Whisper model tier (speed vs. accuracy).
    #[arg(long = "tier", value_enum, default_value_t = ModelTier::Base)]
    tier: ModelTier,

    /// Language hint (e.g. "en", "es"); auto-detected when omitted.
    #[arg(short = 'l', long = "language")]
    language: Option<String>,

    /// Translate lyrics to English instead of transcribing verbatim.
    #[arg(long = "translate", default_value_t = false)]
    translate: bool,

    #[arg(
        short = 'o',
        long = "output-type",
        value_enum,
        default_value_t = OutputType::Sheet
    )]
    output_type: OutputType,
}

#[derive(clap::Args, Debug)]
struct ConvertArgs {
    /// Audio or video file to extract from.
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// WAV file to write.
    #[arg(short = 'o', long = "output")]
    output: PathBuf,
}

#[derive(clap::Args, Debug)]
struct SeparateArgs {
    /// Recording to split into stems.
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Directory the stems are written under.
    #[arg(short = 'o', long = "out-dir", default_value = "./stems")]
    out_dir: PathBuf,

    /// External separation program to invoke.
    #[arg(long = "separator-cmd", default_value = DEFAULT_SEPARATOR_PROGRAM)]
    separator_cmd: String,
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let mut songbook = Songbook::new(&args.models_dir)?;

    let opts = Opts {
        model_tier: args.tier,
        language: args.language,
        translate_to_english: args.translate,
        output_type: args.output_type,
    };

    let input = File::open(&args.input)
        .with_context(|| format!("failed to open '{}'", args.input.display()))?;

    let stdout = io::stdout();
    let writer = BufWriter::new(stdout.lock());

    songbook.analyze(input, writer, &opts)
}

fn convert(args: ConvertArgs) -> Result<()> {
    let input = File::open(&args.input)
        .with_context(|| format!("failed to open '{}'", args.input.display()))?;
    let output = File::create(&args.output)
        .with_context(|| format!("failed to create '{}'", args.output.display()))?;

    let hint = args
        .input
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_owned);

    let written = extract_audio(input, hint.as_deref(), BufWriter::new(output))?;
    eprintln!("wrote {written} samples to {}", args.output.display());
    Ok(())
}

fn separate(args: SeparateArgs) -> Result<()> {
    // Separation needs no models, so we drive the separator directly rather
    // than going through `Songbook`.
    let separator = CommandSeparator::new(args.separator_cmd);
    let stems = separator.separate(&args.input, &args.out_dir)?;

    eprintln!("vocals:       {}", stems.vocals.display());
    eprintln!("instrumental: {}", stems.instrumental.display());
    Ok(())
}
