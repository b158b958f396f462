use std::path::PathBuf;

use anyhow::Result;
use candle_core::Device;
use clap::{Parser, Subcommand};

use seqlab_common::{load_sequences, load_token_labels, LabelerConfig};
use seqlab_infer::{decode, SequenceLabeler};

#[derive(Parser, Debug)]
#[command(name = "seqlab", about = "Recurrent sequence labeler: encode, attribute, decode")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a freshly initialised model directory from a config file.
    Init(InitArgs),
    /// Merge/filter an already-tagged token sequence.
    Decode(DecodeArgs),
    /// Label sequences of token vectors with a trained model directory.
    Analyze(AnalyzeArgs),
}

// ── Init ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct InitArgs {
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
    #[arg(long)]
    output_dir: PathBuf,
}

// ── Decode ─────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct DecodeArgs {
    /// JSON array of `{text, start, end, label}` records.
    #[arg(long)]
    input: PathBuf,
    /// Keep B/I/E tokens separate instead of merging them into spans.
    #[arg(long)]
    no_merge: bool,
    /// Drop tokens labelled `O`.
    #[arg(long)]
    filter: bool,
}

// ── Analyze ────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    #[arg(long)]
    model_dir: PathBuf,
    /// JSON array of `{tokens: [{text, start, end}], vectors: [[f32]]}` records.
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    no_merge: bool,
    #[arg(long)]
    filter: bool,
    /// Worker threads for independent sequences (0 = one per core).
    #[arg(long, default_value_t = 0)]
    num_threads: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Init(args) => cmd_init(args),
        Command::Decode(args) => cmd_decode(args),
        Command::Analyze(args) => cmd_analyze(args),
    }
}

// ── Command implementations ────────────────────────────────────────────────────

fn cmd_init(args: InitArgs) -> Result<()> {
    let config = LabelerConfig::load(&args.config)?;
    let labeler = SequenceLabeler::new(config, Device::Cpu)?;
    labeler.save(&args.output_dir)?;
    eprintln!("Model written to {}", args.output_dir.display());
    Ok(())
}

fn cmd_decode(args: DecodeArgs) -> Result<()> {
    let tokens = load_token_labels(&args.input)?;
    let decoded = decode(tokens, !args.no_merge, args.filter);
    println!("{}", serde_json::to_string_pretty(&decoded)?);
    Ok(())
}

fn cmd_analyze(args: AnalyzeArgs) -> Result<()> {
    if args.num_threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.num_threads)
            .build_global()?;
    }

    let device = Device::Cpu;
    let mut labeler = SequenceLabeler::load(&args.model_dir, device)?;
    labeler.set_decode_options(!args.no_merge, args.filter);

    let inputs = load_sequences(&args.input)?;
    eprintln!("Labeling {} sequences ...", inputs.len());
    let results = labeler.analyze_batch(&inputs)?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
