use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dumpwave_core::{
    run_pipeline, DumpSize, DumpWaveFilter, NullSink, WaveformConfig, WindowBoundary,
};
use tracing_subscriber::EnvFilter;

mod wav;

use wav::{WavFrameSink, WavFrameSource};

fn main() -> dumpwave_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => run_render(args),
        Commands::Defaults => print_defaults(),
    }
}

fn run_render(args: RenderArgs) -> dumpwave_core::Result<()> {
    tracing::info!(input = ?args.input, "rendering waveform");

    let mut source = WavFrameSource::open(&args.input)?;
    let config = build_config(&args, source.total_frames())?;
    let mut filter = DumpWaveFilter::new(config)?;

    let rendered = match &args.output {
        Some(output) => {
            let mut sink = WavFrameSink::create(output, source.spec())?;
            let rendered = run_pipeline(&mut source, &mut filter, &mut sink)?;
            sink.finish()?;
            rendered
        }
        None => run_pipeline(&mut source, &mut filter, &mut NullSink)?,
    };

    println!("{rendered}");
    if let Some(path) = &filter.config().json {
        tracing::info!(?path, "writing waveform document");
    }
    filter.teardown();
    Ok(())
}

fn print_defaults() -> dumpwave_core::Result<()> {
    println!("{}", WaveformConfig::default().to_json_pretty()?);
    Ok(())
}

/// Layers command line flags over the optional config file. Without an
/// explicit window size the whole file is spread across the width.
fn build_config(args: &RenderArgs, total_frames: u32) -> dumpwave_core::Result<WaveformConfig> {
    let mut config = match &args.config {
        Some(path) => WaveformConfig::from_json_file(path)?,
        None => WaveformConfig::default(),
    };

    if let Some(size) = args.size {
        config.set_size(size);
    }
    if let Some(samples_per_column) = args.samples_per_column {
        config.samples_per_column = samples_per_column;
    }
    if args.json.is_some() {
        config.json = args.json.clone();
    }
    if args.legacy_window {
        config.boundary = WindowBoundary::Legacy;
    }

    if config.samples_per_column == 0 && config.width > 0 {
        let fitted = (total_frames as usize).div_ceil(config.width).max(1);
        tracing::info!(
            samples_per_column = fitted,
            total_frames,
            "derived samples per column from input length"
        );
        config.samples_per_column = fitted;
    }

    Ok(config)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Render waveform thumbnails from audio files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reduce a 16-bit WAV file to a row of column heights.
    Render(RenderArgs),
    /// Print the default configuration as JSON.
    Defaults,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// 16-bit PCM WAV file to analyse.
    input: PathBuf,
    /// JSON configuration file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output geometry as WIDTHxHEIGHT.
    #[arg(short, long)]
    size: Option<DumpSize>,
    /// Samples folded into each column. Defaults to spreading the whole
    /// input across the width.
    #[arg(short = 'c', long)]
    samples_per_column: Option<usize>,
    /// Write the waveform as a JSON document to this path.
    #[arg(long)]
    json: Option<PathBuf>,
    /// Forward the audio into this WAV file.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Reproduce the historical window boundary (one extra sample per column).
    #[arg(long)]
    legacy_window: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> RenderArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Render(args) => args,
            Commands::Defaults => panic!("expected render command"),
        }
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "dumpwave", "render", "in.wav", "-s", "300x60", "-c", "128", "--legacy-window",
        ]);
        let config = build_config(&args, 10_000).unwrap();

        assert_eq!(config.width, 300);
        assert_eq!(config.height, 60);
        assert_eq!(config.samples_per_column, 128);
        assert_eq!(config.boundary, WindowBoundary::Legacy);
    }

    #[test]
    fn fits_window_to_input_length() {
        let args = parse(&["dumpwave", "render", "in.wav"]);
        let config = build_config(&args, 1_201).unwrap();

        assert_eq!(config.width, 600);
        assert_eq!(config.samples_per_column, 3);
        assert!(1_201 / config.samples_per_column <= config.width);
    }

    #[test]
    fn rejects_malformed_size() {
        assert!(Cli::try_parse_from(["dumpwave", "render", "in.wav", "-s", "wide"]).is_err());
    }
}
