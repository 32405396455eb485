use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use libmpa_stream::format_time;
use mpascan::{ErrorPolicy, ScanOptions, ScanOutcome, ScanReport};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "mpascan")]
#[command(version)]
#[command(about = "MPEG audio stream scanner and decoder", long_about = None)]
struct Cli {
    /// Error policy: none, moderate, moderate=N, all
    #[arg(long, global = true, default_value = "moderate")]
    policy: ErrorPolicy,
    /// Log decoder events at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the first frame header and estimates
    Info {
        /// Input MPEG audio file
        input: PathBuf,
    },
    /// Read every frame and report errors
    Scan {
        /// Input MPEG audio file
        input: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Decode payloads instead of skipping them
        #[arg(long)]
        decode: bool,
    },
    /// Decode to WAV
    Decode {
        /// Input MPEG audio file
        input: PathBuf,
        /// Output WAV file
        output: PathBuf,
    },
    /// Validate an MPEG audio file
    Validate {
        /// Input MPEG audio file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => info(&input, cli.policy)?,
        Commands::Scan {
            input,
            json,
            decode,
        } => scan(&input, cli.policy, json, decode)?,
        Commands::Decode { input, output } => decode(&input, &output, cli.policy)?,
        Commands::Validate { input } => validate(&input, cli.policy)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn info(input: &PathBuf, policy: ErrorPolicy) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;
    let info = mpascan::get_stream_info(&data, policy)?;

    println!("MPEG Audio Stream");
    println!("───────────────────────────────");
    println!("  Format:      {} {}", info.version, info.layer);
    println!("  Sample rate: {} Hz", info.sample_rate);
    println!("  Channels:    {} ({})", info.channels, info.channel_mode);
    if info.vbr {
        println!("  Bit rate:    ~{} kb/s (VBR)", info.bitrate_kbps);
    } else {
        println!("  Bit rate:    {} kb/s", info.bitrate_kbps);
    }
    println!(
        "  CRC:         {}",
        if info.crc_protected { "yes" } else { "no" }
    );
    println!(
        "  Duration:    ~{}",
        format_time(info.estimated_duration_secs)
    );
    println!("  Frames:      ~{}", info.estimated_frames);
    println!("  File size:   {} bytes", info.file_size);

    Ok(())
}

fn scan(input: &PathBuf, policy: ErrorPolicy, json: bool, decode: bool) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;

    let mut options = ScanOptions::new().with_policy(policy);
    if decode {
        options = options.decoding();
    }
    let report = mpascan::scan_bytes(&data, options)?;

    if json {
        let json_str = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json_str);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &ScanReport) {
    println!("Scan of {} bytes", report.info.file_size);
    println!("───────────────────────────────");
    println!("  Format:      {} {}", report.info.version, report.info.layer);
    println!("  Policy:      {}", report.policy);
    println!(
        "  Frames:      {} valid of {} attempted",
        report.valid_frames, report.frames_attempted
    );
    println!("  Errors:      {}", report.errors);
    println!(
        "  Duration:    {} (estimated {})",
        format_time(report.duration_secs),
        format_time(report.info.estimated_duration_secs)
    );
    println!("  Read:        {} bytes", report.bytes_consumed);

    let outcome = match report.outcome {
        ScanOutcome::Complete => "complete",
        ScanOutcome::NotAudio => "not audio",
        ScanOutcome::TooManyErrors => "too many errors",
        ScanOutcome::TransportFailed => "read failure",
    };
    println!("  Outcome:     {}", outcome);
    if let Some(ref message) = report.message {
        println!("  Error:       {}", message);
    }
}

fn decode(input: &PathBuf, output: &PathBuf, policy: ErrorPolicy) -> Result<()> {
    println!("Reading {}...", input.display());

    let data = fs::read(input).context("Failed to read input file")?;
    let info = mpascan::get_stream_info(&data, policy)?;

    println!("  Sample rate: {} Hz", info.sample_rate);
    println!("  Channels:    {}", info.channels);
    println!("  Duration:    ~{}", format_time(info.estimated_duration_secs));

    println!("Decoding...");

    let wav_bytes = mpascan::decode_to_wav(&data, policy).context("Failed to decode stream")?;

    fs::write(output, wav_bytes).context("Failed to write WAV file")?;

    println!("Done!");
    println!("  Output: {}", output.display());

    Ok(())
}

fn validate(input: &PathBuf, policy: ErrorPolicy) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;

    let is_valid = mpascan::validate(&data, policy).context("Validation failed")?;

    if is_valid {
        println!("✓ {} is a valid MPEG audio stream", input.display());
        Ok(())
    } else {
        bail!("✗ {} is not a valid MPEG audio stream", input.display())
    }
}
