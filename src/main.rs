//! bibleir - Bible markup converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bibleir::{Adapter, ConvertConfig, Format, Registry};

#[derive(Parser)]
#[command(name = "bibleir")]
#[command(version, about = "Bible markup converter", long_about = None)]
#[command(after_help = "EXAMPLES:
    bibleir detect kjv.xml                  Identify the format of a file
    bibleir extract kjv.xml out/            Write out/<id>.ir.json
    bibleir emit out/KJV.ir.json out/ -t zefania
    bibleir convert kjv.xml out/ -t json    Extract and emit in one step")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Format of the input; sniffed when omitted
    #[arg(short, long, global = true, value_name = "FORMAT")]
    from: Option<String>,

    /// Do not keep the raw source in the IR
    #[arg(long, global = true)]
    no_raw: bool,

    /// More log output (repeat for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress output messages
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Report which format a file is in
    Detect { input: PathBuf },
    /// Store a file in a content-addressable directory
    Ingest { input: PathBuf, store: PathBuf },
    /// List the members of an artifact
    List { input: PathBuf },
    /// Extract the IR of a file
    Extract { input: PathBuf, output: PathBuf },
    /// Emit a native file from IR
    Emit {
        ir: PathBuf,
        output: PathBuf,
        /// Target format
        #[arg(short, long)]
        to: String,
    },
    /// Extract and emit in one step
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Target format
        #[arg(short, long)]
        to: String,
    },
    /// List supported formats
    Formats,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = ConvertConfig {
        preserve_raw: !cli.no_raw,
        ..ConvertConfig::default()
    };
    let registry = Registry::with_defaults(config);

    match &cli.command {
        Command::Detect { input } => {
            let adapter = select(&registry, cli.from.as_deref(), input)?;
            let detection = adapter.detect(input);
            println!(
                "{}: {} ({})",
                input.display(),
                if detection.detected { detection.format.as_str() } else { "unknown" },
                detection.reason
            );
        }
        Command::Ingest { input, store } => {
            let adapter = select(&registry, cli.from.as_deref(), input)?;
            let ingested = adapter.ingest(input, store).map_err(|e| e.to_string())?;
            println!("Artifact: {}", ingested.artifact_id);
            println!("Digest: {}", ingested.blob_digest);
            println!("Size: {} bytes", ingested.size_bytes);
            for (key, value) in &ingested.metadata {
                println!("{key}: {value}");
            }
        }
        Command::List { input } => {
            let adapter = select(&registry, cli.from.as_deref(), input)?;
            for entry in adapter.enumerate(input).map_err(|e| e.to_string())? {
                let kind = if entry.is_dir { "dir" } else { "file" };
                println!("{:>10} {:4} {}", entry.size_bytes, kind, entry.path.display());
            }
        }
        Command::Extract { input, output } => {
            let adapter = select(&registry, cli.from.as_deref(), input)?;
            let extracted = adapter.extract_ir(input, output).map_err(|e| e.to_string())?;
            if !cli.quiet {
                println!("{} ({})", extracted.ir_path.display(), extracted.loss_class);
                print_warnings(&extracted.loss_report.warnings);
            }
        }
        Command::Emit { ir, output, to } => {
            let target = registry.get(to).map_err(|e| e.to_string())?;
            emit(target, ir, output, cli.quiet)?;
        }
        Command::Convert { input, output, to } => {
            let source = select(&registry, cli.from.as_deref(), input)?;
            let target = registry.get(to).map_err(|e| e.to_string())?;
            let extracted = source.extract_ir(input, output).map_err(|e| e.to_string())?;
            emit(target, &extracted.ir_path, output, cli.quiet)?;
        }
        Command::Formats => {
            for manifest in registry.manifests() {
                let ir = match &manifest.ir_support {
                    Some(s) => format!("IR (regenerates at {})", s.regeneration_class),
                    None => "no IR".to_string(),
                };
                println!("{:<10} {}", manifest.id.trim_start_matches("format-"), ir);
            }
        }
    }
    Ok(())
}

/// The adapter named by `--from`, else the first one that detects `input`.
fn select<'a>(registry: &'a Registry, from: Option<&str>, input: &Path) -> Result<&'a Adapter, String> {
    if let Some(name) = from {
        return registry.get(name).map_err(|e| e.to_string());
    }
    registry
        .detect(input)
        .map(|(adapter, _)| adapter)
        .ok_or_else(|| {
            let known: Vec<_> = Format::ALL.iter().map(|f| f.name()).collect();
            format!(
                "{}: format not recognized (supported: {})",
                input.display(),
                known.join(", ")
            )
        })
}

fn emit(target: &Adapter, ir: &Path, output: &Path, quiet: bool) -> Result<(), String> {
    let emitted = target.emit_native(ir, output).map_err(|e| e.to_string())?;
    if !quiet {
        println!("{} ({})", emitted.output_path.display(), emitted.loss_class);
        print_warnings(&emitted.loss_report.warnings);
    }
    Ok(())
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}
