//! tiffdir - inspect and rewrite the directory structure of TIFF files.
//!
//! `dump` prints a file's directories, `build` encodes a JSON container and
//! `rewrite` round-trips a file through the codec.

use clap::Parser;
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;
use std::process::ExitCode;
use tempfile::NamedTempFile;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiff_dir::{
    builtin_registry,
    config::{BuildConfig, Cli, Command, DumpConfig, RewriteConfig},
    ByteOrder, Container, DecodeOptions, Decoder, Directory, Encoder, OrderedReader, TiffHeader,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Dump(config) => run_dump(config),
        Command::Build(config) => run_build(config),
        Command::Rewrite(config) => run_rewrite(config),
    }
}

/// Initialize the tracing/logging subsystem.
///
/// Logs go to stderr so `dump` output stays machine-readable.
fn init_logging(verbose: bool) {
    let env_filter = if verbose { "tiff_dir=debug" } else { "tiff_dir=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// =============================================================================
// Dump Command
// =============================================================================

fn run_dump(config: DumpConfig) -> ExitCode {
    let options = config.limits.decode_options();
    if let Err(e) = options.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let container = match decode_file(&config.input, options) {
        Ok(container) => container,
        Err(e) => {
            error!("Failed to decode {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if config.summary {
        for (index, directory) in container.iter().enumerate() {
            print_summary(directory, &format!("IFD {}", index), 0);
        }
        return ExitCode::SUCCESS;
    }

    match serde_json::to_string_pretty(&container) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to serialize container: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// One line per directory, sub-directories indented under their parent.
fn print_summary(directory: &Directory, label: &str, depth: usize) {
    let tags = directory
        .sorted_tags()
        .iter()
        .map(|tag| tag.to_string())
        .collect::<Vec<_>>()
        .join(",");

    println!(
        "{:indent$}{}: {} entries, {} sub-directories [{}]",
        "",
        label,
        directory.len(),
        directory.sub_directories.len(),
        tags,
        indent = depth * 2
    );

    for (index, child) in directory.sub_directories.iter().enumerate() {
        print_summary(child, &format!("{}.{}", label, index), depth + 1);
    }
}

// =============================================================================
// Build Command
// =============================================================================

fn run_build(config: BuildConfig) -> ExitCode {
    let container = match File::open(&config.input)
        .map_err(|e| e.to_string())
        .and_then(|file| {
            serde_json::from_reader::<_, Container>(BufReader::new(file)).map_err(|e| e.to_string())
        }) {
        Ok(container) => container,
        Err(e) => {
            error!("Failed to read {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    write_file(&container, config.byte_order.into(), &config.output)
}

// =============================================================================
// Rewrite Command
// =============================================================================

fn run_rewrite(config: RewriteConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let file = match File::open(&config.input) {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to open {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let mut reader = BufReader::new(file);

    let byte_order = match config.byte_order {
        Some(arg) => ByteOrder::from(arg),
        None => match input_byte_order(&mut reader) {
            Ok(order) => order,
            Err(e) => {
                error!("Failed to read header of {}: {}", config.input.display(), e);
                return ExitCode::FAILURE;
            }
        },
    };

    let decoder = Decoder::new(builtin_registry()).with_options(config.limits.decode_options());
    let container = match decoder.decode(&mut reader) {
        Ok(container) => container,
        Err(e) => {
            error!("Failed to decode {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    write_file(&container, byte_order, &config.output)
}

/// Byte order declared by the input's header.
fn input_byte_order<R: Read + Seek>(reader: R) -> Result<ByteOrder, tiff_dir::DecodeError> {
    let mut reader = OrderedReader::new(reader)?;
    Ok(TiffHeader::read(&mut reader)?.byte_order)
}

// =============================================================================
// Helpers
// =============================================================================

fn decode_file(path: &Path, options: DecodeOptions) -> Result<Container, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    Decoder::new(builtin_registry())
        .with_options(options)
        .decode(BufReader::new(file))
        .map_err(|e| e.to_string())
}

/// Encode in memory, then replace `path` in one rename.
///
/// A failed encode or write leaves any existing file at `path` untouched.
fn write_file(container: &Container, byte_order: ByteOrder, path: &Path) -> ExitCode {
    let encoder = Encoder::new(builtin_registry(), byte_order);
    let bytes = match encoder.encode(container) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to encode {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = replace_file(path, &bytes) {
        error!("Failed to write {}: {}", path.display(), e);
        return ExitCode::FAILURE;
    }

    info!(
        "Wrote {} directories ({} bytes) to {}",
        container.len(),
        bytes.len(),
        path.display()
    );
    ExitCode::SUCCESS
}

/// Write into a temp file next to `path` and move it into place.
fn replace_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
