//! Configuration for the codec and the `tiffdir` binary.
//!
//! - [`DecodeOptions`] bounds how much structure a decode will follow
//! - [`Cli`] holds the command-line arguments, parsed with clap
//!
//! # Environment Variables
//!
//! - `TIFFDIR_BYTE_ORDER` - Output byte order for `build`/`rewrite` (default: little)
//! - `TIFFDIR_MAX_DEPTH` - Sub-directory nesting limit (default: 16)
//! - `TIFFDIR_MAX_DIRECTORIES` - Total directory limit (default: 4096)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::tiff::ByteOrder;

// =============================================================================
// Default Values
// =============================================================================

/// Default limit on sub-directory nesting.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Default limit on directories visited in one decode.
pub const DEFAULT_MAX_DIRECTORIES: usize = 4096;

// =============================================================================
// DecodeOptions
// =============================================================================

/// Limits applied while walking a directory tree.
///
/// Cycles are always rejected; these bound the work a well-formed but
/// hostile file can cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest sub-directory level followed (top-level directories are 0).
    pub max_depth: usize,

    /// Most directories, top-level and nested, decoded in one call.
    pub max_directories: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_directories: DEFAULT_MAX_DIRECTORIES,
        }
    }
}

impl DecodeOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_directories(mut self, max_directories: usize) -> Self {
        self.max_directories = max_directories;
        self
    }

    /// Validate the limits and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_directories == 0 {
            return Err("max_directories must be greater than 0".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// tiffdir - inspect and rewrite TIFF directory structure.
///
/// Works on tags and values only; image data is carried as opaque entries.
#[derive(Parser, Debug, Clone)]
#[command(name = "tiffdir")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Decode a file and print its directories as JSON.
    Dump(DumpConfig),

    /// Encode a JSON container into a TIFF stream.
    Build(BuildConfig),

    /// Decode a file and encode it again with a fresh layout.
    Rewrite(RewriteConfig),
}

/// Byte order selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrderArg {
    /// "II"
    #[default]
    Little,
    /// "MM"
    Big,
}

impl From<ByteOrderArg> for ByteOrder {
    fn from(arg: ByteOrderArg) -> Self {
        match arg {
            ByteOrderArg::Little => ByteOrder::LittleEndian,
            ByteOrderArg::Big => ByteOrder::BigEndian,
        }
    }
}

/// Limits shared by every subcommand that decodes.
#[derive(Args, Debug, Clone)]
pub struct LimitArgs {
    /// Deepest sub-directory level to follow.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH, env = "TIFFDIR_MAX_DEPTH")]
    pub max_depth: usize,

    /// Most directories to decode.
    #[arg(long, default_value_t = DEFAULT_MAX_DIRECTORIES, env = "TIFFDIR_MAX_DIRECTORIES")]
    pub max_directories: usize,
}

impl LimitArgs {
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions::default()
            .with_max_depth(self.max_depth)
            .with_max_directories(self.max_directories)
    }
}

#[derive(Args, Debug, Clone)]
pub struct DumpConfig {
    /// TIFF file to read.
    pub input: PathBuf,

    /// Print one line per directory instead of JSON.
    #[arg(long, default_value_t = false)]
    pub summary: bool,

    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Args, Debug, Clone)]
pub struct BuildConfig {
    /// JSON container to read.
    pub input: PathBuf,

    /// TIFF file to write.
    pub output: PathBuf,

    /// Byte order of the written file.
    #[arg(long, value_enum, default_value_t = ByteOrderArg::Little, env = "TIFFDIR_BYTE_ORDER")]
    pub byte_order: ByteOrderArg,
}

#[derive(Args, Debug, Clone)]
pub struct RewriteConfig {
    /// TIFF file to read.
    pub input: PathBuf,

    /// TIFF file to write.
    pub output: PathBuf,

    /// Byte order of the written file; defaults to the input's.
    #[arg(long, value_enum, env = "TIFFDIR_BYTE_ORDER")]
    pub byte_order: Option<ByteOrderArg>,

    #[command(flatten)]
    pub limits: LimitArgs,
}

impl RewriteConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.input == self.output {
            return Err("input and output must be different files".to_string());
        }
        self.limits.decode_options().validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
