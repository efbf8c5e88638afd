//! CLI argument definitions for `tdd2rm`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "tdd2rm",
    version,
    about = "Transform TDD instances into openEHR RM compositions",
    long_about = "Transform Template Data Design (TDD) XML instances into openEHR \
                  Reference Model compositions.\n\n\
                  Schema metadata is taken from the template's TDS, resolved by \
                  template id (disk cache, then shipped schemas) or by the \
                  instance's schema location."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to $TDD2RM_CONFIG, then ./tdd2rm.toml).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Transform a TDD instance into an RM composition.
    Transform(TransformArgs),

    /// Index a TDS and list its locatable element definitions.
    Index(IndexArgs),

    /// Manage the on-disk schema index cache.
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Parser)]
pub struct TransformArgs {
    /// TDD instance to transform.
    #[arg(value_name = "TDD")]
    pub input: PathBuf,

    /// Write the composition here instead of stdout.
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Emit the RM namespace as the default namespace (no element prefixes).
    #[arg(long = "canonical")]
    pub canonical: bool,

    /// Fixed timestamp for synthesized OBSERVATION origins.
    ///
    /// Defaults to the current local time, e.g. 2024-01-15T10:00:00.000.
    #[arg(long = "origin-time", value_name = "TIMESTAMP")]
    pub origin_time: Option<String>,
}

#[derive(Parser)]
pub struct IndexArgs {
    /// TDS schema file to index.
    #[arg(value_name = "TDS")]
    pub schema: PathBuf,

    /// Persist the index to the configured cache folder.
    #[arg(long = "save")]
    pub save: bool,
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Remove the cached index for a template.
    Clear {
        #[arg(value_name = "TEMPLATE_ID")]
        template_id: String,
    },
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
