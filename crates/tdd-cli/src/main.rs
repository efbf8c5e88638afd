//! `tdd2rm` command-line entry point.

use std::io::{self, IsTerminal};

use anyhow::Context;
use clap::{ColorChoice, Parser};
use tdd_cli::commands::{index_table, run_cache_clear, run_index, run_transform};
use tdd_cli::logging::{LogConfig, LogFormat, init_logging};
use tdd_schema::Settings;
use tdd_transform::{NamespaceStyle, TransformOptions};
use tracing::level_filters::LevelFilter;

mod cli;

use crate::cli::{CacheCommand, Cli, Command, LogFormatArg, LogLevelArg, TransformArgs};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref()).context("load configuration")?;
    match &cli.command {
        Command::Transform(args) => {
            let outcome = run_transform(
                settings,
                &args.input,
                args.output.as_deref(),
                transform_options(args),
            )?;
            match &outcome.output {
                Some(path) => println!("Wrote {} to {}", outcome.root, path.display()),
                None => print!("{}", outcome.xml),
            }
        }
        Command::Index(args) => {
            let report = run_index(&settings, &args.schema, args.save)?;
            println!("{}", index_table(&report));
            println!(
                "Template {}: {} entries",
                report.template_id.as_deref().unwrap_or("<none>"),
                report.entries
            );
            if let Some(path) = &report.saved_to {
                println!("Saved index to {}", path.display());
            }
        }
        Command::Cache(CacheCommand::Clear { template_id }) => {
            if run_cache_clear(&settings, template_id)? {
                println!("Removed cached index for {template_id}");
            } else {
                println!("No cached index for {template_id}");
            }
        }
    }
    Ok(())
}

fn transform_options(args: &TransformArgs) -> TransformOptions {
    TransformOptions {
        namespace_style: if args.canonical {
            NamespaceStyle::Default
        } else {
            NamespaceStyle::Prefixed
        },
        origin_time: args.origin_time.clone(),
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
