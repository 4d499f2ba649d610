//! `vmap`: variable mapping command-line tool.

use std::future::Future;
use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;
use vmap_cli::logging::{LogConfig, LogFormat, init_logging};
use vmap_client::ApiClient;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, ConnectionArgs, LogFormatArg, LogLevelArg};
use crate::commands::{
    run_apply, run_check, run_delete, run_eval, run_list, run_lookup, run_push, run_push_direct,
    run_review, run_show, run_skeleton,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

/// Runs the selected command; `Ok(false)` means it completed but failed
/// its check.
fn run(cli: &Cli) -> Result<bool> {
    match &cli.command {
        Command::Skeleton => run_skeleton().map(|()| true),
        Command::Check(args) => run_check(args).map(|failed| !failed),
        Command::Eval(args) => run_eval(args).map(|()| true),
        Command::Show(args) => remote(&cli.connection, |client| async move {
            run_show(&client, args).await
        }),
        Command::Push(args) => remote(&cli.connection, |client| async move {
            run_push(&client, args).await
        }),
        Command::PushDirect(args) => remote(&cli.connection, |client| async move {
            run_push_direct(&client, args).await
        }),
        Command::Review(args) => remote(&cli.connection, |client| async move {
            run_review(&client, args).await
        }),
        Command::List => remote(&cli.connection, |client| async move { run_list(&client).await }),
        Command::Delete(args) => remote(&cli.connection, |client| async move {
            run_delete(&client, args).await
        }),
        Command::Lookup(args) => remote(&cli.connection, |client| async move {
            run_lookup(&client, args).await
        }),
        Command::Apply(args) => remote(&cli.connection, |client| async move {
            run_apply(&client, args).await
        }),
    }
}

/// Builds the client and drives `command` on a fresh runtime.
fn remote<F, Fut>(connection: &ConnectionArgs, command: F) -> Result<bool>
where
    F: FnOnce(ApiClient) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let settings = connection
        .overrides()
        .resolve()
        .context("load connection settings")?;
    let client = ApiClient::new(settings).context("create HTTP client")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    runtime.block_on(command(client))?;
    Ok(true)
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
