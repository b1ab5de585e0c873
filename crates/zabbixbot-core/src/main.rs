//! zabbixbot CLI
//!
//! Runs the Telegram bot, or queries Zabbix once from the command line.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use zabbixbot::aggregator::ProblemAggregator;
use zabbixbot::bot::{self, Channel, Dispatcher, PushScheduler, TelegramChannel};
use zabbixbot::config::{Config, DEFAULT_ENV_FILE};
use zabbixbot::Error;
use zabbixbot::formatter::Formatter;
use zabbixbot::models::GroupId;
use zabbixbot::zabbix::RpcClient;

/// zabbixbot - Zabbix problems in Telegram
#[derive(Parser)]
#[command(name = "zabbixbot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Dotenv file with BOT_TOKEN, API_URL and API_TOKEN
    #[arg(long, global = true, env = "ZABBIXBOT_ENV_FILE", default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (for commands that support it)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Telegram bot (default)
    Run,

    /// Aggregate one group and print the report
    Check {
        /// Host group ID (defaults to ILO_GROUP)
        #[arg(long)]
        group: Option<GroupId>,

        /// Minimum severity (defaults to MIN_SEVERITY)
        #[arg(long)]
        min_severity: Option<u8>,

        /// Show problems of disabled triggers with the disabled marker
        #[arg(long)]
        mark_disabled: bool,
    },

    /// Print the raw problem.get result of one or more groups
    Dump {
        /// Host group IDs
        #[arg(long = "group", required = true)]
        groups: Vec<GroupId>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration
    let config =
        Config::from_env_file(&cli.env_file).context("failed to load configuration")?;

    // Initialize logging
    let _guard = init_logging(&config, cli.verbose).context("failed to initialize logging")?;

    // Execute command
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_bot(config).await?,
        Commands::Check {
            group,
            min_severity,
            mark_disabled,
        } => run_check(config, group, min_severity, mark_disabled, cli.format).await?,
        Commands::Dump { groups } => run_dump(config, &groups).await?,
    }

    Ok(())
}

fn init_logging(config: &Config, verbose: bool) -> zabbixbot::Result<Option<WorkerGuard>> {
    let level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_writer, guard) = match config.logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let file_name = path
                .file_name()
                .ok_or_else(|| {
                    Error::config(format!("LOG_FILE has no file name: {}", path.display()))
                })?;
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let json = config.logging.format == "json";
    let pretty_layer = (!json).then(|| fmt::layer().with_writer(std::io::stderr));
    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let file_layer = file_writer.map(|writer| fmt::layer().with_ansi(false).with_writer(writer));

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty_layer)
        .with(json_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn build_aggregator(config: &Config) -> zabbixbot::Result<ProblemAggregator> {
    let rpc = RpcClient::new(&config.backend)?;
    debug!(endpoint = rpc.endpoint(), "Using Zabbix API");
    Ok(ProblemAggregator::new(
        Arc::new(rpc),
        config.backend.auth_token.clone(),
    ))
}

async fn run_bot(config: Config) -> zabbixbot::Result<()> {
    config.telegram.ensure_token()?;

    let dispatcher = Arc::new(Dispatcher::new(
        build_aggregator(&config)?,
        config.groups.clone(),
    ));

    let telegram = Arc::new(TelegramChannel::new(&config.telegram)?);
    if let Err(e) = telegram.set_commands().await {
        warn!(error = %e, "Failed to register bot commands");
    }
    let channel: Arc<dyn Channel> = telegram;

    let cancel = CancellationToken::new();

    let push_handle = match config.push.chat_id {
        Some(chat_id) if config.push.is_enabled() => {
            let scheduler = PushScheduler::new(
                dispatcher.clone(),
                channel.clone(),
                chat_id,
                config.push.interval(),
            );
            let push_cancel = cancel.clone();
            Some(tokio::spawn(async move {
                scheduler.run(push_cancel).await;
            }))
        }
        _ => None,
    };

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Receiving TERM signal, exiting");
        signal_cancel.cancel();
    });

    bot::serve(channel, dispatcher, cancel).await;

    if let Some(handle) = push_handle {
        let _ = handle.await;
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn run_check(
    config: Config,
    group: Option<GroupId>,
    min_severity: Option<u8>,
    mark_disabled: bool,
    format: OutputFormat,
) -> zabbixbot::Result<()> {
    let group = group.unwrap_or(config.groups.ilo_group);
    let min_severity = min_severity.unwrap_or(config.groups.min_severity);

    let aggregator = build_aggregator(&config)?;
    let result = aggregator
        .aggregate(group, min_severity, chrono::Utc::now().timestamp())
        .await?;

    match format {
        OutputFormat::Text => {
            let text = Formatter::new()
                .mark_disabled_triggers(mark_disabled)
                .render(&result)?;
            println!("{text}");
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(())
}

async fn run_dump(config: Config, groups: &[GroupId]) -> zabbixbot::Result<()> {
    let aggregator = build_aggregator(&config)?;
    for &group in groups {
        let problems = aggregator.raw_problems(group).await?;
        println!("{}", serde_json::to_string_pretty(&problems)?);
    }
    Ok(())
}
