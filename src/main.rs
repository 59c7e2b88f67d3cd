use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use logmon::{claim, run_read, Monitor, Overrides, PidFileGuard, RunContext};
use logmon_core::config::Settings;
use logmon_core::{Mode, MonitorError, ResultCode};

#[derive(Parser)]
#[command(
    name = "logmon",
    version,
    about = "Incremental logfile pattern monitor with a read-once event mailbox"
)]
struct Cli {
    /// Settings file (TOML). Defaults to ~/.config/logmon/settings.toml.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Result-code description table (YAML).
    #[arg(long, global = true)]
    codes: Option<PathBuf>,

    /// Write debug logs to /tmp/logmon-debug.log (tail -f to inspect).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the configured logfiles and append matches to the mailbox.
    Run {
        /// Monitor document (YAML).
        #[arg(long)]
        config: PathBuf,
        /// Mailbox file events are appended to.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Offset table file.
        #[arg(long)]
        offsets: Option<PathBuf>,
        /// Stop after this many cycles; 0 runs until terminated.
        #[arg(long)]
        cycles: Option<u64>,
        /// Seconds to sleep between cycles.
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Drain unread mailbox records to stdout, once.
    Read {
        /// Read format document (YAML: separator + fields).
        #[arg(long)]
        config: PathBuf,
        /// Mailbox file to drain.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(ResultCode::InvalidUsage.exit_status())
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = init_logging(cli.debug) {
        eprintln!("logmon: {e:#}");
    }

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.code();
            tracing::error!(rc = code.as_u16(), error = %err, "logmon stopped");
            eprintln!("logmon: {err}");
            ExitCode::from(code.exit_status())
        }
    }
}

fn init_logging(debug: bool) -> anyhow::Result<()> {
    if debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/logmon-debug.log")
            .context("cannot open /tmp/logmon-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("logmon debug log started (tail -f /tmp/logmon-debug.log)");
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .init();
    }
    Ok(())
}

fn dispatch(cli: Cli) -> Result<(), MonitorError> {
    let settings = Settings::load(cli.settings.as_deref())?;

    match cli.command {
        Command::Run {
            config,
            output,
            offsets,
            cycles,
            interval,
        } => {
            let ctx = RunContext::from_settings(
                settings,
                Overrides {
                    mailbox: output,
                    offsets,
                    codes: cli.codes,
                    cycles,
                    interval_secs: interval,
                },
            )?;
            let mut guard = PidFileGuard::new(&ctx.guard_dir);
            claim(&mut guard, Mode::Run, Some(&ctx.writer()))?;
            Monitor::new(ctx, config)?.run()
        }
        Command::Read { config, output } => {
            let ctx = RunContext::from_settings(
                settings,
                Overrides {
                    mailbox: output,
                    codes: cli.codes,
                    ..Overrides::default()
                },
            )?;
            let mut guard = PidFileGuard::new(&ctx.guard_dir);
            claim(&mut guard, Mode::Read, None)?;
            run_read(&ctx, &config, std::io::stdout().lock())?;
            Ok(())
        }
    }
}
