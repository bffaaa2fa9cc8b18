//! Step Timer CLI - activities made of timed steps
//!
//! `steptimer daemon` keeps time in the background; every other command
//! sends one request to it over a Unix socket and prints the result.

use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use steptimer::cli::{Cli, Commands, Display, IpcClient, WatchView};
use steptimer::daemon;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let client = IpcClient::from_option(cli.socket.clone());

    let response = match command {
        Commands::Status => {
            let response = client.status().await?;
            Display::show_status(&response);
            return Ok(());
        }
        Commands::Watch { interval_ms } => {
            return watch(&client, Duration::from_millis(interval_ms)).await;
        }
        Commands::Play(args) => client.play(args.target()).await?,
        Commands::Pause(args) => client.pause(args.target()).await?,
        Commands::Stop(args) => client.stop(args.target()).await?,
        Commands::Next(args) => client.next(args.target()).await?,
        Commands::Prev(args) => client.prev(args.target()).await?,
        Commands::Start(args) => client.play_activity(args.target()).await?,
        Commands::Halt(args) => client.stop_activity(args.target()).await?,
        Commands::AddActivity => client.add_activity().await?,
        Commands::RemoveActivity => client.remove_activity().await?,
        Commands::AddEvent(args) => client.add_event(args.target()).await?,
        Commands::RemoveEvent(args) => client.remove_event(args.target()).await?,
        Commands::Rename(args) => client.rename(args.activity, args.event, args.title).await?,
        Commands::SetDuration(args) => {
            let target = steptimer::types::EventTarget::new(args.activity, args.event);
            client.set_duration(target, args.input()).await?
        }
        Commands::Toggle(args) => client.toggle(args.target()).await?,
        Commands::Reset => client.reset().await?,
        Commands::Daemon(args) => {
            return daemon::run(args.to_config(cli.socket)).await;
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
            return Ok(());
        }
    };

    Display::show_result(&response);
    Ok(())
}

/// Polls the daemon and redraws whenever the activities change.
async fn watch(client: &IpcClient, interval: Duration) -> Result<()> {
    let client = client.clone().without_retries();
    let mut view = WatchView::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let response = client.status().await?;
                if let Some(frame) = response.data.as_ref().and_then(|data| view.frame(data)) {
                    print!("{}", frame);
                }
            }
            _ = &mut shutdown => return Ok(()),
        }
    }
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
