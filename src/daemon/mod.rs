//! Daemon module for the step timer.
//!
//! This module contains the long-running side of the application:
//! - `ipc`: Unix socket server and request dispatch
//! - `run`: wires the engine, ticker, notifier and server together

pub mod ipc;

use std::future::Future;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::engine::{run_ticker, Signal, SignalSink, TimerEngine};
use crate::persistence::JsonFileRepository;
use crate::sound::{dispatch, try_create_notifier, CueSounds, Notifier, SilentNotifier};
use crate::types::DaemonConfig;

pub use ipc::{IpcError, IpcServer, RequestHandler};

/// Runs the daemon until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, a configured sound
/// file is unusable, or the socket cannot be bound.
pub async fn run(config: DaemonConfig) -> Result<()> {
    config.validate().map_err(|e| anyhow!(e))?;

    let notifier = create_notifier(&config)?;
    let repository = JsonFileRepository::new(&config.data_file);
    let (signals, rx) = SignalSink::channel();
    let engine = Arc::new(Mutex::new(TimerEngine::load(Box::new(repository), signals)));

    let server = IpcServer::new(&config.socket_path)?;
    info!(
        "Daemon listening on {} (data: {})",
        config.socket_path.display(),
        config.data_file.display()
    );

    let ticker = tokio::spawn(run_ticker(Arc::clone(&engine), config.tick_interval()));
    let consumer = tokio::spawn(forward_signals(rx, notifier));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    serve(server, RequestHandler::new(engine), shutdown).await;

    ticker.abort();
    consumer.abort();
    info!("Daemon stopped");
    Ok(())
}

/// Accepts connections until `shutdown` completes.
///
/// Each connection is served on its own task; requests still queue on the
/// engine lock, so they apply one at a time.
pub async fn serve(server: IpcServer, handler: RequestHandler, shutdown: impl Future<Output = ()>) {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = server.accept() => match accepted {
                Ok(stream) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        if let Err(e) = IpcServer::serve_connection(stream, &handler).await {
                            warn!("IPC connection failed: {:#}", e);
                        }
                    });
                }
                Err(e) => warn!("{:#}", e),
            },
            () = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }
}

/// Feeds engine signals to the notifier until the engine is dropped.
pub async fn forward_signals(mut rx: mpsc::UnboundedReceiver<Signal>, notifier: Box<dyn Notifier>) {
    while let Some(signal) = rx.recv().await {
        debug!("Signal: {:?}", signal);
        dispatch(&signal, notifier.as_ref());
    }
}

fn create_notifier(config: &DaemonConfig) -> Result<Box<dyn Notifier>> {
    if !config.sound_enabled {
        info!("Sound disabled");
        return Ok(Box::new(SilentNotifier));
    }

    let sounds = CueSounds::from_paths(config.start_sound.as_deref(), config.alert_sound.as_deref())
        .context("Invalid sound configuration")?;

    Ok(match try_create_notifier(sounds) {
        Some(notifier) => Box::new(notifier),
        None => Box::new(SilentNotifier),
    })
}
