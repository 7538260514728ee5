//! Worker mode: host the color service in the foreground.

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use accent_color::ColorApplier;
use accent_protocol::WorkerMessage;
use accent_service::{ColorService, ServiceConfig};

use crate::cli::ServeArgs;

/// Runs the color service until Ctrl-C or termination by the supervisor.
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(write_messages(rx));

    let config = ServiceConfig {
        port: args.port,
        allow_cross_origin: args.cors,
    };
    let service = ColorService::new(config, ColorApplier::system(), Some(tx));

    let on_signal = Arc::clone(&service);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("SIGINT received, shutting down");
            on_signal.shutdown();
        }
    });

    service.run().await?;
    Ok(())
}

/// Writes each message as one stdout line for the supervisor.
async fn write_messages(mut rx: mpsc::UnboundedReceiver<WorkerMessage>) {
    let mut stdout = tokio::io::stdout();
    while let Some(message) = rx.recv().await {
        let line = match message.to_line() {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("failed to encode worker message: {e}");
                continue;
            }
        };
        // Best-effort: nobody may be reading when run by hand.
        if stdout.write_all(line.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            break;
        }
    }
}
