//! Interactive read-eval-print loop.

use crate::controller::Controller;
use std::future::Future;
use std::io::{self, BufRead};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Prompt printed before every line.
pub const PROMPT: &str = ">> ";

const LINE_BUFFER: usize = 16;

/// Why the prompt loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The operator typed `exit`.
    Command,
    /// Input reached end of file.
    EndOfInput,
    /// A shutdown signal arrived.
    Signal,
}

/// Read lines from `reader` on a dedicated OS thread and forward them over a
/// channel.
///
/// The thread is detached and never joined, so a read that never completes
/// does not keep the runtime or the process alive. It exits at end of input,
/// after the first read error, or once the receiver is dropped.
pub fn spawn_line_reader<R>(reader: R) -> io::Result<mpsc::Receiver<io::Result<String>>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    std::thread::Builder::new()
        .name("queuectl-input".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
            debug!("Input reader stopped");
        })?;
    Ok(rx)
}

/// Read commands from `lines` until `exit`, end of input or `shutdown`
/// resolves, writing each reply to `output`.
///
/// Does not stop workers; call [`Controller::shutdown`] afterwards.
pub async fn run<W, S>(
    controller: &mut Controller,
    mut lines: mpsc::Receiver<io::Result<String>>,
    mut output: W,
    shutdown: S,
) -> io::Result<ExitReason>
where
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let line = tokio::select! {
            line = lines.recv() => line.transpose()?,
            () = &mut shutdown => {
                output.write_all(b"\n").await?;
                return Ok(ExitReason::Signal);
            }
        };

        let Some(line) = line else {
            output.write_all(b"\n").await?;
            return Ok(ExitReason::EndOfInput);
        };

        if let Some(reply) = controller.handle_line(&line).await {
            output.write_all(format!("{reply}\n").as_bytes()).await?;
            if reply.is_exit() {
                return Ok(ExitReason::Command);
            }
        }
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
