use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use crate::error::Result;
use super::connection::{Connection, TransportSettings};

/// A running accept loop. Dropping the handle closes the shutdown channel,
/// which ends the loop as well; [`ListenerHandle::stop`] also waits for it.
#[derive(Debug)]
pub struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Closes the listening socket. Handlers already running are left alone.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                error!("Accept loop on {} ended abnormally: {}", self.local_addr, e);
            }
        }
    }
}

/// Binds `host:port` and spawns a task that hands every accepted connection
/// to `handler` on its own task.
pub async fn serve<H, F>(
    host: &str,
    port: u16,
    settings: TransportSettings,
    handler: H,
) -> Result<ListenerHandle>
where
    H: Fn(Connection) -> F + Send + Sync + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind((host, port)).await?;
    let local_addr = listener.local_addr()?;
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

    info!("Listening on {}", local_addr);

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("Accept loop on {} shutting down", local_addr);
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            debug!("Accepted connection from {}", addr);
                            let connection = Connection::accepted(stream, addr, settings);
                            tokio::spawn(handler(connection));
                        }
                        Err(e) => {
                            error!("Failed to accept connection on {}: {}", local_addr, e);
                            tokio::time::sleep(Duration::from_millis(100)).await;
                        }
                    }
                }
            }
        }
    });

    Ok(ListenerHandle {
        local_addr,
        shutdown_tx,
        task,
    })
}
