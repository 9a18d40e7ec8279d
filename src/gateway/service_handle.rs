use anyhow::{anyhow, Result};
use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Background services of a running gateway plus the channel that stops them.
pub struct ServiceHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: JoinSet<Result<()>>,
}

impl ServiceHandle {
    /// New handle and the receiver services watch for the stop flag.
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (shutdown_tx, rx) = watch::channel(false);
        let handle = ServiceHandle { shutdown_tx, tasks: JoinSet::new() };
        (handle, rx)
    }

    pub fn spawn<F>(&mut self, service: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.tasks.spawn(service);
    }

    /// Run until `signal` resolves, then shut down.
    ///
    /// A service that exits first ends the run too: the others are stopped and
    /// its error is returned.
    pub async fn run_until<S: Future<Output = ()>>(mut self, signal: S) -> Result<()> {
        let early = tokio::select! {
            _ = signal => None,
            Some(joined) = self.tasks.join_next() => Some(joined),
        };

        match early {
            None => {
                info!("shutdown requested");
                self.shutdown().await
            }
            Some(joined) => {
                let cause = match joined {
                    Ok(Ok(())) => anyhow!("service stopped before shutdown was requested"),
                    Ok(Err(e)) => e,
                    Err(e) => anyhow!("service task panicked or was cancelled: {}", e),
                };
                error!("{:#}", cause);
                self.shutdown().await?;
                Err(cause)
            }
        }
    }

    /// Raise the stop flag and wait for every service to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);

        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("service task returned error: {:?}", e),
                Err(e) => error!("task join error: {:?}", e),
            }
        }
        Ok(())
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
