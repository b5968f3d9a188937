use std::{fmt, sync::Arc};

use anyhow::{Context, Result};
use futures::Future;
use tokio::sync::Notify;
use tracing::{error, info};

use crate::{dispatcher::Dispatcher, mcp::tool_server, prometheus::prometheus_server, slack::ChatFrontend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Starting,
    Running,
    Stopped,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SupervisorState::Starting => "starting",
            SupervisorState::Running => "running",
            SupervisorState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Starting -> Running -> Stopped, where Stopped is terminal
#[derive(Debug)]
struct Lifecycle {
    state: SupervisorState,
}

impl Lifecycle {
    fn new() -> Lifecycle {
        Lifecycle {
            state: SupervisorState::Starting,
        }
    }

    fn transition(&mut self, next: SupervisorState) {
        if self.state == SupervisorState::Stopped || self.state == next {
            return;
        }
        info!("supervisor: {} -> {next}", self.state);
        self.state = next;
    }
}

/// Owns both front-ends and the metrics endpoint for the lifetime of the process
pub struct Supervisor {
    lifecycle: Lifecycle,
    dispatcher: Dispatcher,
    chat: ChatFrontend,
    mcp_port: u16,
    metrics_port: u16,
}

impl Supervisor {
    pub fn new(dispatcher: Dispatcher, chat: ChatFrontend, mcp_port: u16, metrics_port: u16) -> Supervisor {
        Supervisor {
            lifecycle: Lifecycle::new(),
            dispatcher,
            chat,
            mcp_port,
            metrics_port,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SupervisorState {
        self.lifecycle.state
    }

    /// Serve until the tool listener returns or `shutdown` resolves, then stop the chat loop and metrics
    ///
    /// Returns the final state, which is always `Stopped` when the listener shut down cleanly.
    pub async fn run<F>(self, shutdown: F) -> Result<SupervisorState>
    where
        F: Future<Output = ()>,
    {
        let Supervisor {
            mut lifecycle,
            dispatcher,
            chat,
            mcp_port,
            metrics_port,
        } = self;

        let chat_shutdown = Arc::new(Notify::new());
        let chat_signal = chat_shutdown.clone();
        let chat_task = tokio::spawn(async move { chat.run(chat_signal).await });

        let metrics_shutdown = Arc::new(Notify::new());
        let metrics_signal = metrics_shutdown.clone();
        let metrics_task =
            tokio::spawn(async move { prometheus_server(metrics_port, metrics_signal.notified()).await });

        lifecycle.transition(SupervisorState::Running);
        let served = tool_server(dispatcher, mcp_port, shutdown).await;
        lifecycle.transition(SupervisorState::Stopped);

        // the chat loop closes its websocket before returning
        chat_shutdown.notify_one();
        if let Err(e) = chat_task.await {
            error!("Chat front-end task failed: {e}");
        }
        metrics_shutdown.notify_one();
        match metrics_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Metrics endpoint failed: {e}"),
            Err(e) => error!("Metrics endpoint task failed: {e}"),
        }

        served.context("tool endpoint failed")?;
        Ok(lifecycle.state)
    }
}

/// Resolves on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Could not listen for Ctrl-C: {e}");
            futures::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Could not listen for SIGTERM: {e}");
                futures::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = futures::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
