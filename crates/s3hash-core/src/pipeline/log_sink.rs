//! Dedicated log consumer: pipeline tasks log through a channel so the
//! calls into the shared logger happen on one task, in receipt order.

use tokio::sync::mpsc;

/// Event severity, mapped onto `tracing` levels by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// A log message in flight from a pipeline task to the sink.
#[derive(Debug)]
pub struct LogEvent {
    pub severity: Severity,
    pub message: String,
}

/// Clonable sending side of the log channel. A send after the sink has
/// exited is dropped rather than treated as an error.
#[derive(Clone)]
pub struct LogHandle {
    tx: mpsc::Sender<LogEvent>,
}

impl LogHandle {
    pub fn new(tx: mpsc::Sender<LogEvent>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, severity: Severity, message: impl Into<String>) {
        let _ = self
            .tx
            .send(LogEvent {
                severity,
                message: message.into(),
            })
            .await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.send(Severity::Error, message).await;
    }

    pub async fn debug(&self, message: impl Into<String>) {
        self.send(Severity::Debug, message).await;
    }
}

/// Forward events to the logger until the channel is closed and drained.
pub(super) async fn run_sink(mut rx: mpsc::Receiver<LogEvent>) {
    while let Some(event) = rx.recv().await {
        match event.severity {
            Severity::Error => tracing::error!("{}", event.message),
            Severity::Warn => tracing::warn!("{}", event.message),
            Severity::Info => tracing::info!("{}", event.message),
            Severity::Debug => tracing::debug!("{}", event.message),
        }
    }
}
