// Debug logging module for asynchronous session logging
//
// Fire-and-forget async logging so the tick path never waits on disk. Every
// engine event is written as one JSON line; the replay tool reads them back.
// A single writer task owns the file, so lines land in the order they were
// logged.

use log::error;
use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};

use crate::types::{AgentId, Direction, FinalScore, RawPositions};

/// One engine event as recorded in the session log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Start {
        player_id: AgentId,
    },
    State {
        positions: RawPositions,
        chosen_move: Option<Direction>,
    },
    Die {
        player_id: AgentId,
    },
    Finish {
        #[serde(default)]
        scores: Vec<FinalScore>,
    },
    Error {
        player_id: AgentId,
        code: u8,
    },
}

/// A session event with its wall-clock timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(flatten)]
    pub event: SessionEvent,
    pub timestamp: String,
}

enum WriterCommand {
    Entry(LogEntry),
    Flush(oneshot::Sender<()>),
}

/// Shared debug logger handle
/// Cloning is cheap; every clone feeds the same writer task
#[derive(Clone)]
pub struct DebugLogger {
    sender: Option<mpsc::UnboundedSender<WriterCommand>>,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    /// and spawns the writer task, so it must be called inside a tokio runtime
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                let (sender, receiver) = mpsc::unbounded_channel();
                tokio::spawn(Self::run_writer(file, receiver));
                DebugLogger {
                    sender: Some(sender),
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger { sender: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Logs an event asynchronously (fire-and-forget)
    /// The entry is timestamped and queued immediately; the writer task
    /// performs the disk write
    pub fn log(&self, event: SessionEvent) {
        let Some(sender) = &self.sender else {
            return;
        };

        let entry = LogEntry {
            event,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        if sender.send(WriterCommand::Entry(entry)).is_err() {
            error!("Debug log writer has stopped, entry dropped");
        }
    }

    /// Waits until every entry logged so far is on disk
    pub async fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };
        let (done, finished) = oneshot::channel();
        if sender.send(WriterCommand::Flush(done)).is_ok() {
            let _ = finished.await;
        }
    }

    async fn run_writer(mut file: File, mut receiver: mpsc::UnboundedReceiver<WriterCommand>) {
        while let Some(command) = receiver.recv().await {
            match command {
                WriterCommand::Entry(entry) => Self::write_entry(&mut file, &entry).await,
                WriterCommand::Flush(done) => {
                    if let Err(e) = file.flush().await {
                        error!("Failed to flush debug log: {}", e);
                    }
                    let _ = done.send(());
                }
            }
        }
    }

    async fn write_entry(file: &mut File, entry: &LogEntry) {
        match serde_json::to_string(entry) {
            Ok(json_line) => {
                let line_with_newline = format!("{}\n", json_line);
                if let Err(e) = file.write_all(line_with_newline.as_bytes()).await {
                    error!("Failed to write debug log entry: {}", e);
                } else if let Err(e) = file.flush().await {
                    error!("Failed to flush debug log: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to serialize debug log entry: {}", e);
            }
        }
    }
}
