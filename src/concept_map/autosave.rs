//! Debounced map autosave
//!
//! The in-memory map is the working copy. Every edit hands the saver a full
//! snapshot; the snapshot is written once no newer edit has arrived for the
//! debounce window. A periodic timer also writes the latest unsaved
//! snapshot. Writes run one at a time inside the saver task, so for a given
//! session they reach the store in order. Switching maps drops any pending
//! write for the previous map.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::models::ConceptMap;
use crate::storage::StoreError;

/// Quiet period after the last edit before a write
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Period of the background autosave
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Destination for map snapshots
#[async_trait]
pub trait MapWriter: Send + Sync {
    async fn write_map(&self, map: &ConceptMap) -> Result<(), StoreError>;
}

/// Save indicator state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error(String),
}

impl std::fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveStatus::Idle => write!(f, "idle"),
            SaveStatus::Saving => write!(f, "saving..."),
            SaveStatus::Saved => write!(f, "saved"),
            SaveStatus::Error(message) => write!(f, "error: {}", message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveSettings {
    pub debounce: Duration,
    pub interval: Duration,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Messages to control the saver task
#[derive(Debug)]
enum AutosaveMessage {
    /// The map changed; re-arm the debounce timer
    Edit(ConceptMap),
    /// A different map is now open; pending writes are discarded
    SwitchMap(ConceptMap),
    /// Write the pending snapshot now and report the outcome
    Flush(oneshot::Sender<SaveStatus>),
    Shutdown,
}

/// Handle for a running autosave task
pub struct Autosaver {
    sender: mpsc::Sender<AutosaveMessage>,
    status: watch::Receiver<SaveStatus>,
    task: JoinHandle<()>,
}

impl Autosaver {
    /// Start the saver task for `map`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<W>(writer: Arc<W>, map: ConceptMap, settings: AutosaveSettings) -> Self
    where
        W: MapWriter + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::channel(64);
        let (status_tx, status_rx) = watch::channel(SaveStatus::Idle);

        let task = tokio::spawn(async move {
            autosave_loop(writer, map, settings, rx, status_tx).await;
        });

        Self {
            sender: tx,
            status: status_rx,
            task,
        }
    }

    async fn send(&self, message: AutosaveMessage) {
        if self.sender.send(message).await.is_err() {
            log::warn!("autosave: saver task is gone, message dropped");
        }
    }

    /// Record a new snapshot of the open map
    pub async fn edit(&self, map: ConceptMap) {
        self.send(AutosaveMessage::Edit(map)).await;
    }

    /// Open a different map, cancelling any pending write of the current one
    pub async fn switch_map(&self, map: ConceptMap) {
        self.send(AutosaveMessage::SwitchMap(map)).await;
    }

    /// Write any pending snapshot immediately
    pub async fn flush(&self) -> SaveStatus {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(AutosaveMessage::Flush(reply_tx)).await;
        reply_rx
            .await
            .unwrap_or_else(|_| SaveStatus::Error("autosave task stopped".to_string()))
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    /// Stop the task. Unflushed edits are discarded.
    pub async fn shutdown(self) {
        self.send(AutosaveMessage::Shutdown).await;
        if let Err(e) = self.task.await {
            log::error!("autosave: task ended abnormally: {}", e);
        }
    }
}

/// Write `map` and publish the outcome
async fn write_snapshot<W>(
    writer: &W,
    map: &ConceptMap,
    status: &watch::Sender<SaveStatus>,
) -> SaveStatus
where
    W: MapWriter + ?Sized,
{
    let _ = status.send(SaveStatus::Saving);
    let outcome = match writer.write_map(map).await {
        Ok(()) => {
            log::info!("autosave: saved map {} ({} nodes)", map.id, map.nodes.len());
            SaveStatus::Saved
        }
        Err(e) => {
            // Local state is kept; only a later edit schedules another write
            log::error!("autosave: failed to save map {}: {}", map.id, e);
            SaveStatus::Error(e.to_string())
        }
    };
    let _ = status.send(outcome.clone());
    outcome
}

fn latest_status(status: &watch::Sender<SaveStatus>) -> SaveStatus {
    status.borrow().clone()
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Main saver loop
async fn autosave_loop<W>(
    writer: Arc<W>,
    map: ConceptMap,
    settings: AutosaveSettings,
    mut receiver: mpsc::Receiver<AutosaveMessage>,
    status: watch::Sender<SaveStatus>,
) where
    W: MapWriter + ?Sized,
{
    log::info!("autosave: started for map {}", map.id);

    let mut current = map;
    let mut dirty = false;
    let mut deadline: Option<Instant> = None;

    let mut ticker = tokio::time::interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = sleep_until_deadline(deadline) => {
                deadline = None;
                if dirty {
                    dirty = false;
                    write_snapshot(writer.as_ref(), &current, &status).await;
                }
            }

            _ = ticker.tick() => {
                if dirty {
                    log::debug!("autosave: periodic save of map {}", current.id);
                    deadline = None;
                    dirty = false;
                    write_snapshot(writer.as_ref(), &current, &status).await;
                }
            }

            msg = receiver.recv() => {
                match msg {
                    Some(AutosaveMessage::Edit(map)) => {
                        if map.id != current.id {
                            log::warn!(
                                "autosave: edit for map {} while {} is open, ignoring",
                                map.id,
                                current.id
                            );
                            continue;
                        }
                        current = map;
                        dirty = true;
                        deadline = Some(Instant::now() + settings.debounce);
                    }
                    Some(AutosaveMessage::SwitchMap(map)) => {
                        if dirty {
                            log::info!("autosave: discarding pending save of map {}", current.id);
                        }
                        current = map;
                        dirty = false;
                        deadline = None;
                        let _ = status.send(SaveStatus::Idle);
                    }
                    Some(AutosaveMessage::Flush(reply)) => {
                        let outcome = if dirty {
                            deadline = None;
                            dirty = false;
                            write_snapshot(writer.as_ref(), &current, &status).await
                        } else {
                            latest_status(&status)
                        };
                        let _ = reply.send(outcome);
                    }
                    Some(AutosaveMessage::Shutdown) | None => {
                        log::info!("autosave: shutting down");
                        break;
                    }
                }
            }
        }
    }
}
