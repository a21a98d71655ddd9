//! Single-threaded access gate for document snapshots.
//!
//! All snapshot production and resolution is confined to one spawned task
//! that owns the document map. Callers talk to it over an mpsc channel and
//! await a oneshot reply, so requests complete in submission order and a
//! resolution never observes a document mid-update. Generation of the
//! derived output happens on the gate task too, when a document is upserted,
//! so every snapshot carries output consistent with its text.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ropey::Rope;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use tower_lsp::lsp_types::Url;

use tracing::{debug, trace, warn};

use crate::lsp::generated::{self, GeneratedOutput};

/// Immutable, versioned view of one document and its generated output.
#[derive(Debug)]
pub struct DocumentSnapshot {
    pub uri: Url,
    pub version: i32,
    pub text: Rope,
    pub generated: Arc<GeneratedOutput>,
}

enum GateCommand {
    Upsert {
        uri: Url,
        version: i32,
        text: Rope,
    },
    Remove {
        uri: Url,
    },
    Resolve {
        uri: Url,
        reply: oneshot::Sender<Option<Arc<DocumentSnapshot>>>,
    },
}

/// Handle to the gate task. Cloning shares the same task and counters.
#[derive(Clone)]
pub struct DocumentGate {
    tx: mpsc::Sender<GateCommand>,
    resolutions: Arc<AtomicU64>,
}

impl DocumentGate {
    /// Spawns the gate task. It runs until the shutdown signal fires or all
    /// handles are dropped.
    pub fn spawn(mut shutdown: broadcast::Receiver<()>) -> Self {
        let (tx, mut rx) = mpsc::channel::<GateCommand>(64);

        tokio::spawn(async move {
            let mut snapshots: HashMap<Url, Arc<DocumentSnapshot>> = HashMap::new();
            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        debug!("document gate received shutdown signal");
                        break;
                    }
                    command = rx.recv() => {
                        let Some(command) = command else { break };
                        match command {
                            GateCommand::Upsert { uri, version, text } => {
                                let generated = Arc::new(generated::generate(&text));
                                if generated.is_unsupported() {
                                    debug!(%uri, version, "generated output unsupported");
                                }
                                let snapshot = Arc::new(DocumentSnapshot {
                                    uri: uri.clone(),
                                    version,
                                    text,
                                    generated,
                                });
                                snapshots.insert(uri.clone(), snapshot);
                                trace!(%uri, version, "snapshot updated");
                            }
                            GateCommand::Remove { uri } => {
                                snapshots.remove(&uri);
                                trace!(%uri, "snapshot removed");
                            }
                            GateCommand::Resolve { uri, reply } => {
                                // The requester may have been cancelled and
                                // dropped its receiver; that is not an error.
                                let _ = reply.send(snapshots.get(&uri).cloned());
                            }
                        }
                    }
                }
            }
            debug!("document gate task terminated");
        });

        DocumentGate {
            tx,
            resolutions: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stores a new snapshot for `uri`, generating its output on the gate
    /// task.
    pub async fn upsert(&self, uri: Url, version: i32, text: Rope) {
        if self
            .tx
            .send(GateCommand::Upsert { uri, version, text })
            .await
            .is_err()
        {
            warn!("document gate is gone; dropping upsert");
        }
    }

    /// Drops the snapshot for `uri`.
    pub async fn remove(&self, uri: Url) {
        if self.tx.send(GateCommand::Remove { uri }).await.is_err() {
            warn!("document gate is gone; dropping removal");
        }
    }

    /// Resolves the current snapshot for `uri`.
    ///
    /// A request cancelled before or during resolution resolves to `None`,
    /// as if the document were absent.
    pub async fn resolve(
        &self,
        uri: &Url,
        cancel: &CancellationToken,
    ) -> Option<Arc<DocumentSnapshot>> {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        if cancel.is_cancelled() {
            return None;
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(GateCommand::Resolve {
                uri: uri.clone(),
                reply: reply_tx,
            })
            .await
            .ok()?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            snapshot = reply_rx => snapshot.ok().flatten(),
        }
    }

    /// Number of resolutions requested so far.
    pub fn resolution_count(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }
}
