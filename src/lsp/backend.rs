use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use parking_lot::Mutex;

use tokio::sync::RwLock;

use tower_lsp::Client;

use tracing::info;

use crate::lsp::features::auto_insert::{AutoInsertEndpoint, AutoInsertRegistry};
use crate::lsp::formatting;

pub mod document_gate;
mod handlers;
mod state;

use document_gate::DocumentGate;
pub use state::WeftBackend;

impl WeftBackend {
    /// Creates a backend wired to `client`, with the standard provider set.
    pub fn new(client: Client) -> Self {
        WeftBackend::with_registry(client, AutoInsertRegistry::standard())
    }

    /// Creates a backend with a caller-supplied provider registry.
    pub fn with_registry(client: Client, registry: AutoInsertRegistry) -> Self {
        let registry = Arc::new(registry);
        let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
        let gate = DocumentGate::spawn(shutdown_tx.subscribe());
        let endpoint = AutoInsertEndpoint::new(
            registry.clone(),
            gate.clone(),
            formatting::context_permits(),
        );
        info!(
            triggers = ?registry.trigger_characters(),
            "auto-insertion providers registered"
        );

        WeftBackend {
            client,
            documents_by_uri: Arc::new(RwLock::new(HashMap::new())),
            documents_by_id: Arc::new(RwLock::new(HashMap::new())),
            serial_document_id: Arc::new(AtomicU32::new(0)),
            registry,
            gate,
            auto_insert: Arc::new(endpoint),
            inflight_auto_insert: Arc::new(Mutex::new(HashMap::new())),
            auto_insert_serial: Arc::new(AtomicU64::new(0)),
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    fn next_document_id(&self) -> u32 {
        self.serial_document_id.fetch_add(1, Ordering::SeqCst)
    }
}
