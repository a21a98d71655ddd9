//! Backend state for the Weft language server.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64};

use parking_lot::Mutex;

use tokio::sync::RwLock;

use tokio_util::sync::CancellationToken;

use tower_lsp::Client;
use tower_lsp::lsp_types::Url;

use crate::lsp::features::auto_insert::{AutoInsertEndpoint, AutoInsertRegistry};
use crate::lsp::models::LspDocument;

use super::document_gate::DocumentGate;

/// Cancellation handle for one in-flight auto-insertion request.
#[derive(Clone)]
pub(super) struct InflightRequest {
    pub(super) generation: u64,
    pub(super) cancel: CancellationToken,
}

/// The Weft language server backend, managing state and handling LSP requests.
#[derive(Clone)]
pub struct WeftBackend {
    pub(super) client: Client,
    pub(super) documents_by_uri: Arc<RwLock<HashMap<Url, Arc<LspDocument>>>>,
    pub(super) documents_by_id: Arc<RwLock<HashMap<u32, Arc<LspDocument>>>>,
    pub(super) serial_document_id: Arc<AtomicU32>,
    /// Fixed provider set; also the source of the advertised trigger set.
    pub(super) registry: Arc<AutoInsertRegistry>,
    pub(super) gate: DocumentGate,
    pub(super) auto_insert: Arc<AutoInsertEndpoint>,
    /// In-flight auto-insertion requests by document; a newer keystroke on
    /// the same document supersedes (and cancels) the previous one.
    pub(super) inflight_auto_insert: Arc<Mutex<HashMap<Url, InflightRequest>>>,
    pub(super) auto_insert_serial: Arc<AtomicU64>,
    pub(super) shutdown_tx: Arc<tokio::sync::broadcast::Sender<()>>,
}

impl std::fmt::Debug for WeftBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeftBackend")
            .field("triggers", &self.registry.trigger_characters())
            .finish()
    }
}
