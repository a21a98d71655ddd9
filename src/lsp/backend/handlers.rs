//! LSP protocol handler implementations
//!
//! This module contains the `tower_lsp::LanguageServer` implementation for
//! the Weft backend — lifecycle handlers (initialize, initialized, shutdown)
//! and document lifecycle (did_open, did_change, did_close) — plus the
//! handler for the custom `textDocument/autoInsert` method.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use ropey::Rope;

use tokio::sync::RwLock;

use tokio_util::sync::CancellationToken;

use tower_lsp::{LanguageServer, jsonrpc};
use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    InitializeParams, InitializeResult, InitializedParams, MessageType, ServerCapabilities,
    ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind, Url,
};

use tracing::{debug, info, warn};

use crate::lsp::features::auto_insert::{AutoInsertParams, AutoInsertResponse};
use crate::lsp::models::{LspDocument, LspDocumentHistory, LspDocumentState};

use super::state::{InflightRequest, WeftBackend};

#[tower_lsp::async_trait]
impl LanguageServer for WeftBackend {
    /// Handles the LSP initialize request, advertising the auto-insertion
    /// capability with the registry's full trigger-character set.
    async fn initialize(&self, _: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        info!("Received initialize request");

        let trigger_characters = self.registry.trigger_characters();
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                experimental: Some(serde_json::json!({
                    "autoInsertProvider": {
                        "triggerCharacters": trigger_characters,
                    },
                })),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "weft-language-server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("Server initialized");
        self.client
            .log_message(MessageType::INFO, "weft-language-server initialized")
            .await;
    }

    async fn shutdown(&self) -> jsonrpc::Result<()> {
        info!("Received shutdown request");
        let _ = self.shutdown_tx.send(());
        Ok(())
    }

    /// Handles opening a text document and mirrors it into the gate.
    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri.clone();
        let version = params.text_document.version;
        info!(%uri, version, "opening document");

        let id = self.next_document_id();
        let document = Arc::new(LspDocument {
            id,
            state: RwLock::new(LspDocumentState {
                uri: uri.clone(),
                text: Rope::from_str(&params.text_document.text),
                version,
                history: LspDocumentHistory::default(),
            }),
        });
        self.documents_by_uri
            .write()
            .await
            .insert(uri.clone(), document.clone());
        self.documents_by_id.write().await.insert(id, document.clone());

        self.gate.upsert(uri, version, document.rope().await).await;
    }

    /// Handles a document change, cancelling any in-flight auto-insertion
    /// for the document it invalidates.
    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.clone();
        let version = params.text_document.version;

        // The document is changing underneath any request still running.
        self.cancel_pending_auto_insert(&uri);

        let document = self.documents_by_uri.read().await.get(&uri).cloned();
        let Some(document) = document else {
            warn!(%uri, "change for a document that was never opened");
            return;
        };

        match document.apply(params.content_changes, version).await {
            Ok(text) => {
                debug!(%uri, version, "document updated");
                self.gate.upsert(uri, version, text).await;
            }
            Err(error) => {
                warn!(%uri, version, %error, "rejected document change");
            }
        }
    }

    /// Handles closing a text document.
    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.cancel_pending_auto_insert(&uri);

        let document = self.documents_by_uri.write().await.remove(&uri);
        if let Some(document) = document {
            self.documents_by_id.write().await.remove(&document.id);
            info!(%uri, id = document.id, "closed document");
        } else {
            warn!(%uri, "closed document not found");
        }

        self.gate.remove(uri).await;
    }
}

impl WeftBackend {
    /// Handler for the custom `textDocument/autoInsert` method.
    pub async fn on_auto_insert(
        &self,
        params: AutoInsertParams,
    ) -> jsonrpc::Result<Option<AutoInsertResponse>> {
        Ok(self.resolve_auto_insert(params).await)
    }

    async fn resolve_auto_insert(&self, params: AutoInsertParams) -> Option<AutoInsertResponse> {
        let uri = params.text_document.uri.clone();
        let generation = self.auto_insert_serial.fetch_add(1, Ordering::SeqCst);
        let cancel = CancellationToken::new();

        {
            let mut inflight = self.inflight_auto_insert.lock();
            if let Some(previous) = inflight.insert(
                uri.clone(),
                InflightRequest {
                    generation,
                    cancel: cancel.clone(),
                },
            ) {
                // A newer keystroke supersedes the request still running.
                previous.cancel.cancel();
            }
        }

        let inflight = self.inflight_auto_insert.clone();
        let cleanup_uri = uri.clone();
        let _cleanup = scopeguard::guard((), move |_| {
            let mut inflight = inflight.lock();
            if inflight
                .get(&cleanup_uri)
                .is_some_and(|entry| entry.generation == generation)
            {
                inflight.remove(&cleanup_uri);
            }
        });

        self.auto_insert.resolve(params, cancel).await
    }

    /// Cancels any in-flight auto-insertion for `uri`. The running provider,
    /// if any, finishes its current evaluation; the pipeline observes the
    /// token at its next checkpoint.
    fn cancel_pending_auto_insert(&self, uri: &Url) {
        if let Some(entry) = self.inflight_auto_insert.lock().get(uri) {
            entry.cancel.cancel();
        }
    }
}
