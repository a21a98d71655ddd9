//! The per-keystroke insertion resolution pipeline.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use tracing::{debug, trace};

use crate::lsp::backend::document_gate::DocumentGate;
use crate::lsp::formatting::FormattingContext;

use super::registry::AutoInsertRegistry;
use super::{AutoInsertParams, AutoInsertResponse};

/// Orchestrates the gate, the registry and a scoped formatting context to
/// produce at most one edit per keystroke.
pub struct AutoInsertEndpoint {
    registry: Arc<AutoInsertRegistry>,
    gate: DocumentGate,
    permits: Arc<Semaphore>,
}

impl AutoInsertEndpoint {
    pub fn new(
        registry: Arc<AutoInsertRegistry>,
        gate: DocumentGate,
        permits: Arc<Semaphore>,
    ) -> Self {
        AutoInsertEndpoint {
            registry,
            gate,
            permits,
        }
    }

    pub fn registry(&self) -> &AutoInsertRegistry {
        &self.registry
    }

    /// Resolves one keystroke into at most one insertion.
    ///
    /// Every failure mode — absent or unsupported document, cancellation,
    /// foreign trigger character, every provider declining — is an absent
    /// result. There are no retries; the next keystroke starts a fresh run.
    pub async fn resolve(
        &self,
        params: AutoInsertParams,
        cancel: CancellationToken,
    ) -> Option<AutoInsertResponse> {
        let uri = params.text_document.uri;

        // Host editors are known to forward trigger characters registered by
        // other language contributors; reject those before paying for a
        // snapshot resolution.
        let applicable = self.registry.providers_for(&params.ch);
        if applicable.is_empty() {
            trace!(%uri, ch = %params.ch, "no provider for trigger character");
            return None;
        }

        let snapshot = self.gate.resolve(&uri, &cancel).await?;
        if snapshot.generated.is_unsupported() {
            debug!(%uri, "generated output unsupported; skipping auto-insertion");
            return None;
        }
        if cancel.is_cancelled() {
            trace!(%uri, "cancelled before provider evaluation");
            return None;
        }

        // Released on every exit path below, including panics, when the
        // context drops.
        let context = FormattingContext::acquire(
            uri.clone(),
            snapshot,
            params.options,
            self.permits.clone(),
            &cancel,
        )
        .await?;

        for provider in &applicable {
            if let Some(insertion) = provider.resolve_insertion(params.position, &context) {
                debug!(%uri, ch = %params.ch, "auto-insertion resolved");
                return Some(AutoInsertResponse {
                    text_edit: insertion.edit,
                    text_edit_format: insertion.format,
                });
            }
        }

        trace!(%uri, ch = %params.ch, "every provider declined");
        None
    }
}
