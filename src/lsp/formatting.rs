//! Scoped formatting context shared by auto-insertion providers.
//!
//! One context is acquired per resolution request and released when the
//! request finishes, whatever the outcome. A semaphore bounds how many
//! contexts can be alive at once across all documents; the permit travels
//! inside the context and is returned by `Drop`, so no exit path can leak it
//! and no provider can retain document state past its request.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use tower_lsp::lsp_types::{FormattingOptions, Position, Url};

use tracing::trace;

use crate::lsp::backend::document_gate::DocumentSnapshot;
use crate::lsp::generated::GeneratedOutput;

/// Upper bound on formatting contexts alive at once.
pub const MAX_ACTIVE_CONTEXTS: usize = 4;

/// Creates the shared permit source for formatting contexts.
pub fn context_permits() -> Arc<Semaphore> {
    Arc::new(Semaphore::new(MAX_ACTIVE_CONTEXTS))
}

/// Read-only bundle of document state and client formatting options,
/// exclusively owned by one resolution request.
pub struct FormattingContext {
    uri: Url,
    snapshot: Arc<DocumentSnapshot>,
    options: FormattingOptions,
    indent_unit: String,
    _permit: OwnedSemaphorePermit,
}

impl FormattingContext {
    /// Acquires a context for one request, waiting for a permit if all are
    /// in use. Returns `None` if the request is cancelled while waiting or
    /// the permit source has been closed.
    pub async fn acquire(
        uri: Url,
        snapshot: Arc<DocumentSnapshot>,
        options: FormattingOptions,
        permits: Arc<Semaphore>,
        cancel: &CancellationToken,
    ) -> Option<Self> {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            permit = permits.acquire_owned() => permit.ok()?,
        };
        let indent_unit = if options.insert_spaces {
            " ".repeat(options.tab_size as usize)
        } else {
            "\t".to_string()
        };
        trace!(uri = %uri, "formatting context acquired");
        Some(FormattingContext {
            uri,
            snapshot,
            options,
            indent_unit,
            _permit: permit,
        })
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn snapshot(&self) -> &DocumentSnapshot {
        &self.snapshot
    }

    pub fn generated(&self) -> &GeneratedOutput {
        &self.snapshot.generated
    }

    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }

    /// One level of indentation, per the client's formatting options.
    pub fn indent_unit(&self) -> &str {
        &self.indent_unit
    }

    /// Text of `line` without its trailing line break, if the line exists.
    pub fn line_text(&self, line: u32) -> Option<String> {
        let text = &self.snapshot.text;
        let line = line as usize;
        if line >= text.len_lines() {
            return None;
        }
        let mut content = text.line(line).to_string();
        while content.ends_with('\n') || content.ends_with('\r') {
            content.pop();
        }
        Some(content)
    }

    /// Text of the line containing `position`, truncated at the cursor.
    pub fn line_prefix(&self, position: Position) -> Option<String> {
        let line = self.line_text(position.line)?;
        Some(line.chars().take(position.character as usize).collect())
    }

    /// Text of the line containing `position`, from the cursor onward.
    pub fn line_suffix(&self, position: Position) -> Option<String> {
        let line = self.line_text(position.line)?;
        Some(line.chars().skip(position.character as usize).collect())
    }

    /// Leading whitespace of `line`.
    pub fn line_indent(&self, line: u32) -> Option<String> {
        let text = self.line_text(line)?;
        Some(text.chars().take_while(|c| *c == ' ' || *c == '\t').collect())
    }
}

impl Drop for FormattingContext {
    fn drop(&mut self) {
        trace!(uri = %self.uri, "formatting context released");
    }
}
