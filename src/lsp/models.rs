use ropey::Rope;

use tower_lsp::lsp_types::{TextDocumentContentChangeEvent, Url};

/// Changes associated with a specific version of the document.
#[derive(Debug)]
pub struct VersionedChanges {
    pub version: i32,
    pub changes: Vec<TextDocumentContentChangeEvent>,
}

/// State for an open text document managed by the LSP server.
#[derive(Debug)]
pub struct LspDocumentState {
    pub uri: Url,
    pub text: Rope,
    pub version: i32,
    pub history: LspDocumentHistory,
}

/// History of applied changes, kept for diagnosing stale-version reports.
#[derive(Debug, Default)]
pub struct LspDocumentHistory {
    pub changes: Vec<VersionedChanges>,
}

/// LSP document with state for open files.
#[derive(Debug)]
pub struct LspDocument {
    pub id: u32,
    pub state: tokio::sync::RwLock<LspDocumentState>,
}
