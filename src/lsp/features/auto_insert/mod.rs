//! On-type auto-insertion.
//!
//! Each provider pairs one trigger character with a resolution operation.
//! When the host editor forwards a keystroke through the custom
//! `textDocument/autoInsert` method, the endpoint filters providers by the
//! typed character, resolves a document snapshot through the gate, and tries
//! the applicable providers in registration order. The first insertion wins;
//! a keystroke that produces nothing is a normal outcome, not an error.

mod close_comment;
mod close_tag;
mod code_block;
mod endpoint;
mod registry;

pub use close_comment::CloseCommentBlockProvider;
pub use close_tag::CloseElementTagProvider;
pub use code_block::CodeBlockBraceProvider;
pub use endpoint::AutoInsertEndpoint;
pub use registry::{AutoInsertProvider, AutoInsertRegistry, ResolvedInsertion};

use serde::{Deserialize, Serialize};

use tower_lsp::lsp_types::{
    FormattingOptions, InsertTextFormat, Position, TextDocumentIdentifier, TextEdit,
};

/// JSON-RPC method name for the auto-insertion request.
pub const METHOD_NAME: &str = "textDocument/autoInsert";

/// Parameters of a `textDocument/autoInsert` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoInsertParams {
    pub text_document: TextDocumentIdentifier,
    /// Cursor position immediately after the typed character.
    pub position: Position,
    /// The single character the user just typed.
    pub ch: String,
    pub options: FormattingOptions,
}

/// The single replacement to apply, when a provider matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoInsertResponse {
    pub text_edit: TextEdit,
    /// Whether `text_edit` is literal text or a snippet with placeholders.
    pub text_edit_format: InsertTextFormat,
}
