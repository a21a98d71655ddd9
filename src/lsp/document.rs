use ropey::Rope;

use thiserror::Error;

use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};

pub use crate::lsp::models::{LspDocument, LspDocumentState, VersionedChanges};

/// Error applying edits to an open document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("version {incoming} is not newer than {current}")]
    StaleVersion { incoming: i32, current: i32 },
}

/// Converts an LSP position to a character offset in the rope.
fn position_to_char_offset(position: &Position, text: &Rope) -> usize {
    let line = position.line as usize;
    let character = position.character as usize;
    text.line_to_char(line) + character
}

impl LspDocumentState {
    /// Applies a list of content changes to the document state, updating the
    /// text in place. Changes carrying an outdated version are rejected.
    pub fn apply(
        &mut self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Result<Rope, DocumentError> {
        if version <= self.version {
            return Err(DocumentError::StaleVersion {
                incoming: version,
                current: self.version,
            });
        }
        for change in &changes {
            if let Some(range) = change.range {
                let start = position_to_char_offset(&range.start, &self.text);
                let end = position_to_char_offset(&range.end, &self.text);
                self.text.remove(start..end);
                self.text.insert(start, &change.text);
            } else {
                // Full update if no range is provided
                self.text = Rope::from_str(&change.text);
            }
        }
        self.history.changes.push(VersionedChanges { version, changes });
        self.version = version;
        Ok(self.text.clone())
    }
}

impl LspDocument {
    /// Returns the URI of the document.
    pub async fn uri(&self) -> Url {
        self.state.read().await.uri.clone()
    }

    /// Returns the current text of the document as a string.
    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    /// Returns a cheap clone of the document rope.
    pub async fn rope(&self) -> Rope {
        self.state.read().await.text.clone()
    }

    /// Returns the current version of the document.
    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    /// Returns the number of lines in the document.
    pub async fn num_lines(&self) -> usize {
        self.state.read().await.text.len_lines()
    }

    /// Applies changes to the document, returning the updated text.
    pub async fn apply(
        &self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Result<Rope, DocumentError> {
        let mut state = self.state.write().await;
        state.apply(changes, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::models::LspDocumentHistory;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower_lsp::lsp_types::Range;

    /// Helper to create a test LspDocument.
    fn create_test_document(uri: &str, text: &str) -> Arc<LspDocument> {
        Arc::new(LspDocument {
            id: 1,
            state: RwLock::new(LspDocumentState {
                uri: Url::parse(uri).unwrap(),
                text: Rope::from_str(text),
                version: 0,
                history: LspDocumentHistory::default(),
            }),
        })
    }

    #[tokio::test]
    async fn test_apply_full_change() {
        let doc = create_test_document("file:///test.weft", "initial text");
        let changes = vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new text".to_string(),
        }];

        let result = doc.apply(changes, 1).await.map(|text| text.to_string());
        assert_eq!(result.unwrap(), "new text", "Text should be updated");
        assert_eq!(doc.version().await, 1, "Version should be updated");
    }

    #[tokio::test]
    async fn test_apply_incremental_change() {
        let doc = create_test_document("file:///test.weft", "hello world");
        let changes = vec![TextDocumentContentChangeEvent {
            range: Some(Range {
                start: Position { line: 0, character: 6 },
                end: Position { line: 0, character: 11 },
            }),
            range_length: None,
            text: "there".to_string(),
        }];

        let result = doc.apply(changes, 1).await.map(|text| text.to_string());
        assert_eq!(result.unwrap(), "hello there", "Text should be updated");
    }

    #[tokio::test]
    async fn test_apply_multiple_incremental() {
        let doc = create_test_document("file:///test.weft", "hello world");
        let changes = vec![
            TextDocumentContentChangeEvent {
                range: Some(Range {
                    start: Position { line: 0, character: 6 },
                    end: Position { line: 0, character: 11 },
                }),
                range_length: None,
                text: "rust".to_string(),
            },
            TextDocumentContentChangeEvent {
                range: Some(Range {
                    start: Position { line: 0, character: 0 },
                    end: Position { line: 0, character: 5 },
                }),
                range_length: None,
                text: "hi".to_string(),
            },
        ];

        let result = doc.apply(changes, 1).await.map(|text| text.to_string());
        assert_eq!(
            result.unwrap(),
            "hi rust",
            "Text should be updated after multiple changes"
        );
    }

    #[tokio::test]
    async fn test_apply_outdated_version() {
        let doc = create_test_document("file:///test.weft", "initial text");
        let changes = vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new text".to_string(),
        }];

        let _ = doc.apply(changes.clone(), 1).await;
        let result = doc.apply(changes, -1).await;
        assert!(result.is_err(), "Apply should fail for outdated version");
        assert_eq!(
            doc.text().await,
            "new text",
            "Text should remain from previous change"
        );
        assert_eq!(doc.version().await, 1, "Version should not change");
    }
}
