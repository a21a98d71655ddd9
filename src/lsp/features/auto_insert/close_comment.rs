//! Completes `@*` template comments with the matching `*@` terminator.

use tower_lsp::lsp_types::{Position, Range, TextEdit};

use crate::lsp::formatting::FormattingContext;

use super::registry::{AutoInsertProvider, ResolvedInsertion};

/// Inserts ` $0 *@` when the typed `*` opens a template comment.
pub struct CloseCommentBlockProvider;

impl AutoInsertProvider for CloseCommentBlockProvider {
    fn trigger_character(&self) -> &'static str {
        "*"
    }

    fn resolve_insertion(
        &self,
        position: Position,
        context: &FormattingContext,
    ) -> Option<ResolvedInsertion> {
        let prefix = context.line_prefix(position)?;
        if !prefix.ends_with("@*") {
            return None;
        }
        let suffix = context.line_suffix(position).unwrap_or_default();
        if suffix.trim_start().starts_with("*@") {
            // Comment is already terminated right after the cursor.
            return None;
        }

        let edit = TextEdit {
            range: Range::new(position, position),
            new_text: " $0 *@".to_string(),
        };
        Some(ResolvedInsertion::snippet(edit))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::context;
    use super::*;
    use tower_lsp::lsp_types::InsertTextFormat;

    async fn resolve(line: &str, character: u32) -> Option<ResolvedInsertion> {
        let context = context(line, 4, true).await;
        CloseCommentBlockProvider.resolve_insertion(Position::new(0, character), &context)
    }

    #[tokio::test]
    async fn test_completes_opened_comment() {
        let insertion = resolve("@*", 2).await.expect("comment should be completed");
        assert_eq!(insertion.edit.new_text, " $0 *@");
        assert_eq!(insertion.format, InsertTextFormat::SNIPPET);
    }

    #[tokio::test]
    async fn test_completes_comment_mid_line() {
        let insertion = resolve("<p></p> @*", 10).await.unwrap();
        assert_eq!(insertion.edit.new_text, " $0 *@");
    }

    #[tokio::test]
    async fn test_declines_bare_star() {
        assert!(resolve("a * b", 3).await.is_none());
    }

    #[tokio::test]
    async fn test_declines_already_terminated_comment() {
        assert!(resolve("@* *@", 2).await.is_none());
    }
}
