//! Auto-closes markup element tags when `>` completes an open tag.

use tower_lsp::lsp_types::{Position, Range, TextEdit};

use crate::lsp::formatting::FormattingContext;

use super::registry::{AutoInsertProvider, ResolvedInsertion};

/// Elements that never take a closing tag.
const VOID_ELEMENTS: [&str; 10] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
];

/// Inserts `</name>` after the cursor when the typed `>` completes an open
/// element tag on the current line.
pub struct CloseElementTagProvider;

impl AutoInsertProvider for CloseElementTagProvider {
    fn trigger_character(&self) -> &'static str {
        ">"
    }

    fn resolve_insertion(
        &self,
        position: Position,
        context: &FormattingContext,
    ) -> Option<ResolvedInsertion> {
        let prefix = context.line_prefix(position)?;
        // The typed character is already in the document.
        let before = prefix.strip_suffix('>')?;
        if before.ends_with('/') {
            return None;
        }

        let open = before.rfind('<')?;
        let tag = &before[open + 1..];
        if tag.starts_with('/') {
            return None;
        }

        let name: String = tag
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        if name.is_empty() || !name.chars().next()?.is_ascii_alphabetic() {
            return None;
        }
        // Anything between the name and the cursor must be attribute text;
        // quoted `>` characters are not recognized here.
        if tag.len() > name.len() && !tag.as_bytes()[name.len()].is_ascii_whitespace() {
            return None;
        }
        if VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str()) {
            return None;
        }

        let edit = TextEdit {
            range: Range::new(position, position),
            new_text: format!("$0</{}>", name),
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
        CloseElementTagProvider.resolve_insertion(Position::new(0, character), &context)
    }

    #[tokio::test]
    async fn test_closes_simple_tag() {
        let insertion = resolve("<div>", 5).await.expect("tag should be closed");
        assert_eq!(insertion.edit.new_text, "$0</div>");
        assert_eq!(insertion.format, InsertTextFormat::SNIPPET);
        assert_eq!(insertion.edit.range.start, Position::new(0, 5));
        assert_eq!(insertion.edit.range.end, Position::new(0, 5));
    }

    #[tokio::test]
    async fn test_closes_tag_with_attributes() {
        let insertion = resolve("<div class=\"card\">", 18).await.unwrap();
        assert_eq!(insertion.edit.new_text, "$0</div>");
    }

    #[tokio::test]
    async fn test_declines_self_closing_tag() {
        assert!(resolve("<div/>", 6).await.is_none());
    }

    #[tokio::test]
    async fn test_declines_closing_tag() {
        assert!(resolve("</div>", 6).await.is_none());
    }

    #[tokio::test]
    async fn test_declines_void_element() {
        assert!(resolve("<br>", 4).await.is_none());
        assert!(resolve("<IMG>", 5).await.is_none());
    }

    #[tokio::test]
    async fn test_declines_without_open_tag() {
        assert!(resolve("1 > 0>", 6).await.is_none());
    }

    #[tokio::test]
    async fn test_declines_when_cursor_not_after_gt() {
        assert!(resolve("<div>", 4).await.is_none());
    }

    #[tokio::test]
    async fn test_uses_nearest_open_tag() {
        let insertion = resolve("<div><span>", 11).await.unwrap();
        assert_eq!(insertion.edit.new_text, "$0</span>");
    }

    #[tokio::test]
    async fn test_declines_malformed_name() {
        assert!(resolve("<1div>", 6).await.is_none());
        assert!(resolve("<>", 2).await.is_none());
    }
}
