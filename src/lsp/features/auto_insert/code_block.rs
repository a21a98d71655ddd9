//! Closes `@{` code blocks, indenting the body per the client options.

use tower_lsp::lsp_types::{Position, Range, TextEdit};

use crate::lsp::formatting::FormattingContext;

use super::registry::{AutoInsertProvider, ResolvedInsertion};

/// Inserts a closing brace for a freshly opened code block, with the body
/// placed one indent unit deeper than the opening line.
pub struct CodeBlockBraceProvider;

impl AutoInsertProvider for CodeBlockBraceProvider {
    fn trigger_character(&self) -> &'static str {
        "{"
    }

    fn resolve_insertion(
        &self,
        position: Position,
        context: &FormattingContext,
    ) -> Option<ResolvedInsertion> {
        let prefix = context.line_prefix(position)?;
        if !prefix.ends_with("@{") {
            return None;
        }
        let suffix = context.line_suffix(position).unwrap_or_default();
        if !suffix.trim().is_empty() {
            // Only expand a block opened at the end of the line.
            return None;
        }

        let indent = context.line_indent(position.line).unwrap_or_default();
        let new_text = format!("\n{}{}$0\n{}}}", indent, context.indent_unit(), indent);
        let edit = TextEdit {
            range: Range::new(position, position),
            new_text,
        };
        Some(ResolvedInsertion::snippet(edit))
    }
}
