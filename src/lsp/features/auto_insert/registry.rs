//! Provider contract and the fixed registry built at startup.

use std::sync::Arc;

use tower_lsp::lsp_types::{InsertTextFormat, Position, TextEdit};

use crate::lsp::formatting::FormattingContext;

use super::{CloseCommentBlockProvider, CloseElementTagProvider, CodeBlockBraceProvider};

/// A single auto-insertion produced by a provider.
#[derive(Debug, Clone)]
pub struct ResolvedInsertion {
    pub edit: TextEdit,
    pub format: InsertTextFormat,
}

impl ResolvedInsertion {
    pub fn plain(edit: TextEdit) -> Self {
        ResolvedInsertion {
            edit,
            format: InsertTextFormat::PLAIN_TEXT,
        }
    }

    pub fn snippet(edit: TextEdit) -> Self {
        ResolvedInsertion {
            edit,
            format: InsertTextFormat::SNIPPET,
        }
    }
}

/// Capability unit bound to exactly one trigger character.
///
/// Providers must not retain the context or anything borrowed from it; it is
/// owned by the current request and released when the request finishes.
pub trait AutoInsertProvider: Send + Sync {
    /// The single character whose insertion may activate this provider.
    fn trigger_character(&self) -> &'static str;

    /// Attempts to produce an insertion at `position`. Declining is the
    /// common case and not an error.
    fn resolve_insertion(
        &self,
        position: Position,
        context: &FormattingContext,
    ) -> Option<ResolvedInsertion>;
}

/// Fixed, ordered set of insertion providers, built once at startup.
///
/// The set advertised to the host editor and the set used for dispatch are
/// the same object, so no provider can be silently excluded from capability
/// negotiation.
pub struct AutoInsertRegistry {
    providers: Vec<Arc<dyn AutoInsertProvider>>,
}

impl AutoInsertRegistry {
    pub fn new(providers: Vec<Arc<dyn AutoInsertProvider>>) -> Self {
        AutoInsertRegistry { providers }
    }

    /// The standard provider set, in dispatch order.
    pub fn standard() -> Self {
        AutoInsertRegistry::new(vec![
            Arc::new(CloseElementTagProvider),
            Arc::new(CloseCommentBlockProvider),
            Arc::new(CodeBlockBraceProvider),
        ])
    }

    /// Union of all providers' trigger characters, deduplicated, in
    /// registration order. This is the capability set advertised at
    /// `initialize`.
    pub fn trigger_characters(&self) -> Vec<String> {
        let mut characters: Vec<String> = Vec::new();
        for provider in &self.providers {
            let ch = provider.trigger_character();
            if !characters.iter().any(|existing| existing == ch) {
                characters.push(ch.to_string());
            }
        }
        characters
    }

    /// Providers whose trigger character equals `ch`, in registration order.
    pub fn providers_for(&self, ch: &str) -> Vec<Arc<dyn AutoInsertProvider>> {
        self.providers
            .iter()
            .filter(|provider| provider.trigger_character() == ch)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
