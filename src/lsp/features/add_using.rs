//! Helpers for the add-using code action.
//!
//! Completion sources on the host side suggest edits like `using System.X;`
//! and diagnostics mention fully-qualified type names; these helpers recover
//! the bare namespace from both shapes so a follow-up edit request can be
//! built. Failure is a routine outcome here and is always reported as an
//! absent result.

use once_cell::sync::Lazy;

use regex::Regex;

use serde::{Deserialize, Serialize};

use tower_lsp::lsp_types::Url;

/// Action kind tag understood by the code-action resolver.
pub const ADD_USING_ACTION: &str = "add-using";

/// Language tag attached to resolution params.
pub const WEFT_LANGUAGE: &str = "weft";

/// Suggested edits longer than this fail the match outright. The pattern
/// below runs inline with completion traffic, so total work per call must
/// stay bounded no matter what the host sends.
pub const MAX_SUGGESTED_EDIT_LEN: usize = 4 * 1024;

static USING_STATEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@?using ([^;]+);?$").expect("using-statement pattern is valid"));

/// Splits a fully-qualified type name into namespace and type segments.
///
/// The split point is the last `.` not nested inside `<...>` generic
/// arguments, found by a single backward scan. Returns `None` for empty
/// input. A name with no top-level separator is all type name; a trailing
/// separator yields an empty type name.
pub fn split_namespace_and_type(full_type_name: &str) -> Option<(&str, &str)> {
    if full_type_name.is_empty() {
        return None;
    }

    let mut nesting = 0i32;
    let mut split_location = None;
    for (index, c) in full_type_name.char_indices().rev() {
        match c {
            // Unbalanced brackets may drive the counter negative; such dots
            // are simply not top-level.
            '.' if nesting == 0 => {
                split_location = Some(index);
                break;
            }
            '>' => nesting += 1,
            '<' => nesting -= 1,
            _ => {}
        }
    }

    let Some(split_location) = split_location else {
        return Some(("", full_type_name));
    };
    Some((
        &full_type_name[..split_location],
        &full_type_name[split_location + 1..],
    ))
}

/// Namespace segment of `fully_qualified_name`, when it has one.
pub fn namespace_of(fully_qualified_name: &str) -> Option<&str> {
    match split_namespace_and_type(fully_qualified_name) {
        Some((namespace, _)) if !namespace.is_empty() => Some(namespace),
        _ => None,
    }
}

/// Data payload for an add-using code action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUsingActionParams {
    pub uri: Url,
    pub namespace: String,
}

/// Opaque resolution parameters round-tripped through the host editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeActionResolutionParams {
    pub action: String,
    pub language: String,
    pub data: AddUsingActionParams,
}

/// Builds resolution parameters for adding a using directive for
/// `fully_qualified_name` to the document at `uri`.
///
/// Fails when no namespace can be derived from the name.
pub fn create_add_using_resolution_params(
    fully_qualified_name: &str,
    uri: &Url,
) -> Option<(String, CodeActionResolutionParams)> {
    let namespace = namespace_of(fully_qualified_name)?.to_string();
    let resolution_params = CodeActionResolutionParams {
        action: ADD_USING_ACTION.to_string(),
        language: WEFT_LANGUAGE.to_string(),
        data: AddUsingActionParams {
            uri: uri.clone(),
            namespace: namespace.clone(),
        },
    };
    Some((namespace, resolution_params))
}

/// Extracts the namespace from a suggested add-using edit of the form
/// `using System.X;`, optionally `@`-prefixed and optionally unterminated.
pub fn extract_using_namespace(suggested_edit: &str) -> Option<String> {
    // Suggested edits routinely arrive with surrounding blank lines.
    let trimmed = suggested_edit.trim();
    if trimmed.len() > MAX_SUGGESTED_EDIT_LEN {
        return None;
    }

    let captures = USING_STATEMENT.captures(trimmed)?;
    // Whole statement plus exactly one namespace group; anything else means
    // the edit is in an unexpected format.
    if captures.len() != 2 {
        return None;
    }
    Some(captures.get(1)?.as_str().trim().to_string())
}
