//! Integration tests for the auto-insertion pipeline: registry dispatch,
//! gate-confined snapshot resolution, scoped formatting context, and
//! first-success-wins provider evaluation.

use std::collections::HashMap;
use std::sync::Arc;

use indoc::indoc;

use ropey::Rope;

use tokio::sync::broadcast;

use tokio_util::sync::CancellationToken;

use tower_lsp::lsp_types::{
    FormattingOptions, InsertTextFormat, Position, TextDocumentIdentifier, Url,
};

use weft_language_server::lsp::backend::document_gate::DocumentGate;
use weft_language_server::lsp::features::auto_insert::{
    AutoInsertEndpoint, AutoInsertParams, AutoInsertRegistry,
};
use weft_language_server::lsp::formatting;

struct Pipeline {
    endpoint: AutoInsertEndpoint,
    gate: DocumentGate,
    _shutdown: broadcast::Sender<()>,
}

fn pipeline() -> Pipeline {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let gate = DocumentGate::spawn(shutdown_rx);
    let endpoint = AutoInsertEndpoint::new(
        Arc::new(AutoInsertRegistry::standard()),
        gate.clone(),
        formatting::context_permits(),
    );
    Pipeline {
        endpoint,
        gate,
        _shutdown: shutdown_tx,
    }
}

fn uri() -> Url {
    Url::parse("file:///pages/index.weft").unwrap()
}

fn options(tab_size: u32, insert_spaces: bool) -> FormattingOptions {
    FormattingOptions {
        tab_size,
        insert_spaces,
        properties: HashMap::new(),
        trim_trailing_whitespace: None,
        insert_final_newline: None,
        trim_final_newlines: None,
    }
}

fn params(ch: &str, line: u32, character: u32) -> AutoInsertParams {
    AutoInsertParams {
        text_document: TextDocumentIdentifier { uri: uri() },
        position: Position::new(line, character),
        ch: ch.to_string(),
        options: options(4, true),
    }
}

#[tokio::test]
async fn close_tag_in_full_template() {
    let pipeline = pipeline();
    let template = indoc! {r#"
        @using System.Text;

        <section class="hero">
    "#};
    pipeline.gate.upsert(uri(), 1, Rope::from_str(template)).await;

    let response = pipeline
        .endpoint
        .resolve(params(">", 2, 22), CancellationToken::new())
        .await
        .expect("the open tag should be auto-closed");

    assert_eq!(response.text_edit.new_text, "$0</section>");
    assert_eq!(response.text_edit_format, InsertTextFormat::SNIPPET);
    assert_eq!(response.text_edit.range.start, Position::new(2, 22));
}

#[tokio::test]
async fn comment_block_completion() {
    let pipeline = pipeline();
    pipeline
        .gate
        .upsert(uri(), 1, Rope::from_str("<p></p>\n@*"))
        .await;

    let response = pipeline
        .endpoint
        .resolve(params("*", 1, 2), CancellationToken::new())
        .await
        .expect("the comment should be completed");

    assert_eq!(response.text_edit.new_text, " $0 *@");
}

#[tokio::test]
async fn code_block_uses_client_formatting_options() {
    let pipeline = pipeline();
    pipeline
        .gate
        .upsert(uri(), 1, Rope::from_str("  @{"))
        .await;

    let mut request = params("{", 0, 4);
    request.options = options(8, true);
    let response = pipeline
        .endpoint
        .resolve(request, CancellationToken::new())
        .await
        .expect("the code block should be expanded");

    assert_eq!(response.text_edit.new_text, "\n          $0\n  }");
}

#[tokio::test]
async fn providers_see_the_latest_snapshot() {
    let pipeline = pipeline();
    pipeline.gate.upsert(uri(), 1, Rope::from_str("<div>")).await;
    pipeline
        .gate
        .upsert(uri(), 2, Rope::from_str("<article>"))
        .await;

    let response = pipeline
        .endpoint
        .resolve(params(">", 0, 9), CancellationToken::new())
        .await
        .expect("the newer snapshot should be resolved");

    assert_eq!(response.text_edit.new_text, "$0</article>");
}

#[tokio::test]
async fn foreign_trigger_character_is_rejected_without_gate_traffic() {
    let pipeline = pipeline();
    pipeline.gate.upsert(uri(), 1, Rope::from_str("<div>")).await;

    let response = pipeline
        .endpoint
        .resolve(params("?", 0, 5), CancellationToken::new())
        .await;

    assert!(response.is_none());
    assert_eq!(
        pipeline.gate.resolution_count(),
        0,
        "the gate must never be invoked for foreign characters"
    );
}

#[tokio::test]
async fn cancelled_request_yields_no_edit() {
    let pipeline = pipeline();
    pipeline.gate.upsert(uri(), 1, Rope::from_str("<div>")).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let response = pipeline.endpoint.resolve(params(">", 0, 5), cancel).await;
    assert!(response.is_none(), "cancellation must yield no edit");
}

#[tokio::test]
async fn unsupported_template_yields_no_edit() {
    let pipeline = pipeline();
    let template = indoc! {"
        @{
            var greeting = \"hi\";
        <div>
    "};
    pipeline.gate.upsert(uri(), 1, Rope::from_str(template)).await;

    let response = pipeline
        .endpoint
        .resolve(params(">", 2, 5), CancellationToken::new())
        .await;
    assert!(
        response.is_none(),
        "a template that cannot be generated must be treated as absent"
    );
}

#[tokio::test]
async fn advertised_triggers_match_dispatchable_providers() {
    let registry = AutoInsertRegistry::standard();
    let advertised = registry.trigger_characters();
    assert_eq!(advertised, vec![">", "*", "{"]);
    for ch in &advertised {
        assert!(
            !registry.providers_for(ch).is_empty(),
            "every advertised character must dispatch to a provider"
        );
    }
}

#[tokio::test]
async fn closed_document_no_longer_resolves() {
    let pipeline = pipeline();
    pipeline.gate.upsert(uri(), 1, Rope::from_str("<div>")).await;
    pipeline.gate.remove(uri()).await;

    let response = pipeline
        .endpoint
        .resolve(params(">", 0, 5), CancellationToken::new())
        .await;
    assert!(response.is_none());
}
