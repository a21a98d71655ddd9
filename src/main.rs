use clap::Parser;

use tower_lsp::{LspService, Server};

use tracing::info;

use weft_language_server::logging;
use weft_language_server::lsp::backend::WeftBackend;
use weft_language_server::lsp::features::auto_insert;

/// Language server for the Weft template language.
#[derive(Debug, Parser)]
#[command(name = "weft-language-server", version, about)]
struct Args {
    /// Log level for stderr output (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr output
    #[arg(long)]
    no_color: bool,

    /// Disable the session log file
    #[arg(long)]
    no_file_log: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = logging::init_logger(args.no_color, args.log_level.as_deref(), !args.no_file_log)?;

    info!("weft-language-server {} starting", env!("CARGO_PKG_VERSION"));

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(WeftBackend::new)
        .custom_method(auto_insert::METHOD_NAME, WeftBackend::on_auto_insert)
        .finish();

    Server::new(stdin, stdout, socket).serve(service).await;

    info!("weft-language-server stopped");
    Ok(())
}
