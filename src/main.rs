//! site-chat binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use site_chat::api::{serve_with_state, AppState};
use site_chat::cli::{parse_args, print_help, print_version};
use site_chat::engine::OpenAiEngineFactory;
use site_chat::{logging, Config};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'site-chat --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_with_filter(config.log_filter()) {
        eprintln!("warning: logging already initialized: {}", e);
    }

    info!("site-chat v{}", env!("CARGO_PKG_VERSION"));

    let settings = match config.to_engine_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("invalid engine configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let server_config = match config.to_server_config() {
        Ok(server_config) => server_config,
        Err(e) => {
            error!("invalid server configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        api_base = %settings.api_base,
        chat_model = %settings.chat_model,
        embedding_model = %settings.embedding_model,
        "query engine configured"
    );

    let factory = match OpenAiEngineFactory::new(settings) {
        Ok(factory) => factory,
        Err(e) => {
            error!("failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.default_credential().is_none() {
        warn!("OPENAI_API_KEY not set; sessions start without a credential");
    }

    let state =
        AppState::new(Arc::new(factory)).with_default_credential(config.default_credential());

    match serve_with_state(server_config, state).await {
        Ok(()) => {
            info!("site-chat stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
