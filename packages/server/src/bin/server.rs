//! Room-based WebSocket chat relay.
//!
//! Clients join named rooms, exchange messages, see presence and typing
//! indicators, and page backward through room history.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin irori-server
//! cargo run --bin irori-server -- --host 0.0.0.0 --port 3000 --message-log ./messages.jsonl
//! cargo run --bin irori-server -- --auth-token secret=u1:alice
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use irori_server::{
    domain::MessageLog,
    infrastructure::{
        auth::StaticTokenVerifier,
        message_pusher::WebSocketMessagePusher,
        repository::{
            FileMessageLog, InMemoryConnectionRegistry, InMemoryMessageLog,
            InMemoryRoomRepository,
        },
    },
    ui::{AppState, Dependencies, Server},
    usecase::{DEFAULT_INITIAL_LIMIT, DEFAULT_SCROLLBACK_LIMIT},
};
use irori_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "irori-server")]
#[command(about = "Room-based WebSocket chat relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Persist messages to this JSON-lines file (in-memory when omitted)
    #[arg(long, value_name = "PATH")]
    message_log: Option<PathBuf>,

    /// Messages delivered when joining a room
    #[arg(long, default_value_t = DEFAULT_INITIAL_LIMIT, value_parser = parse_limit)]
    history_limit: usize,

    /// Messages delivered per scrollback request
    #[arg(long, default_value_t = DEFAULT_SCROLLBACK_LIMIT, value_parser = parse_limit)]
    scrollback_limit: usize,

    /// Accepted handshake token, as TOKEN=USER_ID:USERNAME (repeatable)
    #[arg(long = "auth-token", value_name = "TOKEN=USER_ID:USERNAME")]
    auth_tokens: Vec<String>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "debug")]
    log_level: String,
}

/// Page sizes must be positive
fn parse_limit(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(limit) => Ok(limit),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // Initialize dependencies in order:
    // 1. Stores (rooms, connection registry, message log)
    // 2. MessagePusher and TokenVerifier
    // 3. AppState (UseCases)
    // 4. Server

    // 1. Create stores
    let rooms = Arc::new(InMemoryRoomRepository::default());
    let registry = Arc::new(InMemoryConnectionRegistry::default());
    let message_log: Arc<dyn MessageLog> = match &args.message_log {
        Some(path) => match FileMessageLog::open(path).await {
            Ok(log) => Arc::new(log),
            Err(e) => {
                tracing::error!("Failed to open message log '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::info!("No --message-log given, history is kept in memory");
            Arc::new(InMemoryMessageLog::new())
        }
    };

    // 2. Create MessagePusher (WebSocket implementation) and TokenVerifier
    let message_pusher = Arc::new(WebSocketMessagePusher::default());
    let token_verifier = match StaticTokenVerifier::from_specs(&args.auth_tokens) {
        Ok(verifier) => verifier,
        Err(e) => {
            tracing::error!("Invalid --auth-token: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("{} auth tokens configured", token_verifier.len());

    // 3. Create UseCases
    let state = AppState::new(Dependencies {
        rooms,
        registry,
        message_log,
        message_pusher,
        token_verifier: Arc::new(token_verifier),
        clock: Arc::new(SystemClock),
        initial_limit: args.history_limit,
        scrollback_limit: args.scrollback_limit,
    });

    // 4. Create and run the server
    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
