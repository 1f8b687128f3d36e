//! Playback-session synchronization server.
//!
//! Keeps every tab and controller of a user in sync and relays remote-control
//! commands between them.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin cadence-server
//! cargo run --bin cadence-server -- issue-token --user alice
//! ```

use std::time::Duration;

use cadence_server::{
    ServerConfig,
    domain::UserId,
    infrastructure::auth::{JwtTokenVerifier, jwt::DEFAULT_TOKEN_TTL},
};
use cadence_shared::logger::setup_logger;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(version, about = "Cadence playback-session synchronization server")]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "CADENCE_LOG", default_value = "debug")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a development access token for a user, signed with the configured secret
    IssueToken {
        /// User id to put in the `sub` claim
        #[arg(long)]
        user: String,

        /// Token lifetime in seconds
        #[arg(long, default_value_t = DEFAULT_TOKEN_TTL.as_secs())]
        ttl_secs: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &cli.log_level);

    match cli.command {
        Some(Command::IssueToken { user, ttl_secs }) => {
            if let Err(e) = issue_token(&cli.config, user, Duration::from_secs(ttl_secs)) {
                tracing::error!("Failed to issue token: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            // Run the server
            if let Err(e) = cadence_server::run(cli.config).await {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn issue_token(
    config: &ServerConfig,
    user: String,
    ttl: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let user_id = UserId::new(user)?;
    let verifier = JwtTokenVerifier::new(&config.jwt_secret)?;
    let token = verifier.issue_token(&user_id, ttl)?;
    println!("{token}");
    Ok(())
}
