//! Interactive remote control for Cadence.
//!
//! Connects as one of the user's sessions, prints the `state` and `command`
//! events relayed from the user's other sessions, and sends commands or
//! state snapshots typed at the prompt.
//!
//! Run with:
//! ```not_rust
//! CADENCE_TOKEN=$(cargo run --bin cadence-server -- issue-token --user alice) \
//!     cargo run --bin cadence-client
//! ```

use std::time::Duration;

use cadence_client::{
    AgentConfig, ClientError, ConnectionStatus, SessionAgent,
    input::{HELP, Input, parse_input},
};
use cadence_server::infrastructure::dto::websocket::{CommandPayload, PlaybackStateDto};
use cadence_shared::{logger::setup_logger, time::timestamp_to_jst_rfc3339};
use clap::Parser;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(version, about = "Cadence interactive remote control")]
struct Cli {
    /// WebSocket endpoint of the server
    #[arg(long, env = "CADENCE_URL", default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// Access token (see `cadence-server issue-token`)
    #[arg(long, env = "CADENCE_TOKEN", hide_env_values = true)]
    token: String,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "CADENCE_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &cli.log_level);

    let agent = SessionAgent::new(AgentConfig::new(cli.url, cli.token));
    agent.connect(print_state, print_command).await;

    agent
        .wait_for_status(ConnectionStatus::Connected, CONNECT_TIMEOUT)
        .await;
    if agent.status() == ConnectionStatus::Disconnected {
        let reason = agent.last_error().await.unwrap_or_default();
        eprintln!("Could not connect: {reason}");
        std::process::exit(1);
    }
    println!("Connected. Type 'help' for commands.");

    // rustyline blocks, so read lines on a dedicated thread
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || read_lines(line_tx));

    let mut status_rx = agent.subscribe();
    loop {
        tokio::select! {
            line = line_rx.recv() => {
                let Some(line) = line else { break };
                match parse_input(&line) {
                    Ok(Input::Quit) => break,
                    Ok(Input::Empty) => {}
                    Ok(Input::Help) => println!("{HELP}"),
                    Ok(Input::Status) => println!("{:?}", agent.status()),
                    Ok(Input::Command(command)) => {
                        report(agent.send_command(command).await, &command.to_string());
                    }
                    Ok(Input::State(state)) => {
                        report(agent.send_state(&state).await, "state");
                    }
                    Err(e) => println!("{e}"),
                }
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *status_rx.borrow_and_update();
                tracing::debug!("Connection status: {:?}", status);
                if status == ConnectionStatus::Disconnected {
                    let reason = agent.last_error().await.unwrap_or_default();
                    eprintln!("Disconnected: {reason}");
                    break;
                }
            }
        }
    }

    agent.disconnect().await;
}

fn read_lines(tx: mpsc::UnboundedSender<String>) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Failed to initialize line editor: {e}");
            return;
        }
    };

    loop {
        match editor.readline("cadence> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        }
    }
}

fn report(result: Result<bool, ClientError>, what: &str) {
    match result {
        Ok(true) => tracing::debug!("Sent {}", what),
        Ok(false) => println!("Not connected; {what} dropped"),
        Err(e) => println!("Failed to send {what}: {e}"),
    }
}

fn now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

fn print_state(state: PlaybackStateDto) {
    let status = if state.is_playing { "playing" } else { "paused" };
    let title = if state.title.is_empty() {
        "(nothing)"
    } else {
        state.title.as_str()
    };
    let by = if state.artist.is_empty() {
        String::new()
    } else {
        format!(" by {}", state.artist)
    };
    let updated = state
        .updated_at
        .and_then(timestamp_to_jst_rfc3339)
        .map(|at| format!(" (updated {at})"))
        .unwrap_or_default();
    println!(
        "[{}] state: {} {}{} at {:.1}s / {:.1}s{}",
        now(),
        status,
        title,
        by,
        state.current_time,
        state.duration,
        updated
    );
}

fn print_command(command: CommandPayload) {
    match command.value {
        Some(value) => println!("[{}] command: {} {}", now(), command.command, value),
        None => println!("[{}] command: {}", now(), command.command),
    }
}
