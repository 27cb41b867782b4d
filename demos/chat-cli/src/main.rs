use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gabble::logging::init_tracing;
use gabble::prelude::*;
use serde_json::from_str;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::info;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(author, version, about = "UDP group chat", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Run the chat server until a client sends `exit:`.
    Server(ServerArgs),
    /// Join a server and chat from the terminal.
    Client(ClientArgs),
}

#[derive(Args, Debug)]
struct ServerArgs {
    /// JSON file with a server configuration. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind.
    #[arg(long)]
    bind: Option<String>,
}

#[derive(Args, Debug)]
struct ClientArgs {
    /// Name to join as.
    #[arg(long)]
    username: Option<String>,

    /// JSON file with a client configuration. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Local address to bind (port 0 picks a free one).
    #[arg(long)]
    bind: Option<String>,

    /// Server address.
    #[arg(long)]
    server: Option<String>,

    /// Give up if the server does not answer JOIN within this many ms.
    #[arg(long)]
    join_timeout_ms: Option<u64>,
}

const HELP: &str = "\
commands:
  <text>                       broadcast
  <user>:<text>                direct message
  list:                        refresh roster
  creategroup:<group>          create a group
  addtogroup:<group>:<user>    add a user to a group
  groupmsg:<group>:<text>      message a group
  leave:                       leave the chat
  exit:                        shut the server down";

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Mode::Server(args) => run_server(args).await,
        Mode::Client(args) => run_client(args).await,
    }
}

async fn run_server(args: ServerArgs) -> Result<()> {
    let mut config: ServerConfig = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    let server = ChatServer::builder().config(config).build().await?;
    info!(addr = %server.local_addr()?, "listening");
    server.run().await?;
    Ok(())
}

async fn run_client(args: ClientArgs) -> Result<()> {
    let mut config: ClientConfig = load_config(args.config.as_deref())?;
    if let Some(username) = args.username {
        config.username = username;
    }
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(server) = args.server {
        config.server_addr = server;
    }
    if args.join_timeout_ms.is_some() {
        config.join_timeout_ms = args.join_timeout_ms;
    }
    anyhow::ensure!(!config.username.is_empty(), "a username is required");

    let client = ChatClient::connect(&config)
        .await
        .with_context(|| format!("failed to join {}", config.server_addr))?;
    println!("joined as {}\n{HELP}", client.username());

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (display_tx, display_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || read_stdin(command_tx));
    let display = tokio::spawn(render(display_rx));

    let state = client.run(command_rx, display_tx).await?;
    display.await??;
    info!(?state, "bye");
    Ok(())
}

/// Reads a config file, or returns the defaults when none is given.
fn load_config<T>(path: Option<&Path>) -> Result<T>
where
    T: Default + serde::de::DeserializeOwned,
{
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    from_str(&text).with_context(|| format!("invalid config in {}", path.display()))
}

// ---------------------------------------------------------------------------
// Terminal front end
// ---------------------------------------------------------------------------

/// Reads stdin on a plain thread so a pending read never holds up exit.
fn read_stdin(commands: mpsc::UnboundedSender<String>) {
    for line in std::io::stdin().lines() {
        let Ok(line) = line else { break };
        if commands.send(line.trim_end().to_string()).is_err() {
            break;
        }
    }
}

async fn render(mut events: mpsc::UnboundedReceiver<DisplayEvent>) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut roster = BTreeSet::new();

    while let Some(event) = events.recv().await {
        let line = match event {
            DisplayEvent::Console(text) => text,
            DisplayEvent::RosterAdd(name) => {
                if !roster.insert(name) {
                    continue;
                }
                format!("*** online: {}", join_names(&roster))
            }
            DisplayEvent::RosterRemove(name) => {
                roster.remove(&name);
                format!("*** {name} went offline; online: {}", join_names(&roster))
            }
            DisplayEvent::Exit => break,
        };
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }
    Ok(())
}

fn join_names(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
