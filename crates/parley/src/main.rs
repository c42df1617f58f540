//! parley - command line client for the chat backend.
//!
//! Thin driver over the controller core: each invocation restores the
//! persisted identity, performs one operation, and exits.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use parley::client::ChatClient;
use parley::gateway::HttpGateway;
use parley::identity::IdentityStore;
use parley::model::{Identity, Sender};
use parley::settings::Settings;
use parley::transcript::SendOutcome;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "Error: {err:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[tokio::main]
async fn try_main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;
    let server_url = cli.server.unwrap_or_else(|| settings.server_url.clone());
    let gateway = Arc::new(HttpGateway::new(
        server_url,
        Duration::from_secs(settings.timeout_secs),
    )?);
    let client = ChatClient::new(gateway, IdentityStore::new(settings.identity_path));

    match cli.command {
        Command::Register { username, password } => handle_register(&client, &username, &password).await,
        Command::Login { username, password } => handle_login(&client, &username, &password).await,
        Command::Logout => handle_logout(&client).await,
        Command::Whoami => handle_whoami(&client).await,
        Command::Sessions { command } => handle_sessions(&client, command).await,
        Command::Chat { session, text } => handle_chat(&client, session, &text).await,
        Command::History { session } => handle_history(&client, session).await,
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "parley",
    author,
    version,
    about = "Command line client for the chat backend."
)]
struct Cli {
    /// Backend server URL
    #[arg(long, short = 's', global = true, env = "PARLEY_SERVER_URL")]
    server: Option<String>,

    /// Override the config file path
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account
    Register { username: String, password: String },

    /// Sign in and remember the identity
    Login { username: String, password: String },

    /// Sign out and forget the identity
    Logout,

    /// Show the signed-in identity
    Whoami,

    /// Manage conversation sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Send a message and print the updated transcript
    Chat {
        /// Session to chat in (defaults to the most recent one)
        #[arg(long)]
        session: Option<i64>,

        text: String,
    },

    /// Print a session's transcript
    History {
        /// Session to show (defaults to the most recent one)
        #[arg(long)]
        session: Option<i64>,
    },
}

#[derive(Debug, Subcommand)]
enum SessionCommand {
    /// List sessions
    List,
    /// Start a new session
    New,
    /// Delete a session
    Rm { id: i64 },
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose { "parley=debug" } else { "parley=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn handle_register(client: &ChatClient, username: &str, password: &str) -> Result<()> {
    client.auth.register(username, password).await?;
    println!("Registered. Sign in with: parley login {username} <password>");
    Ok(())
}

async fn handle_login(client: &ChatClient, username: &str, password: &str) -> Result<()> {
    let identity = client.sign_in(username, password).await?;
    println!(
        "Signed in as {} ({} session(s))",
        identity.username,
        client.registry.sessions().len()
    );
    Ok(())
}

async fn handle_logout(client: &ChatClient) -> Result<()> {
    client.sign_out().await?;
    println!("Signed out");
    Ok(())
}

async fn handle_whoami(client: &ChatClient) -> Result<()> {
    match client.start().await? {
        Some(identity) => println!("{} (id {})", identity.username, identity.id),
        None => println!("Not signed in"),
    }
    Ok(())
}

async fn handle_sessions(client: &ChatClient, command: SessionCommand) -> Result<()> {
    require_signed_in(client).await?;

    match command {
        SessionCommand::List => {
            let sessions = client.registry.sessions();
            if sessions.is_empty() {
                println!("No sessions. Start one with: parley sessions new");
            }
            for session in sessions {
                println!("#{}", session.id);
            }
        }
        SessionCommand::New => {
            let session = client.new_session().await?;
            println!("Started session #{}", session.id);
        }
        SessionCommand::Rm { id } => {
            client.delete_session(id).await?;
            println!("Deleted session #{id}");
        }
    }
    Ok(())
}

async fn handle_chat(client: &ChatClient, session: Option<i64>, text: &str) -> Result<()> {
    require_signed_in(client).await?;

    match session.or_else(|| latest_session(client)) {
        Some(id) => client.transcript.select_session(id).await?,
        None => {
            client.new_session().await?;
        }
    }

    match client.transcript.send_message(text).await? {
        SendOutcome::Sent => print_transcript(client),
        SendOutcome::Ignored => bail!("nothing to send"),
        SendOutcome::Busy => bail!("an exchange is already in progress"),
    }
    Ok(())
}

async fn handle_history(client: &ChatClient, session: Option<i64>) -> Result<()> {
    require_signed_in(client).await?;

    let Some(session_id) = session.or_else(|| latest_session(client)) else {
        bail!("no sessions yet; start one with: parley sessions new");
    };
    client.transcript.select_session(session_id).await?;
    print_transcript(client);
    Ok(())
}

async fn require_signed_in(client: &ChatClient) -> Result<Identity> {
    client
        .start()
        .await?
        .context("not signed in; run: parley login <username> <password>")
}

fn latest_session(client: &ChatClient) -> Option<i64> {
    client.registry.sessions().last().map(|session| session.id)
}

fn print_transcript(client: &ChatClient) {
    for message in client.transcript.messages() {
        let label = match message.sender {
            Sender::User => "you",
            Sender::Assistant => "bot",
        };
        println!("{label}> {}", message.content);
    }
}
