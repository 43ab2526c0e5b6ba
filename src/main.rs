use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use omega_console::{
    handler, logging, tui, ui, App, ChatClient, ChatSession, Config,
};

#[derive(Parser)]
#[command(name = "omega-console")]
#[command(about = "Terminal control panel for an agentic RAG chat service")]
#[command(version)]
struct Cli {
    /// Chat endpoint (overrides the config file)
    #[arg(short, long, env = "OMEGA_ENDPOINT")]
    endpoint: Option<String>,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write logs
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat view (default)
    Tui,
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
    },
    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = match cli.log_file.clone() {
        Some(path) => path,
        None => logging::default_log_path()?,
    };
    logging::init(&log_path)?;

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => Config::get_config_path()?,
    };
    let mut config = Config::load_from(&config_path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, path = %config_path.display(), "ignoring unreadable config");
        Config::new()
    });
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = Some(endpoint);
    }
    tracing::info!(endpoint = %config.endpoint(), "configuration loaded");

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => run_tui(build_client(&config)?).await,
        Commands::Ask { question } => ask_once(build_client(&config)?, question).await,
        Commands::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                config.save_to(&config_path)?;
                eprintln!("Saved to {}", config_path.display());
            }
            Ok(())
        }
    }
}

fn build_client(config: &Config) -> Result<ChatClient> {
    let client = match config.request_timeout() {
        Some(timeout) => ChatClient::with_timeout(config.endpoint(), timeout)?,
        None => ChatClient::new(config.endpoint()),
    };
    Ok(client)
}

async fn run_tui(client: ChatClient) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(tui::TICK_RATE);
    let mut app = App::new(client);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    tracing::info!(messages = app.session.messages.len(), "session closed");
    result
}

async fn ask_once(client: ChatClient, question: String) -> Result<()> {
    let mut session = ChatSession::new();
    session.input = question;
    let Some(question) = session.submit() else {
        bail!("question is empty");
    };

    let outcome = client.ask(&question).await;
    let detail = outcome.as_ref().err().map(|e| e.to_string());
    session.settle(outcome);

    match (session.messages.last(), detail) {
        (_, Some(detail)) => bail!("{}: {}", session.status, detail),
        (Some(reply), None) => {
            println!("{}", reply.content);
            eprintln!("[{}]", session.status);
            Ok(())
        }
        (None, None) => bail!("{}", session.status),
    }
}
