use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use redd_chat::app::App;
use redd_chat::chat::exchange;
use redd_chat::tui::{self, EventHandler, Tui};
use redd_chat::{handler, logging, ui, ChatClient, Config};

#[derive(Parser)]
#[command(name = "reddchat", version)]
#[command(about = "Terminal chat client for the Redd Chat API")]
struct Cli {
    /// Chat endpoint URL (overrides the config file)
    #[arg(long, global = true, env = "REDDCHAT_ENDPOINT")]
    endpoint: Option<String>,
    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat view (default)
    Chat,
    /// Send one message and print the reply
    Send {
        /// Message text
        message: String,
    },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load()?.with_endpoint(cli.endpoint);

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            run_chat(&config, cli.debug).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Send { message } => send_once(&config, &message, cli.debug).await,
        Commands::Config { save } => {
            show_config(&config, save)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_chat(config: &Config, debug: bool) -> Result<()> {
    let log_path = logging::init_file(debug)?;
    info!(endpoint = %config.endpoint, log = %log_path.display(), "starting chat view");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let transport = Arc::new(ChatClient::new(&config.endpoint));
    let mut app = App::new(transport, config.endpoint.clone(), events.sender());

    let result = event_loop(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;
    result
}

async fn event_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}

async fn send_once(config: &Config, message: &str, debug: bool) -> Result<ExitCode> {
    logging::init_stderr(debug)?;

    let text = message.trim();
    if text.is_empty() {
        eprintln!("Nothing to send: message is empty");
        return Ok(ExitCode::FAILURE);
    }

    let client = ChatClient::new(&config.endpoint);
    let outcome = exchange(&client, text).await;
    println!("{}", outcome.text());

    Ok(if outcome.is_reply() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn show_config(config: &Config, save: bool) -> Result<()> {
    let path = Config::config_path()?;

    println!("Config file: {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);

    if save {
        config.save()?;
        println!("Saved.");
    }
    Ok(())
}
