pub mod models;
pub mod config;
pub mod llm;
pub mod cli;
pub mod history;
pub mod session;
pub mod settings;
pub mod ui;

use cli::Args;
use llm::chat::new_client as new_chat_client;
use llm::LlmConfig;
use history::LoadOutcome;
use log::{ info, warn };
use session::ChatSession;
use std::error::Error;
use std::io::Write;
use tokio::io::BufReader;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Settings Path: {}", args.settings_path.as_deref().unwrap_or("platform default"));
    info!("Ephemeral Settings: {}", args.ephemeral);
    info!("Chat Model: {}", args.chat_model);
    info!("Request Timeout: {}s", args.request_timeout_secs);
    info!("-------------------------");

    let settings = settings::create_settings_store(&args)?;
    let mut session = ChatSession::new(settings);
    if let Some(url) = &args.chat_base_url {
        session.set_base_url(url)?;
    }
    info!("Inference server: {}", session.base_url());

    let llm_config = LlmConfig {
        model: args.chat_model.clone(),
        request_timeout: args.request_timeout(),
    };
    let client = new_chat_client(&llm_config)?;
    info!("Chat client configured: Model={}", client.get_model());

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    if session.load_outcome() == LoadOutcome::Recovered {
        warn!("Saved chat history was unreadable and has been reset");
        writeln!(stdout, "[!] Saved chat history could not be read and was reset.")?;
    }
    ui::run_terminal(session, client, stdin, &mut stdout).await?;

    Ok(())
}
