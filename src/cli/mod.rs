//! Command-line interface parsing and handling

use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::api::client::ApiClient;
use crate::api::Backend;
use crate::auth;
use crate::core::config::Config;
use crate::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "dossier")]
#[command(about = "A terminal client for project-scoped assistant chat")]
#[command(
    long_about = "Dossier is a full-screen terminal client for a project-scoped assistant \
backend. Projects bundle an assistant model with uploaded reference files; sessions are \
conversation threads inside a project.\n\n\
Authentication:\n\
  Use 'dossier auth' to log in; the session token is stored in your system keyring.\n\
  DOSSIER_TOKEN overrides the stored token when set.\n\n\
Controls:\n\
  Tab               Cycle focus between panels and the input field\n\
  Up/Down           Move within the focused panel\n\
  Enter             Select the highlighted item, or send the message\n\
  Alt+Enter         Insert a new line in the input field\n\
  Ctrl+P / Ctrl+N   Create a project / a session\n\
  F2 / F3           Collapse or expand the projects / sessions panel\n\
  Ctrl+T            Toggle the dark/light theme\n\
  Esc               Dismiss the current error\n\
  Ctrl+C            Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend base URL (overrides the configured one)
    #[arg(short = 's', long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// Enable transcript logging to the specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session token
    Auth,
    /// Log out and remove the stored token
    Deauth,
    /// Start the chat interface (default)
    Chat,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    // Diagnostics go to stderr and only when RUST_LOG asks for them; the
    // alternate screen owns stdout.
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let args = Args::parse();

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Auth => {
            if let Err(e) = auth::interactive_auth().await {
                eprintln!("Authentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Deauth => {
            if let Err(e) = auth::interactive_deauth().await {
                eprintln!("Deauthentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Chat => {
            let mut config = Config::load()?;
            if let Some(server) = args.server {
                config.server_url = Some(server);
            }

            let token = match std::env::var("DOSSIER_TOKEN") {
                Ok(token) if !token.is_empty() => token,
                _ => {
                    let username = config.username.clone().ok_or(
                        "No account configured. Run 'dossier auth' to log in first.",
                    )?;
                    auth::load_token(&username)?.ok_or(
                        "No stored token found. Run 'dossier auth' to log in first.",
                    )?
                }
            };

            let client = ApiClient::new(config.server_url(), Some(token));
            let backend: Arc<dyn Backend> = Arc::new(client);
            run_chat(backend, config, args.log).await
        }
    }
}
