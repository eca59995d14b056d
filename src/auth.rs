//! Credential storage and the interactive login/logout flows.

use std::io::{self, Write};

use keyring::Entry;

use crate::api::client::ApiClient;
use crate::core::config::Config;

const KEYRING_SERVICE: &str = "dossier";

pub fn store_token(username: &str, token: &str) -> Result<(), Box<dyn std::error::Error>> {
    let entry = Entry::new(KEYRING_SERVICE, username)?;
    entry.set_password(token)?;
    Ok(())
}

pub fn load_token(username: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let entry = Entry::new(KEYRING_SERVICE, username)?;
    match entry.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(Box::new(e)),
    }
}

pub fn clear_token(username: &str) -> Result<(), Box<dyn std::error::Error>> {
    let entry = Entry::new(KEYRING_SERVICE, username)?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(Box::new(e)),
    }
}

fn prompt(label: &str, default: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
    match default {
        Some(value) => print!("{label} [{value}]: "),
        None => print!("{label}: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim();
    if trimmed.is_empty() {
        if let Some(value) = default {
            return Ok(value.to_string());
        }
    }
    Ok(trimmed.to_string())
}

/// Prompt for server and account details, log in, and persist the token in
/// the system keyring and the rest in the config file.
pub async fn interactive_auth() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;

    let server_url = prompt("Server URL", Some(config.server_url()))?;
    let username = prompt("Username", config.username.as_deref())?;
    if username.is_empty() {
        return Err("A username is required.".into());
    }
    let password = prompt("Password", None)?;
    if password.is_empty() {
        return Err("A password is required.".into());
    }

    let client = ApiClient::new(&server_url, None);
    let token = client.login(&username, &password).await?;
    store_token(&username, &token)?;

    config.server_url = Some(server_url);
    config.username = Some(username.clone());
    config.save()?;

    println!("Authentication successful for {username}. Token stored in the system keyring.");
    Ok(())
}

/// Invalidate the server-side token and remove the local copy.
pub async fn interactive_deauth() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let Some(username) = config.username.clone() else {
        println!("No stored account; nothing to do.");
        return Ok(());
    };

    if let Some(token) = load_token(&username)? {
        let client = ApiClient::new(config.server_url(), Some(token));
        // Best effort: the local token is cleared even if the server is
        // unreachable.
        if let Err(e) = client.logout().await {
            tracing::warn!("server-side logout failed: {e}");
        }
    }

    clear_token(&username)?;
    println!("Logged out {username}.");
    Ok(())
}
