//! Auth command handlers: connect and disconnect the account.

use std::io::{self, BufRead};
use std::path::Path;

use anyhow::{Context, Result, bail};
use bookmark_sync::auth::{ClientApp, Credential, DEFAULT_SCOPES, OAuthClient, parse_callback};
use bookmark_sync::state::{Account, StateStore};
use chrono::Utc;
use tracing::info;

use super::open_state_store;
use crate::cli::LoginArgs;

pub async fn run_auth_login_command(args: &LoginArgs, state_path: Option<&Path>) -> Result<()> {
    let store = open_state_store(state_path)?;
    let mut state = store.load().await?;

    if let Some(client_id) = &args.client_id {
        state.settings.set("client_id", client_id)?;
    }
    if let Some(client_secret) = &args.client_secret {
        state.settings.set("client_secret", client_secret)?;
    }
    if let Some(redirect_uri) = &args.redirect_uri {
        state.settings.set("redirect_uri", redirect_uri)?;
    }
    if state.settings.client_id.is_empty() {
        bail!("No client id configured; pass --client-id or run `bookmark-sync config set client_id <ID>`");
    }

    let app = ClientApp {
        client_id: state.settings.client_id.clone(),
        client_secret: state.settings.client_secret.clone(),
        redirect_uri: state.settings.redirect_uri.clone(),
    };
    let oauth = OAuthClient::new();
    let request = oauth.authorization_request(&app);

    info!(scopes = DEFAULT_SCOPES, "Starting authorization");
    eprintln!("Open this URL in your browser and approve access:\n\n  {}\n", request.url);
    eprintln!("Then paste the full URL you were redirected to (or just the code):");

    let callback = read_callback_input()?;
    let code = parse_callback(&callback, &request.state)?;

    let tokens = oauth
        .exchange_code(&app, &code, &request.pkce)
        .await
        .context("Token exchange failed")?;
    let credential = Credential::from_token_response(&tokens, &app.client_id, &app.client_secret, Utc::now());
    let user = oauth
        .fetch_current_user(&credential.access_token)
        .await
        .context("Could not look up the connected account")?;

    info!(user_id = %user.id, username = %user.username, "Connected");
    state.credential = Some(credential);
    state.account = Some(Account {
        id: user.id,
        username: user.username.clone(),
    });
    store.save(&state).await?;

    println!("Connected as @{}", user.username);
    Ok(())
}

pub async fn run_auth_logout_command(state_path: Option<&Path>) -> Result<()> {
    let store = open_state_store(state_path)?;
    let mut state = store.load().await?;

    if state.credential.is_none() && state.account.is_none() {
        info!("No account connected");
        return Ok(());
    }

    state.disconnect();
    store.save(&state).await?;
    info!(path = %store.path().display(), "Cleared stored credential");
    println!("Disconnected");
    Ok(())
}

fn read_callback_input() -> Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let input = line.trim();
    if input.is_empty() {
        bail!("No redirect URL provided");
    }
    Ok(input.to_string())
}
