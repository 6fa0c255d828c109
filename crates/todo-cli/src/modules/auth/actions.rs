use chrono::Utc;
use tracing::info;

use crate::cli_args::LoginArgs;
use crate::modules::system::CommandContext;
use crate::{prompt_password, SESSION_EXPIRED_MESSAGE};

pub(crate) async fn handle_login(args: LoginArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let username = args.username.trim();
    if username.is_empty() {
        anyhow::bail!("username is required");
    }
    let password = match args.password {
        Some(password) => password,
        None => prompt_password("Password: ")?,
    };
    if !ctx.session.login(username, &password).await {
        anyhow::bail!("login failed for {username}");
    }
    let identity = ctx.session.authentication_state().await;
    let name = identity.name().unwrap_or(username);
    info!(event = "cli_login", "Logged in");
    println!("Logged in as {name}");
    Ok(())
}

pub(crate) async fn handle_logout(ctx: &CommandContext) {
    ctx.session.logout().await;
    println!("Logged out");
}

pub(crate) async fn handle_whoami(ctx: &CommandContext) -> anyhow::Result<()> {
    let identity = ctx.session.authentication_state().await;
    if !identity.is_authenticated() {
        println!("anonymous");
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&identity.claim_map())?);
    if let Some(expires_at) = identity.expires_at() {
        if expires_at <= Utc::now() {
            eprintln!("session token expired at {}", expires_at.to_rfc3339());
        }
    }
    Ok(())
}

pub(crate) async fn handle_refresh(ctx: &CommandContext) -> anyhow::Result<()> {
    if !ctx.session.refresh().await {
        anyhow::bail!(SESSION_EXPIRED_MESSAGE);
    }
    println!("Session refreshed");
    Ok(())
}
