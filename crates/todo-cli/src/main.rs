use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use todo_session::{
    AuthInterceptor, DetachedChannel, SessionConfig, SessionManager, TodoClient,
};
use tracing_subscriber::EnvFilter;

mod cli_args;
mod cli_command;
mod modules;

use crate::cli_args::*;
use crate::cli_command::handle_command;
use crate::modules::storage::open_storage;
use crate::modules::system::{
    ensure_secure_addr, handle_config_command, load_config, resolve_addr, resolve_storage,
    save_config, CommandContext,
};

pub(crate) const SESSION_EXPIRED_MESSAGE: &str = "session expired; run `todo login`";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let mut config = load_config()?;

    let command = match cli.command {
        Command::Config(args) => {
            handle_config_command(args, &mut config)?;
            save_config(&config)?;
            return Ok(());
        }
        command => command,
    };

    let mut session_config = SessionConfig::from_env();
    session_config.addr = resolve_addr(cli.addr, &config, &session_config.addr);
    ensure_secure_addr(&session_config.addr, cli.insecure)?;

    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(cli.insecure)
        .build()?;
    let storage = open_storage(resolve_storage(cli.storage, &config), &session_config.addr)?;
    let session = Arc::new(SessionManager::new(
        session_config,
        client.clone(),
        storage,
        Arc::new(DetachedChannel),
    ));
    // storage is reachable from the first instruction on
    session.notify_render_phase_interactive().await;

    let ctx = CommandContext {
        todos: TodoClient::new(AuthInterceptor::new(client, session.clone())),
        session: session.clone(),
    };
    let result = handle_command(command, &ctx).await;
    session.shutdown().await;
    result
}

fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

pub(crate) fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let password = rpassword::read_password()?;
    if password.trim().is_empty() {
        anyhow::bail!("password is required");
    }
    Ok(password)
}
