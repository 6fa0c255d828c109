use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use super::args::StorageKind;
use super::CliConfig;
use crate::cli_args::{ConfigArgs, ConfigCommand};

pub(crate) fn handle_config_command(
    args: ConfigArgs,
    config: &mut CliConfig,
) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::SetAddr(args) => {
            let addr = args.addr.trim().trim_end_matches('/').to_string();
            reqwest::Url::parse(&addr)
                .map_err(|err| anyhow::anyhow!("invalid server address {addr}: {err}"))?;
            config.addr = Some(addr);
        }
        ConfigCommand::SetStorage(args) => {
            config.storage = Some(args.storage);
        }
        ConfigCommand::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
    }
    Ok(())
}

pub(crate) fn todo_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("HOME is not set"))?;
    Ok(Path::new(&home).join(".todo"))
}

fn config_path() -> anyhow::Result<PathBuf> {
    Ok(todo_dir()?.join("config.json"))
}

pub(crate) fn load_config() -> anyhow::Result<CliConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    let config = serde_json::from_str(&contents)?;
    Ok(config)
}

pub(crate) fn save_config(config: &CliConfig) -> anyhow::Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// `--addr`/`TODO_ADDR` beats the saved config, which beats `fallback`.
pub(crate) fn resolve_addr(arg: Option<String>, config: &CliConfig, fallback: &str) -> String {
    arg.or_else(|| config.addr.clone())
        .map(|addr| addr.trim().to_string())
        .filter(|addr| !addr.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

pub(crate) fn resolve_storage(arg: Option<StorageKind>, config: &CliConfig) -> StorageKind {
    arg.or(config.storage).unwrap_or_default()
}

pub(crate) fn ensure_secure_addr(addr: &str, allow_insecure: bool) -> anyhow::Result<()> {
    let url = reqwest::Url::parse(addr)
        .map_err(|err| anyhow::anyhow!("invalid server address {addr}: {err}"))?;
    match url.scheme() {
        "https" => Ok(()),
        "http" if allow_insecure || is_loopback(&url) => Ok(()),
        "http" => anyhow::bail!("refusing to use http:// without --insecure"),
        scheme => anyhow::bail!("unsupported scheme: {scheme}"),
    }
}

fn is_loopback(url: &reqwest::Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}
