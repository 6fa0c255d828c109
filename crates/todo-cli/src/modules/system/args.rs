use clap::{Args, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Set the default server origin")]
    SetAddr(SetAddrArgs),
    #[command(about = "Set the default token storage backend")]
    SetStorage(SetStorageArgs),
    #[command(about = "Print the saved configuration")]
    Show,
}

#[derive(Args)]
pub struct SetAddrArgs {
    #[arg(help = "Server origin, e.g. http://localhost:5208")]
    pub addr: String,
}

#[derive(Args)]
pub struct SetStorageArgs {
    #[arg(value_enum)]
    pub storage: StorageKind,
}

#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// OS keychain.
    #[default]
    Keyring,
    /// JSON file under ~/.todo.
    File,
}
