use clap::{ArgAction, Parser, Subcommand};

pub use crate::modules::auth::args::*;
pub use crate::modules::system::args::*;
pub use crate::modules::todos::args::*;

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "To-do list client")]
pub struct Cli {
    #[arg(long, env = "TODO_ADDR", help = "Server origin (API lives under /api)")]
    pub addr: Option<String>,
    #[arg(long, value_enum, help = "Where the session token is kept")]
    pub storage: Option<StorageKind>,
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    #[arg(long, help = "Allow http:// to remote hosts and invalid TLS certificates")]
    pub insecure: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    Login(LoginArgs),
    Logout,
    #[command(about = "Print the claims of the current session")]
    Whoami,
    #[command(about = "Exchange the server-side refresh handle for a new token")]
    Refresh,
    List,
    Get(ItemIdArgs),
    Add(AddArgs),
    Update(UpdateArgs),
    Done(ItemIdArgs),
    Undone(ItemIdArgs),
    Delete(ItemIdArgs),
    Config(ConfigArgs),
}
