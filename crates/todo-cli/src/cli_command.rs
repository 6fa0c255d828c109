use crate::cli_args::*;
use crate::modules::auth::{handle_login, handle_logout, handle_refresh, handle_whoami};
use crate::modules::system::CommandContext;
use crate::modules::todos::{
    handle_add, handle_delete, handle_get, handle_list, handle_set_completed, handle_update,
};

pub(crate) async fn handle_command(command: Command, ctx: &CommandContext) -> anyhow::Result<()> {
    match command {
        Command::Login(args) => handle_login(args, ctx).await?,
        Command::Logout => handle_logout(ctx).await,
        Command::Whoami => handle_whoami(ctx).await?,
        Command::Refresh => handle_refresh(ctx).await?,
        Command::List => handle_list(ctx).await?,
        Command::Get(args) => handle_get(args, ctx).await?,
        Command::Add(args) => handle_add(args, ctx).await?,
        Command::Update(args) => handle_update(args, ctx).await?,
        Command::Done(args) => handle_set_completed(args, true, ctx).await?,
        Command::Undone(args) => handle_set_completed(args, false, ctx).await?,
        Command::Delete(args) => handle_delete(args, ctx).await?,
        Command::Config(_) => {
            unreachable!()
        }
    }

    Ok(())
}
