use todo_core::TodoItem;
use todo_session::ApiError;

use super::format::{format_item, print_item_table};
use crate::cli_args::{AddArgs, ItemIdArgs, UpdateArgs};
use crate::modules::system::CommandContext;
use crate::SESSION_EXPIRED_MESSAGE;

pub(crate) async fn handle_list(ctx: &CommandContext) -> anyhow::Result<()> {
    let items = ctx.todos.list().await.map_err(api_error)?;
    if items.is_empty() {
        println!("No items");
        return Ok(());
    }
    print_item_table(&items);
    Ok(())
}

pub(crate) async fn handle_get(args: ItemIdArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let item = fetch_item(ctx, args.id).await?;
    println!("{}", serde_json::to_string_pretty(&item)?);
    Ok(())
}

pub(crate) async fn handle_add(args: AddArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let title = args.title.trim();
    if title.is_empty() {
        anyhow::bail!("title is required");
    }
    let created = ctx
        .todos
        .create(&TodoItem::new(title))
        .await
        .map_err(api_error)?;
    println!("Created {}: {}", created.id, format_item(&created));
    Ok(())
}

pub(crate) async fn handle_update(args: UpdateArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    if args.title.is_none() && args.completed.is_none() {
        anyhow::bail!("nothing to update; pass --title or --completed");
    }
    let mut item = fetch_item(ctx, args.id).await?;
    if let Some(title) = args.title {
        item.title = title;
    }
    if let Some(completed) = args.completed {
        item.is_completed = completed;
    }
    ctx.todos.update(args.id, &item).await.map_err(api_error)?;
    println!("Updated {}: {}", args.id, format_item(&item));
    Ok(())
}

pub(crate) async fn handle_set_completed(
    args: ItemIdArgs,
    completed: bool,
    ctx: &CommandContext,
) -> anyhow::Result<()> {
    let result = if completed {
        ctx.todos.set_done(args.id).await
    } else {
        ctx.todos.set_not_done(args.id).await
    };
    if !result.map_err(api_error)? {
        return Err(item_not_found(args.id));
    }
    let state = if completed { "done" } else { "not done" };
    println!("Marked {} as {state}", args.id);
    Ok(())
}

pub(crate) async fn handle_delete(args: ItemIdArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    if !ctx.todos.delete(args.id).await.map_err(api_error)? {
        anyhow::bail!("delete rejected for item {}", args.id);
    }
    println!("Deleted {}", args.id);
    Ok(())
}

async fn fetch_item(ctx: &CommandContext, id: i64) -> anyhow::Result<TodoItem> {
    ctx.todos
        .get(id)
        .await
        .map_err(api_error)?
        .ok_or_else(|| item_not_found(id))
}

fn item_not_found(id: i64) -> anyhow::Error {
    anyhow::anyhow!("item not found: {id}")
}

fn api_error(err: ApiError) -> anyhow::Error {
    if err.requires_login() {
        return anyhow::anyhow!(SESSION_EXPIRED_MESSAGE);
    }
    anyhow::Error::new(err)
}
