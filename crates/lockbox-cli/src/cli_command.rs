use crate::cli_args::*;
use crate::modules::records::{
    handle_add, handle_copy, handle_list, handle_otp, handle_remove, handle_show, handle_update,
    CommandContext,
};

pub(crate) async fn handle_command(
    command: Command,
    ctx: &CommandContext<'_>,
) -> anyhow::Result<()> {
    match command {
        Command::List(args) => handle_list(args, ctx).await?,
        Command::Add(args) => handle_add(args, ctx).await?,
        Command::Update(args) => handle_update(args, ctx).await?,
        Command::Remove(args) => handle_remove(args, ctx).await?,
        Command::Show(args) => handle_show(args, ctx).await?,
        Command::Otp(args) => handle_otp(args, ctx).await?,
        Command::Copy(args) => handle_copy(args, ctx).await?,
        Command::Init(_) | Command::Path | Command::Config(_) | Command::Schema => {
            anyhow::bail!("command does not operate on a vault")
        }
    }

    Ok(())
}
