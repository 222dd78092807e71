mod actions;
pub(crate) mod args;
mod format;

pub(crate) use actions::{
    handle_add, handle_copy, handle_list, handle_otp, handle_path, handle_remove, handle_show,
    handle_update, CommandContext,
};
