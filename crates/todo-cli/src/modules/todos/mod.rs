mod actions;
pub(crate) mod args;
mod format;

pub(crate) use actions::{
    handle_add, handle_delete, handle_get, handle_list, handle_set_completed, handle_update,
};
