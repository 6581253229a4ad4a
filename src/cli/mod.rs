mod commands;
mod handlers;

pub use commands::{Cli, Commands};
pub use handlers::{
    handle_add, handle_archive, handle_get, handle_import, handle_list, handle_reopen,
    handle_serve, handle_status,
};
