mod actions;
pub(crate) mod args;

pub(crate) use actions::{handle_resolve, handle_status, handle_token_command};
