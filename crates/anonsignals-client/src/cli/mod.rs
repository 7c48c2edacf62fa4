mod action;
mod commands;
mod group;
mod hash;
mod identity;
mod job;
mod keys;
mod utils;

pub use action::handle_action;
pub use commands::{Cli, Commands, OutputFormat};
pub use group::handle_group;
pub use hash::{handle_hash, handle_leaf};
pub use identity::handle_identity;
pub use job::handle_job;
pub use keys::{handle_keys, handle_vk};
pub use utils::{cancel_on_ctrl_c, init_logging};
