//! Chat gateway surface
//!
//! This module wires the economy and settings layers into teloxide's
//! dispatcher:
//! - `commands` - Command definitions and handlers
//! - `format` - Rendering of every user-visible message

pub mod commands;
pub mod format;

use crate::core::{AccountStore, Economy, SettingsStore};
use commands::Command;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

/// Process-wide bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Display prefix used when a guild has not configured its own
    pub default_prefix: String,
}

/// Run the bot until the process is interrupted
///
/// Registers the command list with the gateway, then dispatches incoming
/// messages to [`commands::command_handler`]. The dispatcher handles one
/// update per user sequentially while processing different users'
/// commands concurrently, which is exactly the concurrency envelope the
/// economy layer is built for.
pub async fn run<S>(bot: Bot, economy: Economy<S>, store: Arc<S>, config: BotConfig)
where
    S: AccountStore + SettingsStore,
{
    if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(%err, "could not register the command list");
    }

    let handler = Update::filter_message()
        .filter_command::<Command>()
        .endpoint(commands::command_handler::<S>);

    info!("bot is up, dispatching commands");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![economy, store, config])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
