//! Command handlers for the chat surface
//!
//! Parsing, tokenization, and routing are delegated to teloxide's
//! dispatcher; each handler extracts its sender/target/guild from the
//! incoming message, calls into the economy or settings layer, and
//! renders the outcome through [`crate::bot::format`].
//!
//! A "mentioned member" is the author of the replied-to message; on
//! Telegram a reply is the natural way to point a command at someone.

use crate::bot::format;
use crate::bot::BotConfig;
use crate::core::{AccountStore, Economy, SettingsStore};
use crate::types::{EconomyError, GuildId, SettingUpdate, UserId};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatId, User};
use teloxide::utils::command::BotCommands;
use tracing::{error, warn};

/// Commands understood by the bot
#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "show your coins, or the coins of the replied-to member")]
    Coins,
    #[command(description = "give coins to the replied-to member: /give <amount>")]
    Give { amount: i64 },
    #[command(description = "coins leaderboard for this chat")]
    Top,
    #[command(description = "guild scoped bot configuration: /set <name> <value>", parse_with = "split")]
    Set { name: String, value: String },
    #[command(description = "display this text")]
    Help,
}

/// Route one parsed command to its handler
///
/// Messages from bots are ignored outright, and the economy commands
/// only make sense inside a group chat (the "guild").
pub async fn command_handler<S>(
    bot: Bot,
    msg: Message,
    cmd: Command,
    economy: Economy<S>,
    store: Arc<S>,
    config: BotConfig,
) -> ResponseResult<()>
where
    S: AccountStore + SettingsStore,
{
    let Some(author) = msg.from() else {
        return Ok(());
    };
    if author.is_bot {
        return Ok(());
    }
    if msg.chat.is_private() && !matches!(cmd, Command::Help) {
        bot.send_message(msg.chat.id, "This command only works inside a group chat.")
            .await?;
        return Ok(());
    }

    let author = author.clone();
    match cmd {
        Command::Coins => coins_handler(bot, msg, author, economy).await,
        Command::Give { amount } => give_handler(bot, msg, author, amount, economy).await,
        Command::Top => top_handler(bot, msg, author, economy, store).await,
        Command::Set { name, value } => set_handler(bot, msg, name, value, store).await,
        Command::Help => help_handler(bot, msg, store, config).await,
    }
}

/// The replied-to member, if any and not a bot
fn reply_target(msg: &Message) -> Option<&User> {
    msg.reply_to_message()
        .and_then(|reply| reply.from())
        .filter(|user| !user.is_bot)
}

fn guild_of(msg: &Message) -> GuildId {
    msg.chat.id.0
}

fn id_of(user: &User) -> UserId {
    user.id.0 as UserId
}

/// `/coins` - own balance, or the replied-to member's balance
async fn coins_handler<S>(
    bot: Bot,
    msg: Message,
    author: User,
    economy: Economy<S>,
) -> ResponseResult<()>
where
    S: AccountStore,
{
    let member = reply_target(&msg).unwrap_or(&author).clone();

    match economy.balance(id_of(&member), guild_of(&msg)).await {
        Ok(account) => {
            bot.send_message(msg.chat.id, format::balance_line(&member.full_name(), &account))
                .await?;
        }
        Err(err) => {
            error!(user = id_of(&member), guild = guild_of(&msg), %err, "balance query failed");
            bot.send_message(
                msg.chat.id,
                format::economy_error_note(&author.full_name(), &err),
            )
            .await?;
        }
    }
    Ok(())
}

/// `/give <amount>` - transfer coins to the replied-to member
async fn give_handler<S>(
    bot: Bot,
    msg: Message,
    author: User,
    amount: i64,
    economy: Economy<S>,
) -> ResponseResult<()>
where
    S: AccountStore,
{
    let guild = guild_of(&msg);

    let Some(target) = reply_target(&msg) else {
        bot.send_message(msg.chat.id, format::no_target_note()).await?;
        return Ok(());
    };

    match economy.transfer(id_of(&author), id_of(target), guild, amount).await {
        Ok(receipt) => {
            bot.send_message(
                msg.chat.id,
                format::give_confirmation(&author.full_name(), &target.full_name(), &receipt),
            )
            .await?;
        }
        Err(err) => {
            if let EconomyError::Unavailable { .. } | EconomyError::TransactionConflict = err {
                error!(
                    sender = id_of(&author),
                    recipient = id_of(target),
                    guild,
                    amount,
                    %err,
                    "transfer failed"
                );
                // Direct-message diagnostic for the invoking user; the
                // DM can itself fail (user never opened a private chat),
                // which only warrants a log line.
                let dm = format!("Command `/give {amount}` failed: {err}");
                if let Err(dm_err) = bot.send_message(ChatId(id_of(&author)), dm).await {
                    warn!(user = id_of(&author), %dm_err, "could not DM diagnostic");
                }
            }
            bot.send_message(
                msg.chat.id,
                format::economy_error_note(&author.full_name(), &err),
            )
            .await?;
        }
    }
    Ok(())
}

/// `/top` - leaderboard, posted to the configured info channel when set
async fn top_handler<S>(
    bot: Bot,
    msg: Message,
    author: User,
    economy: Economy<S>,
    store: Arc<S>,
) -> ResponseResult<()>
where
    S: AccountStore + SettingsStore,
{
    let guild = guild_of(&msg);

    let destination = match store.settings(guild).await {
        Ok(settings) => settings
            .and_then(|s| s.info_channel_id)
            .map(ChatId)
            .unwrap_or(msg.chat.id),
        Err(err) => {
            warn!(guild, %err, "settings lookup failed, falling back to current chat");
            msg.chat.id
        }
    };

    match economy.leaderboard(guild).await {
        Ok(accounts) => {
            bot.send_message(destination, format::top_board(&accounts)).await?;
        }
        Err(err) => {
            error!(guild, %err, "leaderboard query failed");
            bot.send_message(
                msg.chat.id,
                format::economy_error_note(&author.full_name(), &err),
            )
            .await?;
        }
    }
    Ok(())
}

/// `/set <name> <value>` - guild-scoped configuration
async fn set_handler<S>(
    bot: Bot,
    msg: Message,
    name: String,
    value: String,
    store: Arc<S>,
) -> ResponseResult<()>
where
    S: SettingsStore,
{
    let guild = guild_of(&msg);

    let update = match SettingUpdate::parse(&name, &value) {
        Ok(update) => update,
        Err(err) => {
            bot.send_message(msg.chat.id, err.to_string()).await?;
            return Ok(());
        }
    };

    let setting = update.name();
    match store.upsert_setting(guild, update).await {
        Ok(_) => {
            bot.send_message(msg.chat.id, format::setting_confirmation(setting.as_str()))
                .await?;
        }
        Err(err) => {
            warn!(guild, setting = setting.as_str(), %err, "setting is not updated");
            bot.send_message(msg.chat.id, "Setting is not updated.").await?;
        }
    }
    Ok(())
}

/// `/help` - command list with the guild's resolved prefix
async fn help_handler<S>(
    bot: Bot,
    msg: Message,
    store: Arc<S>,
    config: BotConfig,
) -> ResponseResult<()>
where
    S: SettingsStore,
{
    let prefix = match store.settings(guild_of(&msg)).await {
        Ok(Some(settings)) => settings.prefix_or(&config.default_prefix).to_string(),
        _ => config.default_prefix.clone(),
    };

    bot.send_message(
        msg.chat.id,
        format::help_text(&prefix, &Command::descriptions().to_string()),
    )
    .await?;
    Ok(())
}
