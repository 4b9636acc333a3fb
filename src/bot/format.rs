//! User-visible message rendering
//!
//! Every string the bot sends is produced here, so the command handlers
//! stay free of formatting concerns and the wording can be tested without
//! a gateway connection.

use crate::types::{Account, EconomyError, TransferReceipt};

/// Emoji appended to coin figures
pub const COINS_EMOJI: &str = "🪙";

/// How many leaderboard entries are shown
pub const TOP_SIZE: usize = 10;

/// Currency info line for a single member
pub fn balance_line(display_name: &str, account: &Account) -> String {
    format!(
        "{display_name}'s currency info\nCoins: {} {COINS_EMOJI}",
        account.coins
    )
}

/// Confirmation for a committed transfer
pub fn give_confirmation(sender_name: &str, recipient_name: &str, receipt: &TransferReceipt) -> String {
    format!(
        "**{sender_name}** sends to **{recipient_name}** {} Coins {COINS_EMOJI}",
        receipt.amount
    )
}

/// Leaderboard rendering, truncated to [`TOP_SIZE`] entries
pub fn top_board(accounts: &[Account]) -> String {
    if accounts.is_empty() {
        return "Coins leaderboard\nNobody has any coins here yet.".to_string();
    }
    let mut lines = vec!["Coins leaderboard".to_string()];
    for (index, account) in accounts.iter().take(TOP_SIZE).enumerate() {
        lines.push(format!(
            "#{} — user {} — {} {COINS_EMOJI}",
            index + 1,
            account.user_id,
            account.coins
        ));
    }
    lines.join("\n")
}

/// Confirmation for an applied setting update
pub fn setting_confirmation(name: &str) -> String {
    format!("✅ {name} updated.")
}

/// Note shown when a give command carries no usable target
pub fn no_target_note() -> String {
    "target user not found!".to_string()
}

/// Map each economy failure onto its user-facing note
///
/// The conflict and storage failures share one generic message since the
/// user can do nothing differently about either.
pub fn economy_error_note(sender_name: &str, error: &EconomyError) -> String {
    match error {
        EconomyError::InvalidAmount { .. } => "amount of coins specified not properly".to_string(),
        EconomyError::SelfTransfer { .. } => format!(
            "**{sender_name}**, transferring coins to yourself will not work. It would be so simple..."
        ),
        EconomyError::InsufficientFunds { .. } => {
            format!("**{sender_name}**, you are not rich enough to give so many coins")
        }
        EconomyError::RecipientNotFound { .. } => no_target_note(),
        EconomyError::TransactionConflict | EconomyError::Unavailable { .. } => {
            "Something went wrong while processing the command, please try again later.".to_string()
        }
    }
}

/// Help text, prefixed with the guild's resolved display prefix
pub fn help_text(prefix: &str, descriptions: &str) -> String {
    format!("Prefix here is `{prefix}`.\n{descriptions}")
}
