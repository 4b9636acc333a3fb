//! Account-related types for the coin ledger
//!
//! This module defines the Account structure and the receipt returned by
//! a successful transfer between two accounts.

use serde::Serialize;
use sqlx::FromRow;

/// Chat-platform user identifier
///
/// Telegram user ids fit in a signed 64-bit integer.
pub type UserId = i64;

/// Guild (chat/server) identifier
///
/// A guild scopes accounts and settings; a user has an independent
/// balance in every guild. Telegram chat ids are signed 64-bit integers.
pub type GuildId = i64;

/// Per-(user, guild) currency account
///
/// Represents the persisted state of one member's coin balance within a
/// single guild. The composite key is `(user_id, guild_id)`; the balance
/// invariant `coins >= 0` holds after every committed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Account {
    /// The owning user's id
    pub user_id: UserId,

    /// The guild this balance is scoped to
    pub guild_id: GuildId,

    /// Current coin balance, never negative after a commit
    pub coins: i64,
}

impl Account {
    /// Create a new account with a zero balance
    ///
    /// Accounts are created lazily on first reference to a
    /// `(user, guild)` pair.
    pub fn new(user_id: UserId, guild_id: GuildId) -> Self {
        Account {
            user_id,
            guild_id,
            coins: 0,
        }
    }
}

/// Outcome of a committed transfer
///
/// Carries the post-commit balances of both parties so the command layer
/// can render a confirmation without issuing further reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Sender account after the debit was committed
    pub sender: Account,

    /// Recipient account after the credit was committed
    pub recipient: Account,

    /// Amount of coins moved
    pub amount: i64,
}
