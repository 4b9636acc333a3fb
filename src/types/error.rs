//! Error types for the economy subsystem
//!
//! This module defines all error types that can occur while serving
//! commands. Errors are designed to be descriptive and to map one-to-one
//! onto user-facing messages in the command layer.
//!
//! # Error Categories
//!
//! - **Economy errors**: precondition failures and transfer outcomes
//!   (insufficient funds, self transfer, invalid amount, ...)
//! - **Store errors**: persistence-layer failures (missing rows, write
//!   conflicts, unavailable storage)
//! - **Settings errors**: rejected guild configuration updates

use crate::types::account::{GuildId, UserId};
use crate::types::settings::SettingName;
use thiserror::Error;

/// Errors produced by the transfer operation and the balance queries
///
/// Each variant corresponds to a distinct user-facing message. Precondition
/// failures (`InvalidAmount`, `SelfTransfer`, `InsufficientFunds` at check
/// time) never reach the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EconomyError {
    /// The requested amount is zero or negative
    ///
    /// This is a recoverable error - the transfer is rejected before any
    /// account is touched.
    #[error("Invalid amount {amount}: a transfer must move a positive number of coins")]
    InvalidAmount {
        /// The rejected amount
        amount: i64,
    },

    /// Sender and recipient are the same account
    #[error("User {user} attempted to transfer coins to themselves")]
    SelfTransfer {
        /// The user on both sides of the transfer
        user: UserId,
    },

    /// The sender's balance cannot cover the requested amount
    ///
    /// Raised either at precondition time or when the conditional write
    /// detects that a concurrent transfer drained the balance first.
    /// Never retried automatically.
    #[error("Insufficient funds for user {user}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// The sender
        user: UserId,
        /// Balance observed when the transfer was rejected
        balance: i64,
        /// Amount the transfer asked for
        requested: i64,
    },

    /// The recipient could not be resolved to an account
    #[error("Recipient {user} could not be resolved to an account")]
    RecipientNotFound {
        /// The unresolvable recipient
        user: UserId,
    },

    /// A concurrent-write conflict persisted across the automatic retry
    ///
    /// Surfaced to the user as a generic operation failure.
    #[error("Transfer aborted: concurrent write conflict")]
    TransactionConflict,

    /// The storage layer is unreachable or timed out
    ///
    /// Fatal to the current command only; any open transaction has been
    /// rolled back.
    #[error("Storage unavailable: {message}")]
    Unavailable {
        /// Description of the storage failure
        message: String,
    },
}

impl EconomyError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: i64) -> Self {
        EconomyError::InvalidAmount { amount }
    }

    /// Create a SelfTransfer error
    pub fn self_transfer(user: UserId) -> Self {
        EconomyError::SelfTransfer { user }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(user: UserId, balance: i64, requested: i64) -> Self {
        EconomyError::InsufficientFunds {
            user,
            balance,
            requested,
        }
    }

    /// Create a RecipientNotFound error
    pub fn recipient_not_found(user: UserId) -> Self {
        EconomyError::RecipientNotFound { user }
    }
}

/// Errors produced by an account or settings store
///
/// Store errors carry enough context for the economy layer to translate
/// them into the matching [`EconomyError`] without re-reading state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No account row exists for the given key
    #[error("Account for user {user} in guild {guild} not found")]
    AccountNotFound {
        /// The user half of the key
        user: UserId,
        /// The guild half of the key
        guild: GuildId,
    },

    /// A conditional write would have driven the balance below zero
    ///
    /// The invariant is re-checked at write time, so this can fire even
    /// after a successful precondition read.
    #[error("Balance for user {user} in guild {guild} would fall below zero")]
    BalanceBelowZero {
        /// The user half of the key
        user: UserId,
        /// The guild half of the key
        guild: GuildId,
    },

    /// A credit would overflow the balance column
    #[error("Balance for user {user} in guild {guild} would overflow")]
    BalanceOverflow {
        /// The user half of the key
        user: UserId,
        /// The guild half of the key
        guild: GuildId,
    },

    /// Concurrent transactions touched the same row and one must abort
    ///
    /// The losing transaction is rolled back; the caller may retry with a
    /// fresh read.
    #[error("Concurrent write conflict")]
    Conflict,

    /// The storage layer is unreachable, timed out, or failed internally
    #[error("Storage unavailable: {message}")]
    Unavailable {
        /// Description of the storage failure
        message: String,
    },
}

impl StoreError {
    /// Create an AccountNotFound error
    pub fn account_not_found(user: UserId, guild: GuildId) -> Self {
        StoreError::AccountNotFound { user, guild }
    }

    /// Create a BalanceBelowZero error
    pub fn balance_below_zero(user: UserId, guild: GuildId) -> Self {
        StoreError::BalanceBelowZero { user, guild }
    }

    /// Create a BalanceOverflow error
    pub fn balance_overflow(user: UserId, guild: GuildId) -> Self {
        StoreError::BalanceOverflow { user, guild }
    }

    /// Create an Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }
}

// Conversion from sqlx::Error to StoreError
//
// Serialization failures and deadlocks (SQLSTATE 40001 / 40P01) become
// Conflict so the economy layer can retry; everything else is treated as
// the storage layer being unavailable for this command.
impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &error {
            if let Some(code) = db.code() {
                if code == "40001" || code == "40P01" {
                    return StoreError::Conflict;
                }
            }
        }
        StoreError::unavailable(error.to_string())
    }
}

/// Errors produced while updating guild settings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The setting name does not exist
    #[error("Unknown setting '{name}': expected Prefix, StaffChannelId or InfoChannelId")]
    UnknownSetting {
        /// The unrecognized name as typed
        name: String,
    },

    /// The value cannot be parsed for the named setting
    #[error("Invalid value for {name}: {message}")]
    InvalidValue {
        /// The targeted setting
        name: SettingName,
        /// What was wrong with the value
        message: String,
    },

    /// The value exceeds the accepted length
    #[error("Value for {name} is too long (maximum {max} characters)")]
    ValueTooLong {
        /// The targeted setting
        name: SettingName,
        /// Longest accepted length
        max: usize,
    },
}

impl SettingsError {
    /// Create an UnknownSetting error
    pub fn unknown_setting(name: &str) -> Self {
        SettingsError::UnknownSetting {
            name: name.to_string(),
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(name: SettingName, message: &str) -> Self {
        SettingsError::InvalidValue {
            name,
            message: message.to_string(),
        }
    }

    /// Create a ValueTooLong error
    pub fn value_too_long(name: SettingName, max: usize) -> Self {
        SettingsError::ValueTooLong { name, max }
    }
}

impl std::fmt::Display for SettingName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
