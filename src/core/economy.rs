//! Transfer operation and balance queries
//!
//! This module provides [`Economy`], the orchestrator that moves coins
//! between accounts as a single unit of work and serves the read paths
//! (balance, leaderboard) used by the command surface.
//!
//! # Transfer semantics
//!
//! A transfer validates its preconditions against a fresh balance read,
//! then debits the sender and credits the recipient inside one store
//! transaction. The store re-checks the non-negative invariant at write
//! time, so a concurrent transfer that drained the sender between read
//! and commit aborts the whole unit of work; no partial transfer is ever
//! observable. A commit-time write conflict is retried exactly once with
//! a fresh read before surfacing to the caller.

use crate::core::traits::AccountStore;
use crate::types::{Account, EconomyError, GuildId, StoreError, TransferReceipt, UserId};
use std::sync::Arc;
use tracing::{debug, warn};

/// Coin economy service over a pluggable account store
///
/// Clonable and safe to share across async tasks; the store itself is the
/// only shared mutable state and all balance mutations go through its
/// atomic operations. No balance is cached across requests.
#[derive(Debug)]
pub struct Economy<S> {
    store: Arc<S>,
}

impl<S> Clone for Economy<S> {
    fn clone(&self) -> Self {
        Economy {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AccountStore> Economy<S> {
    /// Create an economy service over `store`
    pub fn new(store: Arc<S>) -> Self {
        Economy { store }
    }

    /// A user's current balance in `guild`, creating the account with a
    /// zero balance if it does not exist yet
    pub async fn balance(&self, user: UserId, guild: GuildId) -> Result<Account, EconomyError> {
        self.store
            .get_or_create(user, guild)
            .await
            .map_err(Self::map_store_error)
    }

    /// Accounts in `guild` with a positive balance, richest first
    pub async fn leaderboard(&self, guild: GuildId) -> Result<Vec<Account>, EconomyError> {
        self.store
            .leaderboard(guild)
            .await
            .map_err(Self::map_store_error)
    }

    /// Move `amount` coins from `sender` to `recipient` within `guild`
    ///
    /// Preconditions are checked before any mutation, each producing a
    /// distinct error; the two balance writes then apply atomically or
    /// not at all.
    ///
    /// # Errors
    ///
    /// - [`EconomyError::InvalidAmount`] if `amount` is not positive
    /// - [`EconomyError::SelfTransfer`] if `sender == recipient`
    /// - [`EconomyError::InsufficientFunds`] if the sender's balance is
    ///   short, at check time or at commit time (race)
    /// - [`EconomyError::RecipientNotFound`] if the recipient row cannot
    ///   be resolved at write time
    /// - [`EconomyError::TransactionConflict`] if a write conflict
    ///   persists across the single automatic retry
    /// - [`EconomyError::Unavailable`] if the storage layer fails; any
    ///   open transaction has been rolled back
    pub async fn transfer(
        &self,
        sender: UserId,
        recipient: UserId,
        guild: GuildId,
        amount: i64,
    ) -> Result<TransferReceipt, EconomyError> {
        if amount <= 0 {
            return Err(EconomyError::invalid_amount(amount));
        }
        if sender == recipient {
            return Err(EconomyError::self_transfer(sender));
        }

        match self.attempt_transfer(sender, recipient, guild, amount).await {
            Err(EconomyError::TransactionConflict) => {
                // One automatic retry with a fresh balance read; funds
                // state may have legitimately changed in between, so an
                // InsufficientFunds outcome here is final.
                warn!(sender, recipient, guild, amount, "transfer conflict, retrying once");
                self.attempt_transfer(sender, recipient, guild, amount).await
            }
            result => result,
        }
    }

    /// One attempt at the transactional debit/credit pair
    async fn attempt_transfer(
        &self,
        sender: UserId,
        recipient: UserId,
        guild: GuildId,
        amount: i64,
    ) -> Result<TransferReceipt, EconomyError> {
        // Resolve both accounts up front; the sender read doubles as the
        // precondition balance check.
        let sender_account = self
            .store
            .get_or_create(sender, guild)
            .await
            .map_err(Self::map_store_error)?;
        self.store
            .get_or_create(recipient, guild)
            .await
            .map_err(|e| match e {
                StoreError::AccountNotFound { user, .. } => {
                    EconomyError::recipient_not_found(user)
                }
                other => Self::map_store_error(other),
            })?;

        if sender_account.coins < amount {
            return Err(EconomyError::insufficient_funds(
                sender,
                sender_account.coins,
                amount,
            ));
        }

        // Commit-or-rollback on every exit path: `?` drops the
        // transaction, which rolls it back.
        let mut tx = self.store.begin().await.map_err(Self::map_store_error)?;

        let debited = match self.store.apply_delta(&mut tx, sender, guild, -amount).await {
            Ok(account) => account,
            Err(StoreError::BalanceBelowZero { .. }) => {
                // Lost a race since the precondition read; re-read so the
                // error carries the balance that blocked the debit.
                drop(tx);
                let balance = self
                    .store
                    .get(sender, guild)
                    .await
                    .map_err(Self::map_store_error)?
                    .map_or(0, |account| account.coins);
                return Err(EconomyError::insufficient_funds(sender, balance, amount));
            }
            Err(other) => return Err(Self::map_store_error(other)),
        };

        let credited = self
            .store
            .apply_delta(&mut tx, recipient, guild, amount)
            .await
            .map_err(|e| match e {
                StoreError::AccountNotFound { user, .. } => {
                    EconomyError::recipient_not_found(user)
                }
                other => Self::map_store_error(other),
            })?;

        self.store.commit(tx).await.map_err(Self::map_store_error)?;

        debug!(
            sender,
            recipient,
            guild,
            amount,
            sender_balance = debited.coins,
            recipient_balance = credited.coins,
            "transfer committed"
        );

        Ok(TransferReceipt {
            sender: debited,
            recipient: credited,
            amount,
        })
    }

    /// Translate store failures that carry no transfer-specific meaning
    fn map_store_error(error: StoreError) -> EconomyError {
        match error {
            StoreError::Conflict => EconomyError::TransactionConflict,
            other => EconomyError::Unavailable {
                message: other.to_string(),
            },
        }
    }
}
