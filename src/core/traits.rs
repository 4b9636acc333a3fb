//! Core traits for account and settings storage
//!
//! This module defines the trait abstractions that allow the in-memory
//! and PostgreSQL backends to be used interchangeably by the economy
//! layer and the command surface.

use crate::types::{Account, GuildId, GuildSettings, SettingUpdate, StoreError, UserId};
use async_trait::async_trait;

/// Trait for managing account state
///
/// Provides lazy account creation, read-only lookups, and a transactional
/// unit of work for multi-row balance updates. Implementations can be
/// in-memory (DashMap) or relational (sqlx/PostgreSQL).
///
/// # Transaction semantics
///
/// [`begin`](AccountStore::begin) opens a unit of work; every
/// [`apply_delta`](AccountStore::apply_delta) inside it either stages or
/// applies a conditional balance change, and
/// [`commit`](AccountStore::commit) makes all of them durable at once.
/// Dropping a transaction without committing rolls every change back, so
/// early returns on error leave no partial transfer observable.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Transactional context for a unit of work
    type Tx: Send;

    /// Get the account for `(user, guild)`, creating it with a zero
    /// balance if absent
    ///
    /// Creation is idempotent: a second concurrent create for the same
    /// key never produces two rows or overwrites an existing balance.
    async fn get_or_create(&self, user: UserId, guild: GuildId) -> Result<Account, StoreError>;

    /// Read-only lookup, no creation
    async fn get(&self, user: UserId, guild: GuildId) -> Result<Option<Account>, StoreError>;

    /// Open a transactional unit of work
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Add `delta` (positive or negative) to the stored balance within
    /// the caller's transaction
    ///
    /// The check-and-write is a single atomic step relative to other
    /// writers of the same row: if the resulting balance would go
    /// negative the call fails with
    /// [`StoreError::BalanceBelowZero`] and the transaction must be
    /// abandoned by the caller.
    async fn apply_delta(
        &self,
        tx: &mut Self::Tx,
        user: UserId,
        guild: GuildId,
        delta: i64,
    ) -> Result<Account, StoreError>;

    /// Commit the unit of work
    ///
    /// A concurrent-write conflict at commit surfaces as
    /// [`StoreError::Conflict`]; the transaction is rolled back.
    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;

    /// Accounts in `guild` with a positive balance, ordered by balance
    /// descending with a stable tie order
    async fn leaderboard(&self, guild: GuildId) -> Result<Vec<Account>, StoreError>;
}

/// Trait for guild-scoped configuration storage
#[async_trait]
pub trait SettingsStore: Send + Sync + 'static {
    /// Read a guild's settings, if any were ever written
    async fn settings(&self, guild: GuildId) -> Result<Option<GuildSettings>, StoreError>;

    /// Create-or-update the settings row and apply one named update
    async fn upsert_setting(
        &self,
        guild: GuildId,
        update: SettingUpdate,
    ) -> Result<GuildSettings, StoreError>;
}
