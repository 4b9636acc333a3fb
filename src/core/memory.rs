//! In-memory store backend
//!
//! This module provides [`MemoryStore`], which keeps accounts and guild
//! settings in concurrent maps. It backs local runs without a database
//! and the integration test suite.
//!
//! # Design
//!
//! Accounts live in a `DashMap` keyed by `(user, guild)`, giving
//! fine-grained per-key locking for reads and lazy creation. Units of
//! work stage their deltas in a [`MemoryTx`] while holding a store-wide
//! async mutex, so transactions serialize against each other and every
//! conditional check sees fresh state. Dropping a transaction without
//! committing discards the staged writes, which is exactly the rollback
//! guarantee the economy layer relies on.

use crate::core::traits::{AccountStore, SettingsStore};
use crate::types::{
    Account, GuildId, GuildSettings, SettingUpdate, StoreError, UserId,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Concurrent in-memory account and settings store
///
/// Safe to share across async tasks; reads on different accounts never
/// block each other, while transactional units of work serialize on a
/// store-wide mutex.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// Account state keyed by `(user, guild)`
    accounts: Arc<DashMap<(UserId, GuildId), Account>>,

    /// Guild settings keyed by guild id
    settings: Arc<DashMap<GuildId, GuildSettings>>,

    /// Serializes transactional units of work
    write_lock: Arc<Mutex<()>>,
}

/// A staged unit of work against a [`MemoryStore`]
///
/// Holds the store's write lock for its whole lifetime; staged deltas are
/// applied on commit and silently discarded on drop.
pub struct MemoryTx {
    _guard: OwnedMutexGuard<()>,
    staged: Vec<((UserId, GuildId), i64)>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `key` as seen by a transaction: committed state plus
    /// any deltas it has already staged for that key
    fn staged_balance(&self, tx: &MemoryTx, key: (UserId, GuildId)) -> Option<i64> {
        let committed = self.accounts.get(&key).map(|entry| entry.coins)?;
        let pending: i64 = tx
            .staged
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, delta)| delta)
            .sum();
        Some(committed + pending)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    type Tx = MemoryTx;

    async fn get_or_create(&self, user: UserId, guild: GuildId) -> Result<Account, StoreError> {
        // entry() locks the shard, so two concurrent creates for the same
        // key resolve to a single inserted account.
        let account = self
            .accounts
            .entry((user, guild))
            .or_insert_with(|| Account::new(user, guild))
            .clone();
        Ok(account)
    }

    async fn get(&self, user: UserId, guild: GuildId) -> Result<Option<Account>, StoreError> {
        Ok(self
            .accounts
            .get(&(user, guild))
            .map(|entry| entry.clone()))
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let guard = self.write_lock.clone().lock_owned().await;
        Ok(MemoryTx {
            _guard: guard,
            staged: Vec::new(),
        })
    }

    async fn apply_delta(
        &self,
        tx: &mut Self::Tx,
        user: UserId,
        guild: GuildId,
        delta: i64,
    ) -> Result<Account, StoreError> {
        let key = (user, guild);
        let current = self
            .staged_balance(tx, key)
            .ok_or_else(|| StoreError::account_not_found(user, guild))?;

        let next = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::balance_overflow(user, guild))?;
        if next < 0 {
            return Err(StoreError::balance_below_zero(user, guild));
        }

        tx.staged.push((key, delta));
        Ok(Account {
            user_id: user,
            guild_id: guild,
            coins: next,
        })
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError> {
        // All deltas were validated against fresh state under the write
        // lock, so applying them cannot violate the balance invariant.
        for ((user, guild), delta) in &tx.staged {
            if let Some(mut entry) = self.accounts.get_mut(&(*user, *guild)) {
                entry.coins += delta;
            }
        }
        Ok(())
    }

    async fn leaderboard(&self, guild: GuildId) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|entry| entry.guild_id == guild && entry.coins > 0)
            .map(|entry| entry.value().clone())
            .collect();
        // Ties break by user id: the map iterates in arbitrary order, so
        // a secondary key keeps the board stable between calls.
        accounts.sort_by(|a, b| b.coins.cmp(&a.coins).then(a.user_id.cmp(&b.user_id)));
        Ok(accounts)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn settings(&self, guild: GuildId) -> Result<Option<GuildSettings>, StoreError> {
        Ok(self.settings.get(&guild).map(|entry| entry.clone()))
    }

    async fn upsert_setting(
        &self,
        guild: GuildId,
        update: SettingUpdate,
    ) -> Result<GuildSettings, StoreError> {
        let mut entry = self
            .settings
            .entry(guild)
            .or_insert_with(|| GuildSettings::new(guild));
        entry.apply(update);
        Ok(entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join;

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let store = MemoryStore::new();

        let first = store.get_or_create(1, 10).await.unwrap();
        let second = store.get_or_create(1, 10).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.coins, 0);
    }

    #[tokio::test]
    async fn concurrent_creates_resolve_to_one_account() {
        let store = MemoryStore::new();

        let (a, b) = join(store.get_or_create(1, 10), store.get_or_create(1, 10)).await;

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(store.leaderboard(10).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn get_does_not_create() {
        let store = MemoryStore::new();

        assert_eq!(store.get(1, 10).await.unwrap(), None);
    }

    #[tokio::test]
    async fn apply_delta_rejects_negative_result() {
        let store = MemoryStore::new();
        store.get_or_create(1, 10).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = store.apply_delta(&mut tx, 1, 10, -5).await.unwrap_err();

        assert!(matches!(err, StoreError::BalanceBelowZero { .. }));
    }

    #[tokio::test]
    async fn apply_delta_rejects_missing_account() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let err = store.apply_delta(&mut tx, 1, 10, 5).await.unwrap_err();

        assert!(matches!(err, StoreError::AccountNotFound { .. }));
    }

    #[tokio::test]
    async fn apply_delta_rejects_overflow() {
        let store = MemoryStore::new();
        store.get_or_create(1, 10).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        store
            .apply_delta(&mut tx, 1, 10, i64::MAX)
            .await
            .unwrap();
        let err = store.apply_delta(&mut tx, 1, 10, 1).await.unwrap_err();

        assert!(matches!(err, StoreError::BalanceOverflow { .. }));
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = MemoryStore::new();
        store.get_or_create(1, 10).await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            store.apply_delta(&mut tx, 1, 10, 100).await.unwrap();
            // tx dropped without commit
        }

        assert_eq!(store.get(1, 10).await.unwrap().unwrap().coins, 0);
    }

    #[tokio::test]
    async fn committed_transaction_applies_all_deltas() {
        let store = MemoryStore::new();
        store.get_or_create(1, 10).await.unwrap();
        store.get_or_create(2, 10).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        store.apply_delta(&mut tx, 1, 10, 100).await.unwrap();
        store.apply_delta(&mut tx, 2, 10, 40).await.unwrap();
        store.commit(tx).await.unwrap();

        assert_eq!(store.get(1, 10).await.unwrap().unwrap().coins, 100);
        assert_eq!(store.get(2, 10).await.unwrap().unwrap().coins, 40);
    }

    #[tokio::test]
    async fn staged_deltas_are_visible_within_the_transaction() {
        let store = MemoryStore::new();
        store.get_or_create(1, 10).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        store.apply_delta(&mut tx, 1, 10, 30).await.unwrap();
        // 30 - 30 is fine, 30 - 31 is not
        let err = store.apply_delta(&mut tx, 1, 10, -31).await.unwrap_err();
        assert!(matches!(err, StoreError::BalanceBelowZero { .. }));

        let account = store.apply_delta(&mut tx, 1, 10, -30).await.unwrap();
        assert_eq!(account.coins, 0);
    }

    #[tokio::test]
    async fn leaderboard_filters_and_orders() {
        let store = MemoryStore::new();
        for (user, coins) in [(1, 50), (2, 0), (3, 120), (4, 50)] {
            store.get_or_create(user, 10).await.unwrap();
            if coins > 0 {
                let mut tx = store.begin().await.unwrap();
                store.apply_delta(&mut tx, user, 10, coins).await.unwrap();
                store.commit(tx).await.unwrap();
            }
        }
        // A different guild must not leak in
        store.get_or_create(9, 11).await.unwrap();
        let mut tx = store.begin().await.unwrap();
        store.apply_delta(&mut tx, 9, 11, 999).await.unwrap();
        store.commit(tx).await.unwrap();

        let board = store.leaderboard(10).await.unwrap();
        let order: Vec<(UserId, i64)> = board.iter().map(|a| (a.user_id, a.coins)).collect();

        assert_eq!(order, vec![(3, 120), (1, 50), (4, 50)]);
    }

    #[tokio::test]
    async fn settings_upsert_creates_then_updates() {
        let store = MemoryStore::new();

        assert_eq!(store.settings(10).await.unwrap(), None);

        let created = store
            .upsert_setting(10, SettingUpdate::Prefix("!".into()))
            .await
            .unwrap();
        assert_eq!(created.prefix.as_deref(), Some("!"));

        let updated = store
            .upsert_setting(10, SettingUpdate::InfoChannelId(555))
            .await
            .unwrap();
        assert_eq!(updated.prefix.as_deref(), Some("!"));
        assert_eq!(updated.info_channel_id, Some(555));
    }
}
