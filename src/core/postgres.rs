//! PostgreSQL store backend
//!
//! This module provides [`PgStore`], the relational implementation of the
//! account and settings stores on top of a `sqlx` connection pool.
//!
//! # Schema
//!
//! The `accounts` table carries a `UNIQUE (user_id, guild_id)` constraint
//! and a `CHECK (coins >= 0)` constraint as defense in depth alongside the
//! conditional write. `guild_settings` is keyed by guild id.
//!
//! # Atomicity
//!
//! [`AccountStore::apply_delta`] is a single conditional `UPDATE` whose
//! `WHERE` clause re-checks the non-negative invariant at write time, so
//! a concurrent transfer that drained the balance after the caller's
//! precondition read makes the statement match zero rows instead of
//! committing a negative balance. Serialization failures map to
//! [`StoreError::Conflict`] via the `From<sqlx::Error>` conversion.

use crate::core::traits::{AccountStore, SettingsStore};
use crate::types::{
    Account, GuildId, GuildSettings, SettingUpdate, StoreError, UserId,
};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

/// DDL applied at startup; idempotent so restarts are safe.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id        BIGSERIAL PRIMARY KEY,
    user_id   BIGINT NOT NULL,
    guild_id  BIGINT NOT NULL,
    coins     BIGINT NOT NULL DEFAULT 0 CHECK (coins >= 0),
    UNIQUE (user_id, guild_id)
);

CREATE TABLE IF NOT EXISTS guild_settings (
    guild_id         BIGINT PRIMARY KEY,
    prefix           TEXT,
    staff_channel_id BIGINT,
    info_channel_id  BIGINT
);
"#;

/// PostgreSQL-backed account and settings store
///
/// Cheap to clone; all clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database and prepare the schema
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the pool cannot be
    /// established or the schema statements fail.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;
        let store = PgStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create the tables if they do not exist yet
    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for PgStore {
    type Tx = Transaction<'static, Postgres>;

    async fn get_or_create(&self, user: UserId, guild: GuildId) -> Result<Account, StoreError> {
        // ON CONFLICT DO NOTHING keeps concurrent creates idempotent: the
        // unique constraint guarantees a single row per key and an
        // existing balance is never overwritten.
        sqlx::query(
            "INSERT INTO accounts (user_id, guild_id, coins) VALUES ($1, $2, 0)
             ON CONFLICT (user_id, guild_id) DO NOTHING",
        )
        .bind(user)
        .bind(guild)
        .execute(&self.pool)
        .await?;

        let account = sqlx::query_as::<_, Account>(
            "SELECT user_id, guild_id, coins FROM accounts
             WHERE user_id = $1 AND guild_id = $2",
        )
        .bind(user)
        .bind(guild)
        .fetch_one(&self.pool)
        .await?;
        Ok(account)
    }

    async fn get(&self, user: UserId, guild: GuildId) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT user_id, guild_id, coins FROM accounts
             WHERE user_id = $1 AND guild_id = $2",
        )
        .bind(user)
        .bind(guild)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(self.pool.begin().await?)
    }

    async fn apply_delta(
        &self,
        tx: &mut Self::Tx,
        user: UserId,
        guild: GuildId,
        delta: i64,
    ) -> Result<Account, StoreError> {
        // The WHERE clause re-checks the invariant at write time; a row
        // that matched at read time but no longer covers the debit makes
        // this update match nothing.
        let updated = sqlx::query_as::<_, Account>(
            "UPDATE accounts SET coins = coins + $3
             WHERE user_id = $1 AND guild_id = $2 AND coins + $3 >= 0
             RETURNING user_id, guild_id, coins",
        )
        .bind(user)
        .bind(guild)
        .bind(delta)
        .fetch_optional(&mut **tx)
        .await?;

        match updated {
            Some(account) => Ok(account),
            None => {
                // Distinguish a missing row from a blocked debit.
                let exists = sqlx::query_scalar::<_, i32>(
                    "SELECT 1 FROM accounts WHERE user_id = $1 AND guild_id = $2",
                )
                .bind(user)
                .bind(guild)
                .fetch_optional(&mut **tx)
                .await?;
                if exists.is_some() {
                    Err(StoreError::balance_below_zero(user, guild))
                } else {
                    Err(StoreError::account_not_found(user, guild))
                }
            }
        }
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError> {
        tx.commit().await?;
        Ok(())
    }

    async fn leaderboard(&self, guild: GuildId) -> Result<Vec<Account>, StoreError> {
        let accounts = sqlx::query_as::<_, Account>(
            "SELECT user_id, guild_id, coins FROM accounts
             WHERE guild_id = $1 AND coins > 0
             ORDER BY coins DESC, id ASC",
        )
        .bind(guild)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn settings(&self, guild: GuildId) -> Result<Option<GuildSettings>, StoreError> {
        let settings = sqlx::query_as::<_, GuildSettings>(
            "SELECT guild_id, prefix, staff_channel_id, info_channel_id
             FROM guild_settings WHERE guild_id = $1",
        )
        .bind(guild)
        .fetch_optional(&self.pool)
        .await?;
        Ok(settings)
    }

    async fn upsert_setting(
        &self,
        guild: GuildId,
        update: SettingUpdate,
    ) -> Result<GuildSettings, StoreError> {
        let query = match &update {
            SettingUpdate::Prefix(_) => {
                "INSERT INTO guild_settings (guild_id, prefix) VALUES ($1, $2)
                 ON CONFLICT (guild_id) DO UPDATE SET prefix = EXCLUDED.prefix
                 RETURNING guild_id, prefix, staff_channel_id, info_channel_id"
            }
            SettingUpdate::StaffChannelId(_) => {
                "INSERT INTO guild_settings (guild_id, staff_channel_id) VALUES ($1, $2)
                 ON CONFLICT (guild_id) DO UPDATE SET staff_channel_id = EXCLUDED.staff_channel_id
                 RETURNING guild_id, prefix, staff_channel_id, info_channel_id"
            }
            SettingUpdate::InfoChannelId(_) => {
                "INSERT INTO guild_settings (guild_id, info_channel_id) VALUES ($1, $2)
                 ON CONFLICT (guild_id) DO UPDATE SET info_channel_id = EXCLUDED.info_channel_id
                 RETURNING guild_id, prefix, staff_channel_id, info_channel_id"
            }
        };

        let settings = match update {
            SettingUpdate::Prefix(value) => {
                sqlx::query_as::<_, GuildSettings>(query)
                    .bind(guild)
                    .bind(value)
                    .fetch_one(&self.pool)
                    .await?
            }
            SettingUpdate::StaffChannelId(id) | SettingUpdate::InfoChannelId(id) => {
                sqlx::query_as::<_, GuildSettings>(query)
                    .bind(guild)
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(settings)
    }
}
