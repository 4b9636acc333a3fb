//! Coinkeeper Library
//! # Overview
//!
//! This library implements a Telegram guild economy bot: members hold a
//! per-guild coin balance, give coins to each other, and inspect a
//! leaderboard, with guild-scoped bot settings on the side.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, GuildSettings, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::economy`] - Transfer orchestration and balance queries
//!   - [`core::memory`] - In-memory store backend (local runs, tests)
//!   - [`core::postgres`] - PostgreSQL store backend
//! - [`bot`] - Command surface over the teloxide dispatcher
//!
//! # The transfer invariant
//!
//! The one non-trivial piece of logic is the coin transfer: debit the
//! sender and credit the recipient inside a single unit of work, with the
//! non-negative balance invariant re-checked at write time so concurrent
//! transfers sharing a sender cannot drive a balance below zero. Both
//! store backends provide that conditional-write guarantee; everything
//! else in the crate is command plumbing and display formatting.

pub mod bot;
pub mod cli;
pub mod core;
pub mod types;

pub use crate::core::{AccountStore, Economy, MemoryStore, PgStore, SettingsStore};
pub use types::{
    Account, EconomyError, GuildId, GuildSettings, SettingUpdate, SettingsError, StoreError,
    TransferReceipt, UserId,
};
