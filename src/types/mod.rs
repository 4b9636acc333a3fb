//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account and transfer-related types
//! - `settings`: Guild-scoped configuration types
//! - `error`: Error types for the economy subsystem and its stores

pub mod account;
pub mod error;
pub mod settings;

pub use account::{Account, GuildId, TransferReceipt, UserId};
pub use error::{EconomyError, SettingsError, StoreError};
pub use settings::{GuildSettings, SettingName, SettingUpdate};
