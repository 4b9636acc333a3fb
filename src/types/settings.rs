//! Guild-scoped configuration types
//!
//! Each guild can override the bot's display prefix and point the bot at
//! dedicated staff/info channels. Settings are persisted alongside the
//! accounts and read by display logic only; they are not part of the
//! transfer path.

use crate::types::error::SettingsError;
use crate::types::GuildId;
use serde::Serialize;
use sqlx::FromRow;
use std::str::FromStr;

/// Longest accepted value for a textual setting
pub const SETTING_VALUE_MAX: usize = 32;

/// Persisted per-guild configuration
///
/// All fields except the key are optional; an unset field falls back to
/// the process-wide default (prefix) or to the current chat (channels).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct GuildSettings {
    /// The guild these settings belong to
    pub guild_id: GuildId,

    /// Command prefix shown in help output
    pub prefix: Option<String>,

    /// Channel receiving staff-only notices
    pub staff_channel_id: Option<i64>,

    /// Channel receiving public announcements such as the leaderboard
    pub info_channel_id: Option<i64>,
}

impl GuildSettings {
    /// Create empty settings for a guild
    pub fn new(guild_id: GuildId) -> Self {
        GuildSettings {
            guild_id,
            prefix: None,
            staff_channel_id: None,
            info_channel_id: None,
        }
    }

    /// Resolve the display prefix, falling back to `default` when the
    /// guild has not configured one
    pub fn prefix_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.prefix.as_deref().unwrap_or(default)
    }

    /// Apply one named update in place
    pub fn apply(&mut self, update: SettingUpdate) {
        match update {
            SettingUpdate::Prefix(value) => self.prefix = Some(value),
            SettingUpdate::StaffChannelId(id) => self.staff_channel_id = Some(id),
            SettingUpdate::InfoChannelId(id) => self.info_channel_id = Some(id),
        }
    }
}

/// Names of the settings a guild may configure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingName {
    Prefix,
    StaffChannelId,
    InfoChannelId,
}

impl SettingName {
    /// Canonical spelling used in user-facing messages
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingName::Prefix => "Prefix",
            SettingName::StaffChannelId => "StaffChannelId",
            SettingName::InfoChannelId => "InfoChannelId",
        }
    }
}

impl FromStr for SettingName {
    type Err = SettingsError;

    /// Parse a setting name case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prefix" => Ok(SettingName::Prefix),
            "staffchannelid" => Ok(SettingName::StaffChannelId),
            "infochannelid" => Ok(SettingName::InfoChannelId),
            _ => Err(SettingsError::unknown_setting(s)),
        }
    }
}

/// A validated name/value pair ready to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingUpdate {
    Prefix(String),
    StaffChannelId(i64),
    InfoChannelId(i64),
}

impl SettingUpdate {
    /// Validate a raw `name value` pair from the command surface
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name does not match a known setting
    /// - A prefix value exceeds [`SETTING_VALUE_MAX`] characters
    /// - A channel value is not a numeric channel id
    pub fn parse(name: &str, value: &str) -> Result<Self, SettingsError> {
        let name = SettingName::from_str(name)?;
        match name {
            SettingName::Prefix => {
                if value.chars().count() > SETTING_VALUE_MAX {
                    return Err(SettingsError::value_too_long(name, SETTING_VALUE_MAX));
                }
                Ok(SettingUpdate::Prefix(value.to_string()))
            }
            SettingName::StaffChannelId | SettingName::InfoChannelId => {
                let id: i64 = value.parse().map_err(|_| {
                    SettingsError::invalid_value(name, "expected a numeric channel id")
                })?;
                match name {
                    SettingName::StaffChannelId => Ok(SettingUpdate::StaffChannelId(id)),
                    _ => Ok(SettingUpdate::InfoChannelId(id)),
                }
            }
        }
    }

    /// The name this update targets
    pub fn name(&self) -> SettingName {
        match self {
            SettingUpdate::Prefix(_) => SettingName::Prefix,
            SettingUpdate::StaffChannelId(_) => SettingName::StaffChannelId,
            SettingUpdate::InfoChannelId(_) => SettingName::InfoChannelId,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::canonical("Prefix", SettingName::Prefix)]
    #[case::lowercase("prefix", SettingName::Prefix)]
    #[case::staff("staffchannelid", SettingName::StaffChannelId)]
    #[case::info("InfoChannelId", SettingName::InfoChannelId)]
    fn setting_names_parse_case_insensitively(
        #[case] input: &str,
        #[case] expected: SettingName,
    ) {
        assert_eq!(input.parse::<SettingName>().unwrap(), expected);
    }

    #[test]
    fn unknown_setting_name_is_rejected() {
        let err = "volume".parse::<SettingName>().unwrap_err();
        assert!(matches!(err, SettingsError::UnknownSetting { .. }));
    }

    #[test]
    fn prefix_value_over_limit_is_rejected() {
        let long = "x".repeat(SETTING_VALUE_MAX + 1);
        let err = SettingUpdate::parse("prefix", &long).unwrap_err();
        assert!(matches!(err, SettingsError::ValueTooLong { .. }));
    }

    #[test]
    fn channel_values_must_be_numeric() {
        let err = SettingUpdate::parse("infochannelid", "general").unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { .. }));
    }

    #[test]
    fn updates_apply_in_place() {
        let mut settings = GuildSettings::new(7);
        settings.apply(SettingUpdate::parse("prefix", "!").unwrap());
        settings.apply(SettingUpdate::parse("staffchannelid", "100").unwrap());

        assert_eq!(settings.prefix.as_deref(), Some("!"));
        assert_eq!(settings.staff_channel_id, Some(100));
        assert_eq!(settings.info_channel_id, None);
    }

    #[test]
    fn prefix_falls_back_to_default() {
        let mut settings = GuildSettings::new(7);
        assert_eq!(settings.prefix_or("m!"), "m!");

        settings.apply(SettingUpdate::Prefix("!".into()));
        assert_eq!(settings.prefix_or("m!"), "!");
    }
}
