//! Setting command formatting
//!
//! A setting is changed by writing `BTreqSETC:<offset>=<id>` as plain text to
//! the command channel. The device never answers the write; the new value
//! shows up in the next settings dump.

use super::COMMAND_PREFIX;
use crate::error::{ParseError, SettingError};
use crate::settings::SettingsRegistry;

/// Format the command that stores `id` at `offset`
///
/// # Example
/// ```
/// use uniden_core::protocol::command::format_setting_command;
///
/// assert_eq!(format_setting_command(60, 1), "BTreqSETC:60=1");
/// ```
pub fn format_setting_command(offset: usize, id: u8) -> String {
    format!("{}{}={}", COMMAND_PREFIX, offset, id)
}

/// Parse a setting command back into `(offset, id)`
pub fn parse_setting_command(text: &str) -> Result<(usize, u8), ParseError> {
    let invalid = || ParseError::InvalidCommand(text.to_string());

    let body = text
        .trim()
        .strip_prefix(COMMAND_PREFIX)
        .ok_or_else(invalid)?;
    let (offset, id) = body.split_once('=').ok_or_else(invalid)?;
    let offset = offset.parse::<usize>().map_err(|_| invalid())?;
    let id = id.parse::<u8>().map_err(|_| invalid())?;

    Ok((offset, id))
}

/// Turn an update intent into the command string for the registry's model.
///
/// Fails with `NotFound` for an unknown name, `InvalidValue` when `id` is not
/// in the setting's value set as it stands now, and `NoStorageOffset` when the
/// active model does not store the setting.
pub fn encode_update(
    registry: &SettingsRegistry,
    name: &str,
    id: u8,
) -> Result<String, SettingError> {
    let offset = registry.check_update(name, id)?;
    Ok(format_setting_command(offset, id))
}
