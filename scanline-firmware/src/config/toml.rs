//! Simple TOML parser for board configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! board.toml. It does NOT support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - [section] headers
//! - Comments (# ...), including trailing comments
//! - `_` digit separators in integers
//!
//! NOT supported:
//! - Multi-line strings
//! - Arrays and inline tables
//! - Dotted keys and nested sections

use alloc::string::String;

use scanline_core::config::{
    BlankLevel, BoardConfig, DiskSource, BAUD_RANGE, BLINK_RANGE_MS, LINK_TIMEOUT_RANGE_MS,
    POINTER_CLAMP_RANGE, SECOND_PERIOD_RANGE_US, VSYNC_PERIOD_RANGE_US,
};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value has the wrong type or an unknown choice
    InvalidValue,
    /// Integer outside the allowed range for its key
    OutOfRange,
    /// Line is neither a header nor `key = value`
    InvalidLine,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Video,
    Input,
    Bridge,
    Emulator,
    Disk,
    Status,
}

/// Parse TOML configuration into BoardConfig
///
/// Keys not given keep their defaults; unknown keys are ignored so an
/// older firmware accepts a newer file.
pub fn parse_config(input: &str) -> Result<BoardConfig, ParseError> {
    let mut config = BoardConfig::new();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let header = strip_comment(line);
            if !header.ends_with(']') {
                return Err(ParseError::InvalidSection);
            }
            section = parse_section_header(&header[1..header.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        apply_value(&mut config, section, key, value)?;
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "video" => Ok(Section::Video),
        "input" => Ok(Section::Input),
        "bridge" => Ok(Section::Bridge),
        "emulator" => Ok(Section::Emulator),
        "disk" => Ok(Section::Disk),
        "status" => Ok(Section::Status),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Drop a trailing comment unless the `#` sits inside a string
fn strip_comment(text: &str) -> &str {
    match text.find('#') {
        Some(hash_pos) if text[..hash_pos].matches('"').count() % 2 == 0 => {
            text[..hash_pos].trim()
        }
        _ => text,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = strip_comment(line[eq_pos + 1..].trim());

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> Result<&str, ParseError> {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        Ok(&value[1..value.len() - 1])
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

/// Parse an integer value and check it against `range`
fn parse_int<T>(value: &str, range: core::ops::RangeInclusive<T>) -> Result<T, ParseError>
where
    T: core::str::FromStr + PartialOrd,
{
    let digits: String = value.chars().filter(|c| *c != '_').collect();
    let parsed: T = digits.parse().map_err(|_| ParseError::InvalidValue)?;
    if range.contains(&parsed) {
        Ok(parsed)
    } else {
        Err(ParseError::OutOfRange)
    }
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Lower-cased string value for case-insensitive choices
fn parse_choice(value: &str) -> Result<String, ParseError> {
    Ok(parse_string(value)?.to_ascii_lowercase())
}

fn parse_blank(value: &str) -> Result<BlankLevel, ParseError> {
    match parse_choice(value)?.as_str() {
        "black" => Ok(BlankLevel::Black),
        "white" => Ok(BlankLevel::White),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_disk_source(value: &str) -> Result<DiskSource, ParseError> {
    match parse_choice(value)?.as_str() {
        "flash" => Ok(DiskSource::Flash),
        "embedded" => Ok(DiskSource::Embedded),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Apply a key-value pair to the current section
fn apply_value(
    config: &mut BoardConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    match section {
        Section::Root => {}
        Section::Video => match key {
            "blank" => config.video.blank = parse_blank(value)?,
            "high_drive" => config.video.high_drive = parse_bool(value)?,
            _ => {}
        },
        Section::Input => match key {
            "pointer_clamp" => config.input.pointer_clamp = parse_int(value, POINTER_CLAMP_RANGE)?,
            "invert_y" => config.input.invert_y = parse_bool(value)?,
            "any_button" => config.input.any_button = parse_bool(value)?,
            _ => {}
        },
        Section::Bridge => match key {
            "baud" | "baud_rate" => config.bridge.baud = parse_int(value, BAUD_RANGE)?,
            "link_timeout_ms" => {
                config.bridge.link_timeout_ms = parse_int(value, LINK_TIMEOUT_RANGE_MS)?
            }
            _ => {}
        },
        Section::Emulator => match key {
            "vsync_period_us" => {
                config.emulator.vsync_period_us = parse_int(value, VSYNC_PERIOD_RANGE_US)?
            }
            "second_period_us" => {
                config.emulator.second_period_us = parse_int(value, SECOND_PERIOD_RANGE_US)?
            }
            _ => {}
        },
        Section::Disk => match key {
            "source" => config.disk.source = parse_disk_source(value)?,
            "read_only" => config.disk.read_only = parse_bool(value)?,
            _ => {}
        },
        Section::Status => match key {
            "blink_ms" => config.status.blink_ms = parse_int(value, BLINK_RANGE_MS)?,
            _ => {}
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("baud = 9600"), Some(("baud", "9600")));
        assert_eq!(
            parse_key_value("blank = \"white\" # border"),
            Some(("blank", "\"white\""))
        );
        assert_eq!(
            parse_key_value("name = \"a # b\""),
            Some(("name", "\"a # b\""))
        );
        assert_eq!(parse_key_value("baud ="), None);
        assert_eq!(parse_key_value("baud"), None);
    }

    #[test]
    fn test_parse_section_header() {
        assert_eq!(parse_section_header("video"), Ok(Section::Video));
        assert_eq!(parse_section_header(" disk "), Ok(Section::Disk));
        assert_eq!(parse_section_header("stepper spin"), Err(ParseError::InvalidSection));
    }

    #[test]
    fn test_parse_int_range() {
        assert_eq!(parse_int("1_000_000", BAUD_RANGE), Ok(1_000_000));
        assert_eq!(parse_int("0", POINTER_CLAMP_RANGE), Err(ParseError::OutOfRange));
        assert_eq!(parse_int("200", POINTER_CLAMP_RANGE), Err(ParseError::OutOfRange));
        // Too large for the field type at all
        assert_eq!(parse_int("300", POINTER_CLAMP_RANGE), Err(ParseError::InvalidValue));
        assert_eq!(parse_int("fast", BAUD_RANGE), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(parse_config(""), Ok(BoardConfig::default()));
        assert_eq!(parse_config("# nothing\n\n"), Ok(BoardConfig::default()));
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
[video]
blank = "White"
high_drive = false

[input]
pointer_clamp = 16
invert_y = false
any_button = true

[bridge]
baud = 1_000_000
link_timeout_ms = 5000

[emulator]
vsync_period_us = 16000
second_period_us = 1000000

[disk]
source = "flash"   # writable
read_only = true

[status]
blink_ms = 250
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.video.blank, BlankLevel::White);
        assert!(!config.video.high_drive);
        assert_eq!(config.input.pointer_clamp, 16);
        assert!(!config.input.invert_y);
        assert!(config.input.any_button);
        assert_eq!(config.bridge.baud, 1_000_000);
        assert_eq!(config.bridge.link_timeout_ms, 5000);
        assert_eq!(config.emulator.vsync_period_us, 16_000);
        assert_eq!(config.disk.source, DiskSource::Flash);
        assert!(config.disk.read_only);
        assert_eq!(config.status.blink_ms, 250);
    }

    #[test]
    fn test_unknown_key_ignored() {
        let config = parse_config("[input]\nscroll_speed = 3\n").unwrap();
        assert_eq!(config.input, BoardConfig::default().input);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_config("[joystick]\n"), Err(ParseError::InvalidSection));
        assert_eq!(parse_config("[video\n"), Err(ParseError::InvalidSection));
        assert_eq!(parse_config("[video]\nblank = grey\n"), Err(ParseError::InvalidValue));
        assert_eq!(parse_config("[video]\nhigh_drive = 1\n"), Err(ParseError::InvalidValue));
        assert_eq!(parse_config("[bridge]\nbaud = 300\n"), Err(ParseError::OutOfRange));
        assert_eq!(parse_config("[bridge]\nbaud\n"), Err(ParseError::InvalidLine));
    }
}
