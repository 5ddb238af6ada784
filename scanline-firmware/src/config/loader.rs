//! Configuration persistence
//!
//! Loads the board configuration from the flash config partition.
//! The caller falls back to the embedded board.toml when nothing is stored.

use core::str;
use defmt::*;

use scanline_core::config::{BoardConfig, CONFIG_VERSION};
use scanline_hal_rp2040::flash::{FlashError, Rp2040FlashStorage, StorageKey};
use scanline_hal_rp2040::FlashStorageTrait;

use super::toml::{parse_config, ParseError};

/// Maximum serialized config size (binary)
const MAX_CONFIG_SIZE: usize = 256;

/// Maximum TOML config size
const MAX_TOML_SIZE: usize = 2048;

/// Configuration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(FlashError),
    /// Deserialization failed
    Deserialize,
    /// TOML parsing failed
    TomlParse(ParseError),
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// Config version mismatch
    VersionMismatch,
}

impl From<FlashError> for ConfigError {
    fn from(e: FlashError) -> Self {
        ConfigError::Flash(e)
    }
}

impl From<ParseError> for ConfigError {
    fn from(e: ParseError) -> Self {
        ConfigError::TomlParse(e)
    }
}

/// Configuration persistence manager
pub struct ConfigPersistence<'d> {
    storage: Rp2040FlashStorage<'d>,
}

impl<'d> ConfigPersistence<'d> {
    pub fn new(storage: Rp2040FlashStorage<'d>) -> Self {
        Self { storage }
    }

    /// Load configuration from flash
    ///
    /// Tries the TOML override first, then the binary postcard format.
    pub async fn load(&mut self) -> Result<BoardConfig, ConfigError> {
        info!("Loading configuration from flash...");

        match self.load_toml().await {
            Ok(config) => {
                info!("Loaded configuration from TOML");
                return Ok(config);
            }
            Err(ConfigError::Flash(FlashError::NotFound)) => {
                debug!("No TOML config found, trying binary format");
            }
            Err(e) => {
                warn!("Failed to load TOML config: {:?}, trying binary", e);
            }
        }

        self.load_binary().await
    }

    async fn load_toml(&mut self) -> Result<BoardConfig, ConfigError> {
        let mut buffer = [0u8; MAX_TOML_SIZE];
        let len = self
            .storage
            .read(StorageKey::BoardConfigToml, &mut buffer)
            .await?;

        debug!("Read {} bytes of TOML from flash", len);

        let toml_str = str::from_utf8(&buffer[..len]).map_err(|_| ConfigError::InvalidUtf8)?;
        let config = parse_config(toml_str)?;

        log_config_summary(&config);
        Ok(config)
    }

    async fn load_binary(&mut self) -> Result<BoardConfig, ConfigError> {
        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = self
            .storage
            .read(StorageKey::BoardConfig, &mut buffer)
            .await?;

        debug!("Read {} bytes of binary config from flash", len);

        let config: BoardConfig =
            postcard::from_bytes(&buffer[..len]).map_err(|_| ConfigError::Deserialize)?;

        if config.version != CONFIG_VERSION {
            warn!(
                "Config version mismatch: found {}, expected {}",
                config.version, CONFIG_VERSION
            );
            return Err(ConfigError::VersionMismatch);
        }

        log_config_summary(&config);
        Ok(config)
    }
}

/// Log a summary of the loaded configuration
pub fn log_config_summary(config: &BoardConfig) {
    debug!("  video: {:?}", config.video);
    debug!("  input: {:?}", config.input);
    debug!(
        "  bridge: {} baud, link timeout {} ms",
        config.bridge.baud, config.bridge.link_timeout_ms
    );
    debug!(
        "  emulator: vsync {} us, second {} us",
        config.emulator.vsync_period_us, config.emulator.second_period_us
    );
    debug!("  disk: {:?}", config.disk);
    debug!("  status: blink {} ms", config.status.blink_ms);
}
