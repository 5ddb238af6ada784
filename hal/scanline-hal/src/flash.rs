//! Persistent key/value storage

/// Keys in the configuration partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Board configuration, postcard encoded
    BoardConfig = 0x10,
    /// Board configuration as TOML text
    BoardConfigToml = 0x11,
}

impl StorageKey {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x10 => Some(StorageKey::BoardConfig),
            0x11 => Some(StorageKey::BoardConfigToml),
            _ => None,
        }
    }
}

/// Errors from flash storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Low-level flash driver failure
    Flash,
    /// Storage layer failure
    Storage,
    NotFound,
    BufferTooSmall,
}

/// Read side of a wear-leveled key/value store
///
/// Values are small blobs (a config file at most), provisioned with the
/// flashing tools; large data such as disk images live in their own
/// partitions outside this store.
pub trait FlashStorage {
    /// Read a value into `buffer`, returning its length
    fn read(
        &mut self,
        key: StorageKey,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, FlashError>>;
}

#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        let slot = buffer
            .first_mut()
            .ok_or(sequential_storage::map::SerializationError::BufferTooSmall)?;
        *slot = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        let byte = buffer
            .first()
            .copied()
            .ok_or(sequential_storage::map::SerializationError::BufferTooSmall)?;
        StorageKey::from_u8(byte)
            .map(|key| (key, 1))
            .ok_or(sequential_storage::map::SerializationError::InvalidFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bytes() {
        for key in [StorageKey::BoardConfig, StorageKey::BoardConfigToml] {
            assert_eq!(StorageKey::from_u8(key.as_u8()), Some(key));
        }
        assert_eq!(StorageKey::from_u8(0), None);
    }

    /// A store that can only be read satisfies the trait
    struct ReadOnlyStore<'a> {
        toml: &'a [u8],
    }

    impl FlashStorage for ReadOnlyStore<'_> {
        async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
            let value = match key {
                StorageKey::BoardConfigToml => self.toml,
                StorageKey::BoardConfig => return Err(FlashError::NotFound),
            };
            let out = buffer
                .get_mut(..value.len())
                .ok_or(FlashError::BufferTooSmall)?;
            out.copy_from_slice(value);
            Ok(value.len())
        }
    }

    fn assert_storage<S: FlashStorage>(_: &S) {}

    #[test]
    fn test_read_only_store_is_storage() {
        let store = ReadOnlyStore { toml: b"[video]\n" };
        assert_storage(&store);
    }
}
