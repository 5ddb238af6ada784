//! Flash storage for RP2040
//!
//! The 2 MiB flash is split into three regions:
//!
//! ```text
//! 0x000000 ┌───────────────────────────┐
//!          │ firmware + embedded images│
//! 0x100000 ├───────────────────────────┤
//!          │ disk partition (960 KiB)  │  header sector + image
//! 0x1F0000 ├───────────────────────────┤
//!          │ config (64 KiB)           │  sequential-storage map
//! 0x200000 └───────────────────────────┘
//! ```

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Blocking, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use scanline_core::traits::{DiskBackend, DiskError};
use sequential_storage::cache::NoCache;
use sequential_storage::map;

pub use scanline_hal::flash::{FlashError, StorageKey};

pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

pub const CONFIG_PARTITION_SIZE: usize = 64 * 1024;
pub const CONFIG_PARTITION_START: usize = FLASH_SIZE - CONFIG_PARTITION_SIZE;
pub const CONFIG_RANGE: core::ops::Range<u32> =
    (CONFIG_PARTITION_START as u32)..(FLASH_SIZE as u32);

pub const DISK_PARTITION_START: usize = 1024 * 1024;
pub const DISK_PARTITION_SIZE: usize = CONFIG_PARTITION_START - DISK_PARTITION_START;

/// Largest value stored in the config map
pub const MAX_VALUE_SIZE: usize = 2048;

/// Magic at the start of the disk header sector
pub const DISK_MAGIC: [u8; 4] = *b"SCDK";

/// Image bytes start one sector into the partition
const DISK_DATA_START: usize = DISK_PARTITION_START + ERASE_SIZE;

/// Largest image the partition can hold
pub const DISK_MAX_IMAGE: usize = DISK_PARTITION_SIZE - ERASE_SIZE;

/// Image size from a disk header sector prefix
///
/// The header is the magic followed by the image size as a little-endian
/// u32. Returns `None` for an erased, foreign or oversized header.
pub fn parse_disk_header(header: &[u8; 8]) -> Option<usize> {
    if header[..4] != DISK_MAGIC {
        return None;
    }
    let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
    (size > 0 && size <= DISK_MAX_IMAGE).then_some(size)
}

/// Config key/value storage
///
/// Wear-leveled through sequential-storage in the last 64 KiB of flash.
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
}

impl<'d> Rp2040FlashStorage<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }

    async fn fetch<'b>(
        &mut self,
        key: StorageKey,
        scratch: &'b mut [u8; MAX_VALUE_SIZE],
    ) -> Result<Option<&'b [u8]>, FlashError> {
        map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            CONFIG_RANGE,
            &mut NoCache::new(),
            scratch,
            &key,
        )
        .await
        .map_err(|_| FlashError::Storage)
    }
}

impl<'d> scanline_hal::FlashStorage for Rp2040FlashStorage<'d> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let mut scratch = [0u8; MAX_VALUE_SIZE];
        let data = self.fetch(key, &mut scratch).await?.ok_or(FlashError::NotFound)?;
        let out = buffer
            .get_mut(..data.len())
            .ok_or(FlashError::BufferTooSmall)?;
        out.copy_from_slice(data);
        Ok(data.len())
    }
}

/// Emulator disk image in the flash disk partition
///
/// Writes are read-modify-write of whole erase sectors. Flash programming
/// stalls XIP, so every write also stalls video for the duration.
pub struct FlashDisk<'d> {
    flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>,
    size: usize,
    read_only: bool,
    sector: [u8; ERASE_SIZE],
}

impl<'d> FlashDisk<'d> {
    /// Open the partition, or `None` if it holds no image
    pub fn open(flash: Peri<'d, FLASH>, read_only: bool) -> Option<Self> {
        let mut flash = Flash::new_blocking(flash);
        let mut header = [0u8; 8];
        flash
            .blocking_read(DISK_PARTITION_START as u32, &mut header)
            .ok()?;
        let size = parse_disk_header(&header)?;
        Some(Self {
            flash,
            size,
            read_only,
            sector: [0; ERASE_SIZE],
        })
    }

    fn write_sector_part(
        &mut self,
        sector_start: usize,
        at: usize,
        data: &[u8],
    ) -> Result<(), DiskError> {
        let base = (DISK_DATA_START + sector_start) as u32;
        self.flash
            .blocking_read(base, &mut self.sector)
            .map_err(|_| DiskError::Io)?;
        self.sector[at..at + data.len()].copy_from_slice(data);
        self.flash
            .blocking_erase(base, base + ERASE_SIZE as u32)
            .map_err(|_| DiskError::Io)?;
        self.flash
            .blocking_write(base, &self.sector)
            .map_err(|_| DiskError::Io)
    }
}

impl<'d> DiskBackend for FlashDisk<'d> {
    fn size(&self) -> usize {
        self.size
    }

    fn read_only(&self) -> bool {
        self.read_only
    }

    fn read(&mut self, offset: usize, data: &mut [u8]) -> Result<(), DiskError> {
        self.check_range(offset, data.len())?;
        self.flash
            .blocking_read((DISK_DATA_START + offset) as u32, data)
            .map_err(|_| DiskError::Io)
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), DiskError> {
        if self.read_only {
            return Err(DiskError::ReadOnly);
        }
        self.check_range(offset, data.len())?;

        let mut done = 0;
        while done < data.len() {
            let pos = offset + done;
            let sector_start = pos - pos % ERASE_SIZE;
            let at = pos - sector_start;
            let n = (ERASE_SIZE - at).min(data.len() - done);
            self.write_sector_part(sector_start, at, &data[done..done + n])?;
            done += n;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partitions_do_not_overlap() {
        assert!(DISK_PARTITION_START + DISK_PARTITION_SIZE <= CONFIG_PARTITION_START);
        assert_eq!(DISK_PARTITION_START % ERASE_SIZE, 0);
        assert_eq!(CONFIG_PARTITION_START % ERASE_SIZE, 0);
    }

    #[test]
    fn test_disk_header() {
        let mut header = [0u8; 8];
        header[..4].copy_from_slice(&DISK_MAGIC);
        header[4..].copy_from_slice(&(800 * 1024u32).to_le_bytes());
        assert_eq!(parse_disk_header(&header), Some(800 * 1024));

        assert_eq!(parse_disk_header(&[0xFF; 8]), None);

        header[4..].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(parse_disk_header(&header), None);
    }
}
