//! Disk image storage collaborator

/// Errors surfaced by a disk backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiskError {
    /// Access extends past the end of the image
    OutOfRange,
    /// Write attempted on a read-only image
    ReadOnly,
    /// Underlying storage reported a failure
    Io,
}

impl DiskError {
    /// Status code handed back across the emulator boundary
    pub fn as_status(self) -> i32 {
        -1
    }
}

/// Byte-range access to a writable disk image
pub trait DiskBackend {
    /// Image size in bytes
    fn size(&self) -> usize;

    fn read_only(&self) -> bool;

    /// Fill `data` from the image starting at `offset`
    fn read(&mut self, offset: usize, data: &mut [u8]) -> Result<(), DiskError>;

    /// Write `data` into the image starting at `offset`
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), DiskError>;

    /// Check that `len` bytes at `offset` lie inside the image
    fn check_range(&self, offset: usize, len: usize) -> Result<(), DiskError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.size() => Ok(()),
            _ => Err(DiskError::OutOfRange),
        }
    }
}

/// One drive handed to the emulator at init
pub enum DiskDescriptor<'a> {
    /// Read-only image mapped in memory
    Image(&'a [u8]),
    /// Image behind a byte-range backend
    Backend(&'a mut dyn DiskBackend),
}

impl<'a> DiskDescriptor<'a> {
    pub fn size(&self) -> usize {
        match self {
            DiskDescriptor::Image(data) => data.len(),
            DiskDescriptor::Backend(backend) => backend.size(),
        }
    }

    pub fn read_only(&self) -> bool {
        match self {
            DiskDescriptor::Image(_) => true,
            DiskDescriptor::Backend(backend) => backend.read_only(),
        }
    }
}
