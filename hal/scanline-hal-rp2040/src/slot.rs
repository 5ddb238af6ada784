//! Interrupt-owned state slot
//!
//! Thread code installs a `'static` value once; from then on only the
//! interrupt handler that owns the slot touches it. The handler gets at the
//! value with a single atomic load, no critical section and no borrow
//! flag, so nothing on its path has to be fetched from flash.

use core::ptr;

use portable_atomic::{AtomicPtr, Ordering};

pub struct IsrSlot<T> {
    ptr: AtomicPtr<T>,
}

impl<T> IsrSlot<T> {
    pub const fn new() -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Hand `value` to the interrupt side
    ///
    /// Returns false, leaving the slot unchanged, if it was already filled.
    pub fn install(&self, value: &'static mut T) -> bool {
        self.ptr
            .compare_exchange(ptr::null_mut(), value, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_installed(&self) -> bool {
        !self.ptr.load(Ordering::Acquire).is_null()
    }

    /// The installed value, if any
    ///
    /// # Safety
    ///
    /// Only one context may call this for a given slot, and it must not
    /// hold two returned references at once. The owning interrupt handler
    /// satisfies both: it does not re-enter itself.
    #[inline(always)]
    pub unsafe fn get(&self) -> Option<&mut T> {
        // SAFETY: non-null pointers come from a `&'static mut` given up in
        // `install`; exclusivity is the caller's contract.
        unsafe { self.ptr.load(Ordering::Acquire).as_mut() }
    }
}

impl<T> Default for IsrSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
