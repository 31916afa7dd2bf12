//! Finding the NBoot arguments before and after relocation.
//!
//! U-Boot starts out running from wherever it was loaded, with its data
//! section not yet usable. At some point the startup code relocates us to the
//! top of RAM and clears a fresh data section. Our private copy of the NBoot
//! arguments lives in that section, so there is a window where it exists but
//! is all zeroes, and another before that where it doesn't exist at all.
//! "Relocated" and "copied" are two different events, and depending on the
//! platform they happen in either order.
//!
//! During both windows the only valid arguments are NBoot's originals at the
//! fixed address, which is what callers pass in as `raw`.

use core::cell::UnsafeCell;
use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::args::{ArgsRegion, NbootArgs};
use crate::Error;

/// Our copy of the NBoot arguments, plus the state needed to know whether it
/// can be used yet.
///
/// This is meant to live in a `static`:
///
/// ```
/// # use fshandoff::reloc::ArgsCache;
/// static NBOOT_ARGS: ArgsCache = ArgsCache::new();
/// ```
pub struct ArgsCache {
    /// Set by the platform startup code once we run from our final address.
    relocated: AtomicBool,
    /// One-shot guard for `fill`.
    taken: AtomicBool,
    /// Set once `region` holds a complete copy.
    copied: AtomicBool,
    /// NAND health bits gathered during this boot.
    ecc_state: AtomicU8,
    region: UnsafeCell<ArgsRegion>,
}

// Safety: `region` is written exactly once, by whoever wins the swap on
// `taken`, and only handed out after that write has been published through
// `copied` (or, in the canary path, under the caller's promise in `region`).
unsafe impl Sync for ArgsCache {}

impl ArgsCache {
    pub const fn new() -> Self {
        Self {
            relocated: AtomicBool::new(false),
            taken: AtomicBool::new(false),
            copied: AtomicBool::new(false),
            ecc_state: AtomicU8::new(0),
            region: UnsafeCell::new(ArgsRegion::ZEROED),
        }
    }

    /// Records that relocation is complete. Called by startup code, after the
    /// new data section has been cleared.
    pub fn mark_relocated(&self) {
        self.relocated.store(true, Ordering::Release);
    }

    pub fn is_relocated(&self) -> bool {
        self.relocated.load(Ordering::Acquire)
    }

    /// Copies NBoot's arguments in. Works exactly once per boot; a second call
    /// fails and leaves the first copy alone.
    pub fn fill(&self, raw: &ArgsRegion) -> Result<(), Error> {
        if self.taken.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyInitialized);
        }

        // Safety: winning the swap above makes us the only writer, and nobody
        // hands out references into `region` until `copied` is set or the
        // canary becomes non-zero, which is this write.
        unsafe {
            let region = &mut *self.region.get();
            *region = *raw;
            region.fix_sizes();
        }
        self.copied.store(true, Ordering::Release);
        log::debug!(
            "nboot args copied: board type {}, rev {}",
            raw.args.board_type,
            raw.args.board_rev(),
        );
        Ok(())
    }

    /// Picks between our copy and `raw` the way U-Boot always has: once
    /// relocated, a non-zero debug port address in our copy means the copy is
    /// valid.
    ///
    /// This misfires on a board whose debug port address is legitimately zero.
    /// Such a board keeps reading `raw` forever, which is harmless as long as
    /// `raw` is still intact. `region_checked` doesn't have this problem.
    ///
    /// # Safety
    ///
    /// `fill` must not be running concurrently with this call.
    pub unsafe fn region<'a>(&'a self, raw: &'a ArgsRegion) -> &'a ArgsRegion {
        if !self.is_relocated() {
            return raw;
        }
        let copy = self.region.get();
        let canary = ptr::read_volatile(ptr::addr_of!((*copy).args.dbg_ser_port_pa));
        if canary == 0 {
            raw
        } else {
            &*copy
        }
    }

    /// # Safety
    ///
    /// As for `region`.
    pub unsafe fn args<'a>(&'a self, raw: &'a ArgsRegion) -> &'a NbootArgs {
        &self.region(raw).args
    }

    /// Picks between our copy and `raw` based on whether we have relocated and
    /// `fill` has completed. Until both, `raw` is the only valid answer.
    pub fn region_checked<'a>(&'a self, raw: &'a ArgsRegion) -> &'a ArgsRegion {
        if self.is_relocated() && self.copied.load(Ordering::Acquire) {
            // Safety: `copied` is only set after the one and only write.
            unsafe { &*self.region.get() }
        } else {
            raw
        }
    }

    pub fn args_checked<'a>(&'a self, raw: &'a ArgsRegion) -> &'a NbootArgs {
        &self.region_checked(raw).args
    }

    /// ORs `bits` into the NAND health state we pass on.
    pub fn merge_ecc_state(&self, bits: u8) {
        self.ecc_state.fetch_or(bits, Ordering::Relaxed);
    }

    /// Health bits from NBoot plus everything merged during this boot.
    pub fn ecc_state(&self, raw: &ArgsRegion) -> u8 {
        self.args_checked(raw).ecc_state | self.ecc_state.load(Ordering::Relaxed)
    }
}

impl Default for ArgsCache {
    fn default() -> Self {
        Self::new()
    }
}
