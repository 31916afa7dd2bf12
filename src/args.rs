//! The legacy NBoot argument block.
//!
//! Older boards (i.MX6, i.MX6SX) get their hardware description from NBoot as
//! a fixed `#[repr(C)]` struct deposited at a known offset into SDRAM, followed
//! immediately by a second block describing the auxiliary Cortex-M core. NBoot
//! writes it before we run; we copy it out once and never trust its size
//! field.

use core::fmt;
use core::mem::size_of;

use bitflags::bitflags;
use static_assertions::const_assert_eq;
use zerocopy::{AsBytes, FromBytes};

use crate::board::BoardRev;
use crate::Error;

/// Offset of the NBoot arguments from the start of SDRAM.
pub const NBOOT_ARGS_OFFSET: usize = 0x1000;

/// Offset of the ATAG boot parameters we hand to a non-device-tree kernel.
pub const BOOT_PARAMS_OFFSET: usize = 0x100;

/// Where NBoot leaves its arguments on a board whose SDRAM starts at
/// `sdram_base`.
pub const fn nboot_args_addr(sdram_base: usize) -> usize {
    sdram_base + NBOOT_ARGS_OFFSET
}

pub const fn boot_params_addr(sdram_base: usize) -> usize {
    sdram_base + BOOT_PARAMS_OFFSET
}

bitflags! {
    /// Requests from NBoot in `NbootArgs::action`.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Action: u32 {
        /// NBoot measured the button hold time and wants recovery, not
        /// update.
        const RECOVER = 0x0000_0040;
    }

    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Features1: u8 {
        const SECOND_CAN = 1 << 1;
        const SECOND_LAN = 1 << 4;
    }

    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Features2: u8 {
        const CORTEX_M4 = 1 << 0;
    }
}

/// Hardware description as written by NBoot. All multi-byte fields are
/// little-endian, which is native on every board that uses this format.
#[derive(Copy, Clone, Debug, Eq, PartialEq, AsBytes, FromBytes)]
#[repr(C)]
pub struct NbootArgs {
    pub id: [u8; 4],
    pub size: u32,
    /// Four ASCII characters, not NUL-terminated.
    pub nboot_ver: [u8; 4],
    /// DRAM size in MiB.
    pub mem_size: u32,
    /// NAND size in MiB.
    pub flash_size: u32,
    /// Physical address of the debug UART.
    ///
    /// This is never zero on a real board, which is what the relocation
    /// logic in `reloc` leans on.
    pub dbg_ser_port_pa: u32,
    pub num_dram: u32,
    pub action: u32,
    _reserved: [u32; 4],
    /// Raw board type. Some families share numbering and need a family offset
    /// subtracted; see `Family::board`.
    pub board_type: u8,
    /// `major * 100 + minor`.
    pub board_rev: u8,
    pub features1: u8,
    pub features2: u8,
    pub ecc_type: u8,
    /// NAND health, accumulated by us and passed on to Linux.
    pub ecc_state: u8,
    _reserved8: [u8; 2],
    _reserved2: [u32; 2],
}

const_assert_eq!(size_of::<NbootArgs>(), 64);

impl NbootArgs {
    /// All-zero arguments, which is what a freshly cleared `.bss` copy looks
    /// like.
    pub const ZEROED: Self = Self {
        id: [0; 4],
        size: 0,
        nboot_ver: [0; 4],
        mem_size: 0,
        flash_size: 0,
        dbg_ser_port_pa: 0,
        num_dram: 0,
        action: 0,
        _reserved: [0; 4],
        board_type: 0,
        board_rev: 0,
        features1: 0,
        features2: 0,
        ecc_type: 0,
        ecc_state: 0,
        _reserved8: [0; 2],
        _reserved2: [0; 2],
    };

    pub fn action(&self) -> Action {
        Action::from_bits_retain(self.action)
    }

    pub fn recover_requested(&self) -> bool {
        self.action().contains(Action::RECOVER)
    }

    pub fn features1(&self) -> Features1 {
        Features1::from_bits_retain(self.features1)
    }

    pub fn features2(&self) -> Features2 {
        Features2::from_bits_retain(self.features2)
    }

    /// Both feature bytes folded into one word, `features1` in the low byte.
    /// This is the shape the BOARD-CFG format uses.
    pub fn features(&self) -> u32 {
        u32::from(self.features1) | u32::from(self.features2) << 8
    }

    pub fn board_rev(&self) -> BoardRev {
        BoardRev(u32::from(self.board_rev))
    }

    pub fn nboot_version(&self) -> NbootVersion {
        NbootVersion(self.nboot_ver)
    }

    /// RAM size in bytes.
    pub fn ram_size(&self) -> u64 {
        u64::from(self.mem_size) << 20
    }
}

/// Arguments for the auxiliary Cortex-M core. We don't interpret these, only
/// carry them across.
#[derive(Copy, Clone, Debug, Eq, PartialEq, AsBytes, FromBytes)]
#[repr(C)]
pub struct M4Args {
    pub id: [u8; 4],
    pub size: u32,
    pub mem_base: u32,
    pub mem_size: u32,
    _reserved: [u32; 4],
}

const_assert_eq!(size_of::<M4Args>(), 32);

impl M4Args {
    pub const ZEROED: Self = Self {
        id: [0; 4],
        size: 0,
        mem_base: 0,
        mem_size: 0,
        _reserved: [0; 4],
    };
}

/// The full block NBoot leaves behind: arguments, then M4 arguments.
#[derive(Copy, Clone, Debug, Eq, PartialEq, AsBytes, FromBytes)]
#[repr(C)]
pub struct ArgsRegion {
    pub args: NbootArgs,
    pub m4: M4Args,
}

const_assert_eq!(size_of::<ArgsRegion>(), 96);

impl ArgsRegion {
    pub const ZEROED: Self = Self {
        args: NbootArgs::ZEROED,
        m4: M4Args::ZEROED,
    };

    /// Copies the region out of `bytes`.
    ///
    /// The size fields are overwritten with the sizes this build was compiled
    /// with. NBoot's idea of the size is not trusted, and whatever comes after
    /// us reads these fields to learn the layout.
    pub fn copy_from(bytes: &[u8]) -> Result<Self, Error> {
        let mut region = Self::read_from_prefix(bytes).ok_or(Error::Truncated {
            needed: size_of::<Self>(),
            available: bytes.len(),
        })?;
        region.fix_sizes();
        Ok(region)
    }

    pub(crate) fn fix_sizes(&mut self) {
        self.args.size = size_of::<NbootArgs>() as u32;
        self.m4.size = size_of::<M4Args>() as u32;
    }

    /// Views the region NBoot left at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must be 4-byte aligned and point at readable memory of at least
    /// `size_of::<ArgsRegion>()` bytes that nobody writes for `'static`. On the
    /// boards this is SDRAM below the load address, which NBoot filled and
    /// nobody touches again.
    pub unsafe fn at(addr: usize) -> &'static Self {
        &*(addr as *const Self)
    }
}

/// NBoot's version tag, e.g. `VN43`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NbootVersion(pub [u8; 4]);

impl NbootVersion {
    /// The tag as text, stopping at the first NUL. Non-ASCII garbage comes
    /// back empty rather than failing.
    pub fn as_str(&self) -> &str {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(self.0.len());
        match core::str::from_utf8(&self.0[..len]) {
            Ok(s) if s.is_ascii() => s,
            _ => "",
        }
    }
}

impl fmt::Display for NbootVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hex_literal::hex;

    /// A dump as NBoot would leave it on an armStoneA9, with a bogus size
    /// field and the recover bit set.
    pub(crate) const DUMP: [u8; 96] = hex!(
        "4e424f4f efbeadde 564e3433 00020000"
        "00010000 00000202 02000000 40000000"
        "00000000 00000000 00000000 00000000"
        "01781201 08000000 00000000 00000000"
        "4d344152 00000000 00000080 00001000"
        "00000000 00000000 00000000 00000000"
    );

    #[test]
    fn field_offsets() {
        let region = ArgsRegion::copy_from(&DUMP).unwrap();
        let args = &region.args;

        assert_eq!(&args.id, b"NBOO");
        assert_eq!(args.mem_size, 512);
        assert_eq!(args.flash_size, 256);
        assert_eq!(args.dbg_ser_port_pa, 0x0202_0000);
        assert_eq!(args.num_dram, 2);
        assert_eq!(args.board_type, 1);
        assert_eq!(args.board_rev, 120);
        assert_eq!(args.features1(), Features1::SECOND_CAN | Features1::SECOND_LAN);
        assert_eq!(args.features2(), Features2::CORTEX_M4);
        assert_eq!(args.ecc_type, 8);
        assert_eq!(args.ecc_state, 0);
        assert_eq!(region.m4.mem_base, 0x8000_0000);
        assert_eq!(region.m4.mem_size, 0x0010_0000);
    }

    #[test]
    fn sizes_are_overwritten() {
        let region = ArgsRegion::copy_from(&DUMP).unwrap();
        assert_eq!(region.args.size, 64);
        assert_eq!(region.m4.size, 32);
    }

    #[test]
    fn truncated_input() {
        assert_eq!(
            ArgsRegion::copy_from(&DUMP[..80]),
            Err(Error::Truncated { needed: 96, available: 80 })
        );
    }

    #[test]
    fn version_and_action() {
        let region = ArgsRegion::copy_from(&DUMP).unwrap();
        assert_eq!(region.args.nboot_version().as_str(), "VN43");
        assert!(region.args.recover_requested());
        assert_eq!(region.args.features(), 0x0112);
        assert_eq!(region.args.ram_size(), 512 << 20);
    }

    #[test]
    fn short_and_garbage_versions() {
        assert_eq!(NbootVersion(*b"V1\0\0").as_str(), "V1");
        assert_eq!(NbootVersion([0xff, 0xfe, 0, 0]).as_str(), "");
    }

    #[test]
    fn addresses() {
        assert_eq!(nboot_args_addr(0x1000_0000), 0x1000_1000);
        assert_eq!(boot_params_addr(0x1000_0000), 0x1000_0100);
    }
}
