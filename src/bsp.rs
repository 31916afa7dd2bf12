// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Types and hooks for describing a board family.
//!
//! A family is one SoC line with one board support package: one table of
//! boards, one descriptor format, one memory map. The handoff code only needs
//! a few facts about it, described by the `Bsp` trait below.
//!
//! To add a family:
//!
//! 1. Create a module within `bsp` named after the family.
//! 2. Define a type in the module called `Board`. This type will never be
//!    instantiated, so it can be arbitrary; an empty struct is easy.
//! 3. Implement `bsp::Bsp` for your `Board` type.
//! 4. Add a variant to `Family` and route it to your `Board`.
//! 5. Add a `target-board-*` feature to `Cargo.toml` and a branch to the
//!    `cfg_if` below.

// Note that these modules are not conditionally included. We always compile
// every BSP because we can get away with that (they're plain tables), and
// the host tool wants to decode dumps from any family.
pub mod fsimx6;
pub mod fsimx6sx;
pub mod fsimx8mm;
pub mod fsimx8ulp;
pub mod fsimx93;

use crate::board::{self, BoardId, BoardInfo};
use crate::bootdev::{self, BootDevice};

cfg_if::cfg_if! {
    if #[cfg(feature = "target-board-fsimx6")] {
        pub type Current = fsimx6::Board;
    } else if #[cfg(feature = "target-board-fsimx6sx")] {
        pub type Current = fsimx6sx::Board;
    } else if #[cfg(feature = "target-board-fsimx8mm")] {
        pub type Current = fsimx8mm::Board;
    } else if #[cfg(feature = "target-board-fsimx8ulp")] {
        pub type Current = fsimx8ulp::Board;
    } else if #[cfg(feature = "target-board-fsimx93")] {
        pub type Current = fsimx93::Board;
    } else {
        compile_error!("no target-board-* feature enabled");
    }
}

/// How the prior stage describes the hardware.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Generation {
    /// A fixed `NbootArgs` block in SDRAM.
    Legacy,
    /// A `CfgInfo` in OCRAM, condensed from a BOARD-CFG image.
    BoardCfg,
}

/// Requirements placed upon a BSP type.
pub trait Bsp {
    const FAMILY: Family;
    const GENERATION: Generation;

    /// Boards of this family, indexed by zero-based board type.
    const BOARDS: &'static [BoardInfo];

    /// Raw board type of the first entry in `BOARDS`. Families that share
    /// NBoot's board numbering with another family start further up.
    const BOARD_OFFSET: u8 = 0;

    const SDRAM_BASE: usize;

    /// Where the SPL leaves its `CfgInfo`. Only meaningful for BOARD-CFG
    /// families.
    const CFG_INFO_ADDR: usize = 0;

    /// Physical base addresses of the UARTs, port 0 first. BOARD-CFG families
    /// take their console from the device tree and leave this empty.
    const UART_BASES: &'static [u32] = &[];

    /// Console port to use when NBoot's debug port is not in `UART_BASES`.
    const DEFAULT_UART_PORT: u32 = 0;

    /// Whether legacy builds keep the environment in eMMC rather than NAND.
    /// This is as close as these boards get to knowing their boot device.
    const ENV_IN_MMC: bool = false;
}

/// The board families we support.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Family {
    Fsimx6,
    Fsimx6sx,
    Fsimx8mm,
    Fsimx8ulp,
    Fsimx93,
}

/// Expands to `$e` with `$B` bound to the `Board` type of `$family`.
macro_rules! with_bsp {
    ($family:expr, $B:ident => $e:expr) => {
        match $family {
            Family::Fsimx6 => {
                type $B = fsimx6::Board;
                $e
            }
            Family::Fsimx6sx => {
                type $B = fsimx6sx::Board;
                $e
            }
            Family::Fsimx8mm => {
                type $B = fsimx8mm::Board;
                $e
            }
            Family::Fsimx8ulp => {
                type $B = fsimx8ulp::Board;
                $e
            }
            Family::Fsimx93 => {
                type $B = fsimx93::Board;
                $e
            }
        }
    };
}

impl Family {
    pub const ALL: [Self; 5] = [
        Self::Fsimx6,
        Self::Fsimx6sx,
        Self::Fsimx8mm,
        Self::Fsimx8ulp,
        Self::Fsimx93,
    ];

    /// The family this build was configured for.
    pub const fn current() -> Self {
        <Current as Bsp>::FAMILY
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Fsimx6 => "fsimx6",
            Self::Fsimx6sx => "fsimx6sx",
            Self::Fsimx8mm => "fsimx8mm",
            Self::Fsimx8ulp => "fsimx8ulp",
            Self::Fsimx93 => "fsimx93",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn generation(self) -> Generation {
        with_bsp!(self, B => B::GENERATION)
    }

    pub fn boards(self) -> &'static [BoardInfo] {
        with_bsp!(self, B => B::BOARDS)
    }

    pub fn board_offset(self) -> u8 {
        with_bsp!(self, B => B::BOARD_OFFSET)
    }

    pub fn sdram_base(self) -> usize {
        with_bsp!(self, B => B::SDRAM_BASE)
    }

    pub fn cfg_info_addr(self) -> usize {
        with_bsp!(self, B => B::CFG_INFO_ADDR)
    }

    /// Removes the family's numbering offset from a raw board type. Types
    /// below the offset wrap around to large indices, which `board` resolves
    /// to the unknown entry.
    pub fn normalize_board_type(self, raw: u8) -> u8 {
        raw.wrapping_sub(self.board_offset())
    }

    /// Resolves a raw board type, as NBoot reports it, to a table entry.
    pub fn board(self, raw: u8) -> BoardId {
        board::lookup(self.boards(), self.normalize_board_type(raw))
    }

    /// Console port for NBoot's debug UART at physical address `pa`.
    pub fn debug_port(self, pa: u32) -> u32 {
        with_bsp!(self, B => board::debug_port(pa, B::UART_BASES, B::DEFAULT_UART_PORT))
    }

    /// The boot device a legacy build assumes.
    pub fn legacy_boot_dev(self) -> BootDevice {
        with_bsp!(self, B => bootdev::legacy(B::ENV_IN_MMC))
    }
}
