// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BSP for the PicoCoreMX8MM family.
//!
//! The SPL reads the board name out of the BOARD-CFG and matches it against
//! `BOARDS` to get the board type, so the order here is the numbering.

use super::{Bsp, Family, Generation};
use crate::board::{BoardFlags, BoardInfo};

pub struct Board;

const fn board(name: &'static str) -> BoardInfo {
    BoardInfo {
        updatecheck: Some("mmc,usb"),
        installcheck: Some("ram@43800000,mmc,usb"),
        recovercheck: Some("mmc,usb"),
        flags: BoardFlags::UBI_ONLY,
        ..BoardInfo::new(name)
    }
}

const TABLE: [BoardInfo; 2] = [
    board("PicoCoreMX8MM"),
    // eMMC-only variant.
    BoardInfo {
        flags: BoardFlags::empty(),
        ..board("PicoCoreMX8MX")
    },
];

impl Bsp for Board {
    const FAMILY: Family = Family::Fsimx8mm;
    const GENERATION: Generation = Generation::BoardCfg;
    const BOARDS: &'static [BoardInfo] = &TABLE;
    const SDRAM_BASE: usize = 0x4000_0000;
    // Start of the SPL's BSS, right after the BOARD-CFG copy in OCRAM.
    const CFG_INFO_ADDR: usize = 0x0091_A000;
}
