// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BSP for the i.MX6 Solo/DualLite/Dual/Quad boards.
//!
//! These predate BOARD-CFG; NBoot passes `NbootArgs` in SDRAM. Board types
//! 0-7 are ours, 8-15 belong to i.MX6SX.

use super::{Bsp, Family, Generation};
use crate::board::BoardInfo;

pub struct Board;

/// Update and install sources, for builds with MMC and USB storage support.
const UPDATE_DEF: Option<&str> = Some("mmc,usb");
const INSTALL_DEF: Option<&str> = Some("ram@10300000,mmc,usb");

const fn board(name: &'static str) -> BoardInfo {
    BoardInfo {
        updatecheck: UPDATE_DEF,
        installcheck: INSTALL_DEF,
        recovercheck: UPDATE_DEF,
        ..BoardInfo::new(name)
    }
}

const TABLE: [BoardInfo; 5] = [
    BoardInfo {
        earlyusbinit: Some("1"),
        ..board("efusA9")
    },
    board("armStoneA9"),
    board("PicoMODA9"),
    board("QBlissA9"),
    board("armStoneA9r2"),
];

impl Bsp for Board {
    const FAMILY: Family = Family::Fsimx6;
    const GENERATION: Generation = Generation::Legacy;
    const BOARDS: &'static [BoardInfo] = &TABLE;
    const SDRAM_BASE: usize = 0x1000_0000;
    // UART1..UART5
    const UART_BASES: &'static [u32] = &[
        0x0202_0000,
        0x021E_8000,
        0x021E_C000,
        0x021F_0000,
        0x021F_4000,
    ];
}
