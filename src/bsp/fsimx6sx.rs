// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BSP for the i.MX6SoloX boards.
//!
//! NBoot numbers these after the i.MX6 boards, so the first one shows up as
//! board type 8. The handoff record we pass on carries the normalized type.

use super::{Bsp, Family, Generation};
use crate::board::BoardInfo;

pub struct Board;

const UPDATE_DEF: Option<&str> = Some("mmc,usb");

const TABLE: [BoardInfo; 1] = [BoardInfo {
    updatecheck: UPDATE_DEF,
    installcheck: UPDATE_DEF,
    recovercheck: UPDATE_DEF,
    earlyusbinit: Some("1"),
    fsload: Some(".fsload_fat"),
    ..BoardInfo::new("efusA9X")
}];

impl Bsp for Board {
    const FAMILY: Family = Family::Fsimx6sx;
    const GENERATION: Generation = Generation::Legacy;
    const BOARDS: &'static [BoardInfo] = &TABLE;
    const BOARD_OFFSET: u8 = 8;
    const SDRAM_BASE: usize = 0x8000_0000;
    // UART1..UART6
    const UART_BASES: &'static [u32] = &[
        0x0202_0000,
        0x021E_8000,
        0x021E_C000,
        0x021F_0000,
        0x021F_4000,
        0x022A_0000,
    ];
}
