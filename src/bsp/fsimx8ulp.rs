// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BSP for the PicoCoreMX8ULP.

use super::{Bsp, Family, Generation};
use crate::board::{BoardFlags, BoardInfo};

pub struct Board;

const TABLE: [BoardInfo; 1] = [BoardInfo {
    updatecheck: Some("mmc,usb"),
    installcheck: Some("ram@83800000,mmc,usb"),
    recovercheck: Some("mmc,usb"),
    flags: BoardFlags::UBI_ONLY,
    ..BoardInfo::new("PicoCoreMX8ULP")
}];

impl Bsp for Board {
    const FAMILY: Family = Family::Fsimx8ulp;
    const GENERATION: Generation = Generation::BoardCfg;
    const BOARDS: &'static [BoardInfo] = &TABLE;
    const SDRAM_BASE: usize = 0x8000_0000;
    const CFG_INFO_ADDR: usize = 0x2203_A000;
}
