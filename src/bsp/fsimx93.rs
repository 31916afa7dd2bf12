// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BSP for the i.MX93 boards.
//!
//! The OSM module and the PicoCore share one SPL and one set of BOARD-CFGs.

use super::{Bsp, Family, Generation};
use crate::board::BoardInfo;

pub struct Board;

const fn board(name: &'static str) -> BoardInfo {
    BoardInfo {
        updatecheck: Some("mmc,usb"),
        installcheck: Some("ram@83800000,mmc,usb"),
        recovercheck: Some("mmc,usb"),
        // eMMC only, no NAND on any of these.
        mtdparts: None,
        rootfs: Some(".rootfs_mmc"),
        kernel: Some(".kernel_mmc"),
        fdt: Some(".fdt_mmc"),
        ..BoardInfo::new(name)
    }
}

const TABLE: [BoardInfo; 2] = [board("FS-OSM-SF-MX93"), board("PicoCoreMX93")];

impl Bsp for Board {
    const FAMILY: Family = Family::Fsimx93;
    const GENERATION: Generation = Generation::BoardCfg;
    const BOARDS: &'static [BoardInfo] = &TABLE;
    const SDRAM_BASE: usize = 0x8000_0000;
    const CFG_INFO_ADDR: usize = 0x204D_A000;
}
