//! One view of the hardware, whichever way the prior stage described it.
//!
//! Decoding happens once, at board init. The result is an immutable
//! `HardwareConfig` that gets passed to whoever needs it, rather than
//! everybody going back to the raw descriptor and guessing whether it's been
//! copied yet.

use core::fmt;

use crate::args::{self, ArgsRegion};
use crate::board::{self, BoardId, BoardRev, Cpu, PlatformName, Prompt};
use crate::boardcfg::{BoardCfg, CfgInfo};
use crate::bootdev::BootDevice;
use crate::bsp::{Family, Generation};
use crate::reloc::ArgsCache;

/// The hardware description as handed over, in either generation.
#[derive(Copy, Clone, Debug)]
pub enum DescriptorFormat<'a> {
    Legacy(&'a ArgsRegion),
    Tagged {
        info: &'a CfgInfo,
        /// The full BOARD-CFG, if it's still around. Without it we only know
        /// what `CfgInfo` says.
        cfg: Option<BoardCfg<'a>>,
    },
}

impl<'a> DescriptorFormat<'a> {
    /// Finds the descriptor for `family` at its fixed address.
    ///
    /// Legacy families go through `cache`, so this picks up our own copy once
    /// it exists and NBoot's original before that.
    ///
    /// # Safety
    ///
    /// Must run on a board of `family`, after the prior stage has left its
    /// descriptor in place. See `ArgsRegion::at` and `CfgInfo::at`.
    pub unsafe fn locate(
        family: Family,
        cache: &'a ArgsCache,
        cfg: Option<BoardCfg<'a>>,
    ) -> Self {
        match family.generation() {
            Generation::Legacy => {
                let raw = ArgsRegion::at(args::nboot_args_addr(family.sdram_base()));
                Self::Legacy(cache.region_checked(raw))
            }
            Generation::BoardCfg => Self::Tagged {
                info: CfgInfo::at(family.cfg_info_addr()),
                cfg,
            },
        }
    }
}

pub type NbootVersion = heapless::String<16>;

/// Everything we learned about the hardware, normalized.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HardwareConfig {
    family: Family,
    board: BoardId,
    rev: BoardRev,
    boot_dev: BootDevice,
    features: u32,
    dram_size: u32,
    dram_chips: u32,
    flash_size: u32,
    debug_port: Option<u32>,
    nboot_version: NbootVersion,
    recover_requested: bool,
    ecc_type: u8,
}

impl HardwareConfig {
    pub fn decode(family: Family, format: &DescriptorFormat<'_>) -> Self {
        let hw = match *format {
            DescriptorFormat::Legacy(region) => {
                let args = &region.args;
                Self {
                    family,
                    board: family.board(args.board_type),
                    rev: args.board_rev(),
                    boot_dev: family.legacy_boot_dev(),
                    features: args.features(),
                    dram_size: args.mem_size,
                    dram_chips: args.num_dram,
                    flash_size: args.flash_size,
                    debug_port: Some(family.debug_port(args.dbg_ser_port_pa)),
                    nboot_version: truncated(args.nboot_version().as_str()),
                    recover_requested: args.recover_requested(),
                    ecc_type: args.ecc_type,
                }
            }
            DescriptorFormat::Tagged { info, cfg } => {
                let index = u8::try_from(info.board_type).unwrap_or(u8::MAX);
                let version = cfg.map(|c| c.nboot_version()).unwrap_or("(unknown)");
                Self {
                    family,
                    board: board::lookup(family.boards(), index),
                    rev: info.board_rev(),
                    boot_dev: info.boot_dev(),
                    features: info.features,
                    dram_size: info.dram_size,
                    dram_chips: info.dram_chips,
                    flash_size: 0,
                    debug_port: None,
                    nboot_version: truncated(version),
                    // The button check happens in the SPL, which puts its
                    // answer in the boot device rather than a flag.
                    recover_requested: false,
                    ecc_type: 0,
                }
            }
        };

        if hw.board.info.is_unknown() {
            log::warn!("{}: unknown board type {}", family.name(), hw.board.index);
        }
        log::debug!(
            "board {} rev {}, boot device {}, {} MiB DRAM",
            hw.board.info.name,
            hw.rev,
            hw.boot_dev.name(),
            hw.dram_size,
        );
        hw
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn board(&self) -> BoardId {
        self.board
    }

    pub fn name(&self) -> &'static str {
        self.board.info.name
    }

    pub fn rev(&self) -> BoardRev {
        self.rev
    }

    pub fn boot_dev(&self) -> BootDevice {
        self.boot_dev
    }

    pub fn features(&self) -> u32 {
        self.features
    }

    /// DRAM size in MiB.
    pub fn dram_size(&self) -> u32 {
        self.dram_size
    }

    pub fn dram_chips(&self) -> u32 {
        self.dram_chips
    }

    /// NAND size in MiB, zero where NBoot doesn't tell us.
    pub fn flash_size(&self) -> u32 {
        self.flash_size
    }

    /// Console port, if NBoot told us which UART it used.
    pub fn debug_port(&self) -> Option<u32> {
        self.debug_port
    }

    pub fn nboot_version(&self) -> &str {
        &self.nboot_version
    }

    pub fn recover_requested(&self) -> bool {
        self.recover_requested
    }

    pub fn ecc_type(&self) -> u8 {
        self.ecc_type
    }

    /// Usable RAM in bytes, after `reserved` bytes at the top (e.g. for a
    /// TEE) have been taken away.
    pub fn ram_size(&self, reserved: u64) -> u64 {
        (u64::from(self.dram_size) << 20).saturating_sub(reserved)
    }

    /// Legacy ARM machine type.
    pub fn arch_number(&self) -> u32 {
        self.board.info.mach_type
    }

    pub fn prompt(&self) -> Prompt {
        board::prompt(self.name())
    }

    pub fn platform(&self, cpu: Cpu) -> PlatformName {
        board::platform_name(self.name(), cpu)
    }

    pub fn banner(&self) -> Banner<'_> {
        Banner(self)
    }

    /// Prints the board banner.
    pub fn announce(&self) {
        log::info!("{}", self.banner());
    }
}

fn truncated(s: &str) -> NbootVersion {
    let mut v = NbootVersion::new();
    for c in s.chars() {
        if v.push(c).is_err() {
            break;
        }
    }
    v
}

/// `Board: <name> Rev <rev> (<n>x DRAM)`
pub struct Banner<'a>(&'a HardwareConfig);

impl fmt::Display for Banner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Board: {} Rev {} ({}x DRAM)",
            self.0.name(),
            self.0.rev,
            self.0.dram_chips
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::tests::DUMP;
    use crate::boardcfg::tests::picocore;
    use zerocopy::FromBytes;

    fn legacy() -> HardwareConfig {
        let region = ArgsRegion::copy_from(&DUMP).unwrap();
        HardwareConfig::decode(Family::Fsimx6, &DescriptorFormat::Legacy(&region))
    }

    #[test]
    fn legacy_fields() {
        let hw = legacy();
        assert_eq!(hw.name(), "armStoneA9");
        assert_eq!(hw.board().index, 1);
        assert_eq!(hw.rev(), BoardRev(120));
        assert_eq!(hw.boot_dev(), BootDevice::Nand);
        assert_eq!(hw.features(), 0x0112);
        assert_eq!(hw.dram_size(), 512);
        assert_eq!(hw.dram_chips(), 2);
        assert_eq!(hw.flash_size(), 256);
        assert_eq!(hw.debug_port(), Some(0));
        assert_eq!(hw.nboot_version(), "VN43");
        assert!(hw.recover_requested());
        assert_eq!(hw.ecc_type(), 8);
        assert_eq!(hw.arch_number(), 0xFFFF_FFFF);
    }

    #[test]
    fn banner_and_prompt() {
        let hw = legacy();
        assert_eq!(
            format!("{}", hw.banner()),
            "Board: armStoneA9 Rev 1.20 (2x DRAM)"
        );
        assert_eq!(hw.prompt(), "armStoneA9 # ");
        assert_eq!(hw.platform(Cpu::Mx6Quad), "armstonea9q");
    }

    #[test]
    fn legacy_ram_size() {
        assert_eq!(legacy().ram_size(0), 512 << 20);
    }

    #[test]
    fn shared_numbering_family() {
        let mut region = ArgsRegion::copy_from(&DUMP).unwrap();
        region.args.board_type = 8;
        let hw = HardwareConfig::decode(Family::Fsimx6sx, &DescriptorFormat::Legacy(&region));
        assert_eq!(hw.name(), "efusA9X");
        assert_eq!(hw.board().index, 0);

        region.args.board_type = 1;
        let hw = HardwareConfig::decode(Family::Fsimx6sx, &DescriptorFormat::Legacy(&region));
        assert_eq!(hw.name(), "unknown");
    }

    #[test]
    fn tagged_fields() {
        let image = picocore();
        let cfg = BoardCfg::parse(&image).unwrap();
        let info = CfgInfo::from_board_cfg(&cfg, None, Family::Fsimx8mm);
        let format = DescriptorFormat::Tagged {
            info: &info,
            cfg: Some(cfg),
        };
        let hw = HardwareConfig::decode(Family::Fsimx8mm, &format);

        assert_eq!(hw.name(), "PicoCoreMX8MM");
        assert_eq!(hw.rev(), BoardRev(130));
        assert_eq!(hw.boot_dev(), BootDevice::Nand);
        assert_eq!(hw.dram_size(), 1024);
        assert_eq!(hw.nboot_version(), "2023.11");
        assert_eq!(hw.debug_port(), None);
        assert!(!hw.recover_requested());
        assert_eq!(hw.ram_size(32 << 20), (1024 - 32) << 20);
        assert_eq!(
            format!("{}", hw.banner()),
            "Board: PicoCoreMX8MM Rev 1.30 (2x DRAM)"
        );
    }

    #[test]
    fn tagged_without_board_cfg() {
        let mut raw = [0u8; 32];
        raw[0] = 1; // board type
        raw[4] = 100; // rev
        raw[8] = BootDevice::Mmc3 as u8;
        raw[16] = 0; // dram size, low byte
        raw[17] = 2; // 512 MiB
        let info = CfgInfo::read_from(&raw[..]).unwrap();
        let format = DescriptorFormat::Tagged { info: &info, cfg: None };
        let hw = HardwareConfig::decode(Family::Fsimx8mm, &format);

        assert_eq!(hw.name(), "PicoCoreMX8MX");
        assert_eq!(hw.boot_dev(), BootDevice::Mmc3);
        assert_eq!(hw.dram_size(), 512);
        assert_eq!(hw.nboot_version(), "(unknown)");
    }

    #[test]
    fn tagged_out_of_range_board() {
        let mut info = CfgInfo::copy_from(&[0; 32]).unwrap();
        info.board_type = 300;
        let format = DescriptorFormat::Tagged { info: &info, cfg: None };
        let hw = HardwareConfig::decode(Family::Fsimx93, &format);
        assert_eq!(hw.name(), "unknown");
        assert_eq!(hw.arch_number(), 0);
    }

    #[test]
    fn version_is_truncated_not_dropped() {
        assert_eq!(truncated("0123456789abcdefXYZ"), "0123456789abcdef");
    }
}
