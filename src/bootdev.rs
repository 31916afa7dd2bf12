//! Which medium did we boot from?
//!
//! There are three answers to this, depending on who you ask:
//!
//! - BOARD-CFG boards record the device in `CfgInfo`; that's authoritative for
//!   the current boot.
//! - The fuses say what the chip is permanently set up to boot from. This can
//!   differ from the current boot, e.g. a board fused for NAND that was
//!   forced into USB recovery.
//! - Legacy boards have no way to tell at runtime. The answer is fixed per
//!   build by where the environment lives.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::error::FuseError;

/// Boot devices we know about. Discriminants match the SoC boot mode codes,
/// which is what `CfgInfo::boot_dev` holds.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
pub enum BootDevice {
    Sd1 = 6,
    Sd2 = 7,
    Sd3 = 8,
    Mmc1 = 10,
    Mmc2 = 11,
    Mmc3 = 12,
    Nand = 14,
    Usb = 17,
    Unknown = 18,
}

/// Display names, in the order lookups search them.
const NAMES: [(BootDevice, &str); 8] = [
    (BootDevice::Usb, "USB"),
    (BootDevice::Nand, "NAND"),
    (BootDevice::Mmc1, "MMC1"),
    (BootDevice::Mmc2, "MMC2"),
    (BootDevice::Mmc3, "MMC3"),
    (BootDevice::Sd1, "SD1"),
    (BootDevice::Sd2, "SD2"),
    (BootDevice::Sd3, "SD3"),
];

impl BootDevice {
    /// Decodes a raw boot mode code. Codes for devices we don't handle
    /// (NOR, QSPI, SD4, ...) come back as `Unknown`.
    pub fn from_raw(raw: u32) -> Self {
        Self::from_u32(raw).unwrap_or(Self::Unknown)
    }

    pub fn from_name(name: &str) -> Self {
        NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|&(dev, _)| dev)
            .unwrap_or(Self::Unknown)
    }

    pub fn name(self) -> &'static str {
        NAMES
            .iter()
            .find(|&&(dev, _)| dev == self)
            .map(|&(_, n)| n)
            .unwrap_or("(unknown)")
    }

    /// SD card on USDHC `port` (zero-based).
    pub fn sd(port: u32) -> Self {
        match port {
            0 => Self::Sd1,
            1 => Self::Sd2,
            2 => Self::Sd3,
            _ => Self::Unknown,
        }
    }

    /// eMMC on USDHC `port` (zero-based).
    pub fn mmc(port: u32) -> Self {
        match port {
            0 => Self::Mmc1,
            1 => Self::Mmc2,
            2 => Self::Mmc3,
            _ => Self::Unknown,
        }
    }

    pub fn is_nand(self) -> bool {
        self == Self::Nand
    }

    /// The USDHC port this device sits on, if it's an SD card or eMMC.
    pub fn usdhc_port(self) -> Option<u32> {
        match self {
            Self::Sd1 | Self::Mmc1 => Some(0),
            Self::Sd2 | Self::Mmc2 => Some(1),
            Self::Sd3 | Self::Mmc3 => Some(2),
            _ => None,
        }
    }
}

/// Read access to the one-time-programmable fuses.
pub trait Fuses {
    fn read(&self, bank: u32, word: u32) -> Result<u32, FuseError>;
}

// boot_cfg lives in fuse bank 1, word 3.
const BOOT_CFG_BANK: u32 = 1;
const BOOT_CFG_WORD: u32 = 3;
const DEVSEL_SHIFT: u32 = 12;
const DEVSEL_MASK: u32 = 7 << DEVSEL_SHIFT;
const PORTSEL_SHIFT: u32 = 10;
const PORTSEL_MASK: u32 = 3 << PORTSEL_SHIFT;

// Boot type codes in the devsel field.
const BOOT_TYPE_SD: u32 = 0x1;
const BOOT_TYPE_MMC: u32 = 0x2;
const BOOT_TYPE_NAND: u32 = 0x3;

/// Decodes a boot_cfg fuse word. Anything that isn't SD, eMMC or NAND means
/// the board isn't fused for a storage boot, and USB is the safe answer.
pub fn decode_boot_cfg(val: u32) -> BootDevice {
    let port = (val & PORTSEL_MASK) >> PORTSEL_SHIFT;
    match (val & DEVSEL_MASK) >> DEVSEL_SHIFT {
        BOOT_TYPE_SD => BootDevice::sd(port),
        BOOT_TYPE_MMC => BootDevice::mmc(port),
        BOOT_TYPE_NAND => BootDevice::Nand,
        _ => BootDevice::Usb,
    }
}

/// Returns the boot device the chip is fused for. A fuse read error degrades
/// to USB.
pub fn from_fuses(fuses: &impl Fuses) -> BootDevice {
    match fuses.read(BOOT_CFG_BANK, BOOT_CFG_WORD) {
        Ok(val) => decode_boot_cfg(val),
        Err(e) => {
            log::error!("Error reading boot_cfg: {}", e);
            BootDevice::Usb
        }
    }
}

/// The boot device legacy builds assume. These boards can't detect it, so
/// it follows where the build keeps its environment.
pub const fn legacy(env_in_mmc: bool) -> BootDevice {
    if env_in_mmc {
        BootDevice::Mmc2
    } else {
        BootDevice::Nand
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [BootDevice; 9] = [
        BootDevice::Usb,
        BootDevice::Nand,
        BootDevice::Mmc1,
        BootDevice::Mmc2,
        BootDevice::Mmc3,
        BootDevice::Sd1,
        BootDevice::Sd2,
        BootDevice::Sd3,
        BootDevice::Unknown,
    ];

    #[test]
    fn name_round_trip() {
        for dev in ALL {
            assert_eq!(BootDevice::from_name(dev.name()), dev, "{:?}", dev);
        }
    }

    #[test]
    fn unknown_names() {
        assert_eq!(BootDevice::Unknown.name(), "(unknown)");
        for name in ["", "usb", "MMC4", "SD", "(unknown)", "NAND "] {
            assert_eq!(BootDevice::from_name(name), BootDevice::Unknown);
        }
    }

    #[test]
    fn raw_codes() {
        assert_eq!(BootDevice::from_raw(14), BootDevice::Nand);
        assert_eq!(BootDevice::from_raw(12), BootDevice::Mmc3);
        // SD4, QSPI, garbage
        assert_eq!(BootDevice::from_raw(9), BootDevice::Unknown);
        assert_eq!(BootDevice::from_raw(15), BootDevice::Unknown);
        assert_eq!(BootDevice::from_raw(0xdead), BootDevice::Unknown);
        for dev in ALL {
            assert_eq!(BootDevice::from_raw(dev as u32), dev);
        }
    }

    struct FakeFuses(Result<u32, FuseError>);

    impl Fuses for FakeFuses {
        fn read(&self, bank: u32, word: u32) -> Result<u32, FuseError> {
            assert_eq!((bank, word), (1, 3));
            self.0
        }
    }

    fn fused(devsel: u32, port: u32) -> FakeFuses {
        // Sprinkle unrelated bits around the fields we care about.
        FakeFuses(Ok(devsel << 12 | port << 10 | 0x8000_0201))
    }

    #[test]
    fn fuse_decoding() {
        assert_eq!(from_fuses(&fused(1, 0)), BootDevice::Sd1);
        assert_eq!(from_fuses(&fused(1, 2)), BootDevice::Sd3);
        assert_eq!(from_fuses(&fused(2, 1)), BootDevice::Mmc2);
        assert_eq!(from_fuses(&fused(2, 2)), BootDevice::Mmc3);
        assert_eq!(from_fuses(&fused(3, 3)), BootDevice::Nand);
        assert_eq!(from_fuses(&fused(4, 0)), BootDevice::Usb);
        assert_eq!(from_fuses(&fused(0, 0)), BootDevice::Usb);
        assert_eq!(from_fuses(&fused(7, 1)), BootDevice::Usb);
    }

    #[test]
    fn port_beyond_enum() {
        assert_eq!(from_fuses(&fused(2, 3)), BootDevice::Unknown);
    }

    #[test]
    fn fuse_error_is_usb() {
        let fuses = FakeFuses(Err(FuseError { bank: 1, word: 3 }));
        assert_eq!(from_fuses(&fuses), BootDevice::Usb);
    }

    #[test]
    fn legacy_constant() {
        assert_eq!(legacy(true), BootDevice::Mmc2);
        assert_eq!(legacy(false), BootDevice::Nand);
    }

    #[test]
    fn usdhc_ports() {
        assert_eq!(BootDevice::Mmc3.usdhc_port(), Some(2));
        assert_eq!(BootDevice::Sd1.usdhc_port(), Some(0));
        assert_eq!(BootDevice::Nand.usdhc_port(), None);
    }
}
