//! Board identity: the static per-family board tables and the string
//! transforms derived from a board's name.

use core::fmt;
use core::fmt::Write;

use bitflags::bitflags;

/// Board revision as `major * 100 + minor`, e.g. 120 for 1.20.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct BoardRev(pub u32);

impl BoardRev {
    /// What we assume when a BOARD-CFG doesn't say.
    pub const DEFAULT: Self = Self(100);

    pub fn major(self) -> u32 {
        self.0 / 100
    }

    pub fn minor(self) -> u32 {
        self.0 % 100
    }
}

impl fmt::Display for BoardRev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major(), self.minor())
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct BoardFlags: u32 {
        /// Kernel and device tree live in UBI volumes, not raw NAND
        /// partitions.
        const UBI_ONLY = 1 << 0;
    }
}

/// Compiled-in description of one board type: its name and the defaults it
/// wants in the environment.
///
/// Fields holding a `.`-prefixed name refer to another environment variable
/// which is *run* to compute the value; see `env`. `None` means "no default",
/// which removes a variable left at `undef`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BoardInfo {
    pub name: &'static str,
    /// Legacy ARM machine type for ATAG boots.
    pub mach_type: u32,
    pub flags: BoardFlags,
    pub bootdelay: Option<&'static str>,
    pub updatecheck: Option<&'static str>,
    pub installcheck: Option<&'static str>,
    pub recovercheck: Option<&'static str>,
    pub earlyusbinit: Option<&'static str>,
    pub console: Option<&'static str>,
    pub login: Option<&'static str>,
    pub mtdparts: Option<&'static str>,
    pub network: Option<&'static str>,
    pub init: Option<&'static str>,
    pub rootfs: Option<&'static str>,
    pub kernel: Option<&'static str>,
    pub fdt: Option<&'static str>,
    pub fsload: Option<&'static str>,
}

impl BoardInfo {
    /// Placeholder for any board type we don't have a table entry for.
    pub const UNKNOWN: Self = Self {
        name: "unknown",
        mach_type: 0,
        flags: BoardFlags::empty(),
        bootdelay: None,
        updatecheck: None,
        installcheck: None,
        recovercheck: None,
        earlyusbinit: None,
        console: None,
        login: None,
        mtdparts: None,
        network: None,
        init: None,
        rootfs: None,
        kernel: None,
        fdt: None,
        fsload: None,
    };

    /// The defaults every F&S board starts from. Tables override fields with
    /// struct update syntax.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            mach_type: MACH_TYPE_NONE,
            flags: BoardFlags::empty(),
            bootdelay: Some("3"),
            updatecheck: None,
            installcheck: None,
            recovercheck: None,
            earlyusbinit: None,
            console: Some(".console_serial"),
            login: Some(".login_serial"),
            mtdparts: Some(".mtdparts_std"),
            network: Some(".network_off"),
            init: Some(".init_init"),
            rootfs: Some(".rootfs_ubifs"),
            kernel: Some(".kernel_nand"),
            fdt: Some(".fdt_nand"),
            fsload: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.name == Self::UNKNOWN.name
    }
}

/// Machine type meaning "boot with a device tree, there is no machine".
pub const MACH_TYPE_NONE: u32 = 0xFFFF_FFFF;

/// Result of resolving a raw board type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BoardId {
    /// Zero-based index into the family's table. May be out of range, in
    /// which case `info` is `BoardInfo::UNKNOWN`.
    pub index: u8,
    pub info: &'static BoardInfo,
}

/// Looks `index` up in `table`, falling back to the unknown entry rather than
/// reading past the end.
pub fn lookup(table: &'static [BoardInfo], index: u8) -> BoardId {
    let info = table.get(usize::from(index)).unwrap_or(&BoardInfo::UNKNOWN);
    BoardId { index, info }
}

/// Finds the board whose name is `name`. An unmatched name yields
/// `table.len()`, which `lookup` resolves to the unknown entry.
pub fn index_by_name(table: &[BoardInfo], name: &str) -> u8 {
    let i = table
        .iter()
        .position(|bi| bi.name == name)
        .unwrap_or(table.len());
    u8::try_from(i).unwrap_or(u8::MAX)
}

/// CPU variants that change the platform name. Board glue detects this from
/// the SoC; we only care about the few that matter for naming.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Cpu {
    Mx6Solo,
    Mx6DualLite,
    Mx6Dual,
    Mx6Quad,
    Mx6Ul,
    Mx6Ull,
    Other,
}

pub type PlatformName = heapless::String<32>;

/// Derives the platform name used to pick a device tree or file name: the
/// board name in lower case, plus a CPU suffix.
///
/// - i.MX6 Solo/DualLite get `dl`, Dual/Quad get `q`.
/// - i.MX6ULL gets `ull`, unless the name already ends in `ul`, in which case
///   only the `l` is added (`efusa7ul` becomes `efusa7ull`, not
///   `efusa7ulull`).
///
/// Names longer than the buffer are truncated.
pub fn platform_name(name: &str, cpu: Cpu) -> PlatformName {
    let mut lc = PlatformName::new();
    for c in name.chars() {
        if lc.push(c.to_ascii_lowercase()).is_err() {
            log::warn!("platform name for {} truncated", name);
            return lc;
        }
    }

    let suffix = match cpu {
        Cpu::Mx6Solo | Cpu::Mx6DualLite => "dl",
        Cpu::Mx6Dual | Cpu::Mx6Quad => "q",
        Cpu::Mx6Ull if lc.ends_with("ul") => "l",
        Cpu::Mx6Ull => "ull",
        Cpu::Mx6Ul | Cpu::Other => "",
    };
    if lc.push_str(suffix).is_err() {
        log::warn!("platform name for {} truncated", name);
    }
    lc
}

pub type Prompt = heapless::String<32>;

/// The shell prompt, `"<name> # "`.
pub fn prompt(name: &str) -> Prompt {
    let mut p = Prompt::new();
    if write!(p, "{} # ", name).is_err() {
        p.clear();
        // Still usable, just anonymous.
        let _ = p.push_str("# ");
    }
    p
}

/// Maps the debug UART's physical address to its port number. `bases` is the
/// family's UART base table, port 0 first. Addresses not in the table give
/// `default`.
pub fn debug_port(pa: u32, bases: &[u32], default: u32) -> u32 {
    bases
        .iter()
        .rposition(|&base| base == pa)
        .map(|p| p as u32)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    static TABLE: [BoardInfo; 2] = [
        BoardInfo::new("efusA9"),
        BoardInfo {
            earlyusbinit: Some("1"),
            ..BoardInfo::new("armStoneA9")
        },
    ];

    #[test]
    fn rev_display() {
        assert_eq!(format!("{}", BoardRev(120)), "1.20");
        assert_eq!(format!("{}", BoardRev(305)), "3.05");
        assert_eq!(format!("{}", BoardRev(100)), "1.00");
        assert_eq!(format!("{}", BoardRev(7)), "0.07");
    }

    #[test]
    fn lookup_in_range() {
        let id = lookup(&TABLE, 1);
        assert_eq!(id.index, 1);
        assert_eq!(id.info.name, "armStoneA9");
        assert_eq!(id.info.earlyusbinit, Some("1"));
        assert_eq!(id.info.bootdelay, Some("3"));
    }

    #[test]
    fn lookup_out_of_range_is_unknown() {
        for i in [2u8, 7, 8, 200, 255] {
            let id = lookup(&TABLE, i);
            assert_eq!(id.index, i);
            assert_eq!(id.info.name, "unknown");
            assert_eq!(id.info.mach_type, 0);
            assert!(id.info.is_unknown());
        }
    }

    #[test]
    fn by_name() {
        assert_eq!(index_by_name(&TABLE, "armStoneA9"), 1);
        assert_eq!(index_by_name(&TABLE, "PicoCoreMX8MM"), 2);
        assert!(lookup(&TABLE, index_by_name(&TABLE, "nope")).info.is_unknown());
    }

    #[test]
    fn platform_lowercase() {
        assert_eq!(platform_name("PicoCoreMX8MM", Cpu::Other), "picocoremx8mm");
    }

    #[test]
    fn platform_mx6_suffixes() {
        assert_eq!(platform_name("efusA9", Cpu::Mx6Quad), "efusa9q");
        assert_eq!(platform_name("efusA9", Cpu::Mx6Dual), "efusa9q");
        assert_eq!(platform_name("efusA9", Cpu::Mx6DualLite), "efusa9dl");
        assert_eq!(platform_name("efusA9", Cpu::Mx6Solo), "efusa9dl");
    }

    #[test]
    fn platform_ull_does_not_double_ul() {
        assert_eq!(platform_name("efusA7UL", Cpu::Mx6Ull), "efusa7ull");
        assert_eq!(platform_name("CubeA7", Cpu::Mx6Ull), "cubea7ull");
        assert_eq!(platform_name("PicoCOM1.2", Cpu::Mx6Ull), "picocom1.2ull");
        assert_eq!(platform_name("efusA7UL", Cpu::Mx6Ul), "efusa7ul");
    }

    #[test]
    fn platform_truncates() {
        let long = "ABCDEFGHIJKLMNOPQRSTUVWXYZABCDEFGHIJ";
        let p = platform_name(long, Cpu::Mx6Quad);
        assert_eq!(p.len(), 32);
        assert!(p.starts_with("abcdef"));
    }

    #[test]
    fn prompts() {
        assert_eq!(prompt("efusA9"), "efusA9 # ");
    }

    #[test]
    fn debug_ports() {
        let bases = [0x0202_0000, 0x021E_8000, 0x021E_C000];
        assert_eq!(debug_port(0x021E_8000, &bases, 0), 1);
        assert_eq!(debug_port(0x0202_0000, &bases, 3), 0);
        assert_eq!(debug_port(0x1234_0000, &bases, 3), 3);
    }
}
