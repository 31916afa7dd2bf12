//! Board defaults for the shell environment.
//!
//! The default environment ships with most board-dependent variables set to
//! `undef`. Once we know what board we're on, `late_init` replaces each of
//! those, and anything missing, with the board's default. Anything else was
//! put there by the user and is left alone.
//!
//! Some defaults are literal. Others name a script variable (`.console_serial`,
//! `.kernel_nand_A`, ...) that is run to set the variable, because the value
//! depends on other variables at the time it's computed.

use core::fmt::Write;

use crate::board::{self, BoardFlags, BoardInfo, Cpu, PlatformName};
use crate::descriptor::HardwareConfig;
use crate::error::EnvError;

/// Marks a variable that is waiting for its board default.
pub const UNDEF: &str = "undef";

/// The shell environment.
pub trait Env {
    fn get(&self, name: &str) -> Option<&str>;
    fn set(&mut self, name: &str, value: &str) -> Result<(), EnvError>;
    fn remove(&mut self, name: &str) -> Result<(), EnvError>;
}

/// Runs scripts stored in the environment.
pub trait CommandRunner<E: ?Sized> {
    /// Runs the script held by variable `script`, as `run <script>` would.
    fn run_script(&mut self, env: &mut E, script: &str) -> Result<(), EnvError>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ComputeRule<'a> {
    /// Set to this value; `None` removes the variable.
    Literal(Option<&'a str>),
    /// Run the script in this variable, which is expected to set ours.
    Indirect(&'a str),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct VarRule<'a> {
    pub name: &'a str,
    pub rule: ComputeRule<'a>,
}

impl<'a> VarRule<'a> {
    pub const fn literal(name: &'a str, value: Option<&'a str>) -> Self {
        Self { name, rule: ComputeRule::Literal(value) }
    }

    pub const fn indirect(name: &'a str, script: &'a str) -> Self {
        Self { name, rule: ComputeRule::Indirect(script) }
    }

    /// A board default that may or may not be given.
    fn script(name: &'a str, script: Option<&'a str>) -> Self {
        match script {
            Some(s) => Self::indirect(name, s),
            None => Self::literal(name, None),
        }
    }
}

/// Whether `name` still wants its default.
pub fn needs_default(env: &impl Env, name: &str) -> bool {
    env.get(name).map_or(true, |v| v == UNDEF)
}

/// Applies one rule. Returns whether the rule fired.
///
/// An indirect rule whose script doesn't exist does nothing, leaving the
/// variable as it was.
pub fn setup_var<E, R>(env: &mut E, runner: &mut R, var: &VarRule<'_>) -> Result<bool, EnvError>
where
    E: Env,
    R: CommandRunner<E>,
{
    if !needs_default(&*env, var.name) {
        return Ok(false);
    }

    match var.rule {
        ComputeRule::Literal(Some(value)) => env.set(var.name, value)?,
        ComputeRule::Literal(None) => env.remove(var.name)?,
        ComputeRule::Indirect(script) => {
            if env.get(script).is_none() {
                log::debug!("{}: no script {}", var.name, script);
                return Ok(false);
            }
            runner.run_script(env, script)?;
        }
    }
    Ok(true)
}

/// Build-time choices that affect the defaults.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EnvOptions {
    /// Driver name of the console UART, `sercon` is this plus the port.
    pub serial_name: &'static str,
    /// A/B update support: kernel, device tree and rootfs come from slot A.
    pub update_support: bool,
    /// Mount the root filesystem read-only.
    pub read_only: bool,
    pub mtdids: &'static str,
    pub partition: &'static str,
    /// MMC device number of the boot device, if it differs from the USDHC
    /// port.
    pub mmc_dev: Option<u32>,
}

impl EnvOptions {
    pub const DEFAULT: Self = Self {
        serial_name: "serial",
        update_support: false,
        read_only: false,
        mtdids: "nand0=gpmi-nand",
        partition: "nand0,TargetFS",
        mmc_dev: None,
    };
}

impl Default for EnvOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

type Small = heapless::String<24>;

/// Every default for one board, computed up front.
#[derive(Clone, Debug)]
pub struct Defaults {
    info: &'static BoardInfo,
    options: EnvOptions,
    sercon: Small,
    platform: PlatformName,
    usdhcdev: Small,
    mmcdev: Small,
    bd_kernel: &'static str,
    bd_fdt: &'static str,
    bd_rootfs: &'static str,
    kernel: Small,
    fdt: Small,
    rootfs: Small,
}

impl Defaults {
    pub fn new(hw: &HardwareConfig, cpu: Cpu, options: EnvOptions) -> Self {
        let info = hw.board().info;

        // Kernel, device tree and rootfs all come from the boot medium.
        let (bd_kernel, bd_fdt, bd_rootfs) = if hw.boot_dev().is_nand() {
            let kernel = if info.flags.contains(BoardFlags::UBI_ONLY) {
                "ubifs"
            } else {
                "nand"
            };
            (kernel, kernel, "ubifs")
        } else {
            ("mmc", "mmc", "mmc")
        };

        let usdhc = hw.boot_dev().usdhc_port().unwrap_or(0);
        let slot = if options.update_support { "_A" } else { "" };

        Self {
            info,
            options,
            sercon: small(format_args!(
                "{}{}",
                options.serial_name,
                hw.debug_port().unwrap_or(0)
            )),
            platform: board::platform_name(info.name, cpu),
            usdhcdev: small(format_args!("{}", usdhc)),
            mmcdev: small(format_args!("{}", options.mmc_dev.unwrap_or(usdhc))),
            bd_kernel,
            bd_fdt,
            bd_rootfs,
            kernel: small(format_args!(".kernel_{}{}", bd_kernel, slot)),
            fdt: small(format_args!(".fdt_{}{}", bd_fdt, slot)),
            rootfs: small(format_args!(".rootfs_{}{}", bd_rootfs, slot)),
        }
    }

    /// The full catalogue, in the order it is applied.
    pub fn rules(&self) -> [VarRule<'_>; 26] {
        let info = self.info;
        let mode = if self.options.read_only { "ro" } else { "rw" };
        [
            VarRule::literal("sercon", Some(self.sercon.as_str())),
            VarRule::literal("platform", Some(self.platform.as_str())),
            VarRule::literal("usdhcdev", Some(self.usdhcdev.as_str())),
            VarRule::literal("mmcdev", Some(self.mmcdev.as_str())),
            VarRule::literal("bootdelay", info.bootdelay),
            VarRule::literal("updatecheck", info.updatecheck),
            VarRule::literal("installcheck", info.installcheck),
            VarRule::literal("recovercheck", info.recovercheck),
            VarRule::literal("earlyusbinit", info.earlyusbinit),
            VarRule::literal("mtdids", Some(self.options.mtdids)),
            VarRule::literal("partition", Some(self.options.partition)),
            VarRule::literal("mode", Some(mode)),
            VarRule::literal("bd_kernel", Some(self.bd_kernel)),
            VarRule::literal("bd_fdt", Some(self.bd_fdt)),
            VarRule::literal("bd_rootfs", Some(self.bd_rootfs)),
            VarRule::script("console", info.console),
            VarRule::script("login", info.login),
            VarRule::script("mtdparts", info.mtdparts),
            VarRule::script("fsload", info.fsload),
            VarRule::script("network", info.network),
            VarRule::script("init", info.init),
            VarRule::indirect("bootfdt", "set_bootfdt"),
            VarRule::indirect("bootargs", "set_bootargs"),
            VarRule::indirect("kernel", self.kernel.as_str()),
            VarRule::indirect("fdt", self.fdt.as_str()),
            VarRule::indirect("rootfs", self.rootfs.as_str()),
        ]
    }
}

fn small(args: core::fmt::Arguments<'_>) -> Small {
    let mut s = Small::new();
    if s.write_fmt(args).is_err() {
        log::warn!("env default truncated: {}", s);
    }
    s
}

/// Fills in every board default. Meant to run before anything reads these
/// variables; running it again only touches variables that are unset or
/// `undef` by then.
///
/// A variable that can't be set doesn't stop the rest; the first error is
/// returned at the end.
pub fn late_init<E, R>(env: &mut E, runner: &mut R, defaults: &Defaults) -> Result<(), EnvError>
where
    E: Env,
    R: CommandRunner<E>,
{
    let mut result = Ok(());
    for var in defaults.rules() {
        match setup_var(env, runner, &var) {
            Ok(true) => log::debug!("{} set to board default", var.name),
            Ok(false) => {}
            Err(e) => {
                log::warn!("{}: {}", var.name, e);
                result = result.and(Err(e));
            }
        }
    }
    result
}
