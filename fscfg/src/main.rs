// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-side inspection of the records NBoot and the SPL hand over.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::collections::BTreeMap;
use std::path::PathBuf;

use fshandoff::args::ArgsRegion;
use fshandoff::board::Cpu;
use fshandoff::boardcfg::{BoardCfg, CfgInfo, FSH_MAGIC};
use fshandoff::bootdev::{self, BootDevice};
use fshandoff::bsp::{Family, Generation};
use fshandoff::descriptor::{DescriptorFormat, HardwareConfig};
use fshandoff::env::{self, CommandRunner, Defaults, Env, EnvOptions};
use fshandoff::error::EnvError;

#[derive(Debug, Parser)]
enum Fscfg {
    /// Decodes an NBoot argument dump or a BOARD-CFG image
    Decode {
        #[clap(flatten)]
        input: Input,
    },
    /// Prints the default environment a board would get
    Env {
        #[clap(flatten)]
        input: Input,
        #[clap(long, value_enum, default_value = "other")]
        cpu: CpuArg,
        /// Kernel, device tree and rootfs come from update slot A
        #[clap(long)]
        update_support: bool,
        #[clap(long)]
        read_only: bool,
    },
    /// Decodes a boot_cfg fuse word (bank 1, word 3)
    Fuses {
        #[clap(value_parser = parse_u32)]
        word: u32,
    },
    /// Translates a boot device name to its code, or back
    BootDev { device: String },
}

#[derive(Debug, clap::Args)]
struct Input {
    #[clap(long, default_value = "fsimx8mm")]
    family: String,
    /// Board variant, selecting a `board-cfg@<variant>` node
    #[clap(long)]
    variant: Option<String>,
    file: PathBuf,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CpuArg {
    Solo,
    Dl,
    Dual,
    Quad,
    Ul,
    Ull,
    Other,
}

impl From<CpuArg> for Cpu {
    fn from(c: CpuArg) -> Self {
        match c {
            CpuArg::Solo => Cpu::Mx6Solo,
            CpuArg::Dl => Cpu::Mx6DualLite,
            CpuArg::Dual => Cpu::Mx6Dual,
            CpuArg::Quad => Cpu::Mx6Quad,
            CpuArg::Ul => Cpu::Mx6Ul,
            CpuArg::Ull => Cpu::Mx6Ull,
            CpuArg::Other => Cpu::Other,
        }
    }
}

fn parse_u32(s: &str) -> Result<u32> {
    let v = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16)?,
        None => s.parse()?,
    };
    Ok(v)
}

fn load(input: &Input) -> Result<HardwareConfig> {
    let Some(family) = Family::from_name(&input.family) else {
        bail!("unknown family {}", input.family);
    };
    let bytes = std::fs::read(&input.file)
        .with_context(|| format!("reading {}", input.file.display()))?;

    let hw = if bytes.starts_with(&FSH_MAGIC) {
        if family.generation() != Generation::BoardCfg {
            bail!("{} boards don't use BOARD-CFG", family.name());
        }
        let cfg = BoardCfg::parse(&bytes)?;
        if let Some(id) = cfg.board_id() {
            println!("board id:      {}", id);
        }
        let info = CfgInfo::from_board_cfg(&cfg, input.variant.as_deref(), family);
        HardwareConfig::decode(family, &DescriptorFormat::Tagged { info: &info, cfg: Some(cfg) })
    } else {
        match family.generation() {
            Generation::Legacy => {
                let region = ArgsRegion::copy_from(&bytes)?;
                HardwareConfig::decode(family, &DescriptorFormat::Legacy(&region))
            }
            Generation::BoardCfg => {
                let info = CfgInfo::copy_from(&bytes)?;
                HardwareConfig::decode(family, &DescriptorFormat::Tagged { info: &info, cfg: None })
            }
        }
    };
    Ok(hw)
}

fn decode(input: &Input) -> Result<()> {
    let hw = load(input)?;
    println!("{}", hw.banner());
    println!("family:        {}", hw.family().name());
    println!("board type:    {}", hw.board().index);
    println!("boot device:   {}", hw.boot_dev().name());
    println!("features:      {:#x}", hw.features());
    println!("dram:          {} MiB", hw.dram_size());
    if hw.flash_size() != 0 {
        println!("flash:         {} MiB", hw.flash_size());
    }
    if let Some(port) = hw.debug_port() {
        println!("debug port:    {}", port);
    }
    println!("nboot:         {}", hw.nboot_version());
    println!("recover:       {}", hw.recover_requested());
    println!("prompt:        {:?}", hw.prompt().as_str());
    Ok(())
}

/// An environment where every variable starts out as `undef`.
struct HostEnv(BTreeMap<String, String>);

impl Env for HostEnv {
    fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
        self.0.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), EnvError> {
        self.0.remove(name);
        Ok(())
    }
}

/// There's no shell here. Scripts are noted instead of run, and their target
/// is shown as a reference to the script.
struct NoShell<'a>(&'a str);

impl CommandRunner<HostEnv> for NoShell<'_> {
    fn run_script(&mut self, env: &mut HostEnv, script: &str) -> Result<(), EnvError> {
        log::info!("would run {}", script);
        env.set(self.0, &format!("run {}", script))
    }
}

fn print_env(input: &Input, cpu: Cpu, options: EnvOptions) -> Result<()> {
    let hw = load(input)?;
    let defaults = Defaults::new(&hw, cpu, options);

    let mut env = HostEnv(BTreeMap::new());
    for var in defaults.rules() {
        env.set(var.name, env::UNDEF)?;
        // Make the script visible so it looks like it would run.
        if let env::ComputeRule::Indirect(script) = var.rule {
            env.set(script, "")?;
        }
    }

    // Go one variable at a time so the runner knows whose script it is.
    for var in defaults.rules() {
        env::setup_var(&mut env, &mut NoShell(var.name), &var)?;
    }

    for var in defaults.rules() {
        match env.get(var.name) {
            Some(v) => println!("{}={}", var.name, v),
            None => println!("# {} removed", var.name),
        }
    }
    Ok(())
}

fn boot_dev(device: &str) -> Result<()> {
    let dev = match parse_u32(device) {
        Ok(code) => BootDevice::from_raw(code),
        Err(_) => BootDevice::from_name(device),
    };
    if dev == BootDevice::Unknown {
        bail!("{}: {}", device, dev.name());
    }
    println!("{} = {}", dev.name(), dev as u32);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let fscfg = Fscfg::parse();

    match fscfg {
        Fscfg::Decode { input } => decode(&input)?,
        Fscfg::Env { input, cpu, update_support, read_only } => {
            let options = EnvOptions { update_support, read_only, ..EnvOptions::DEFAULT };
            print_env(&input, cpu.into(), options)?;
        }
        Fscfg::Fuses { word } => {
            println!("{}", bootdev::decode_boot_cfg(word).name());
        }
        Fscfg::BootDev { device } => boot_dev(&device)?,
    }
    Ok(())
}
