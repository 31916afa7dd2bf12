//! Hardware configuration handoff for F&S i.MX boards.
//!
//! The stage before us (NBoot on older boards, our own SPL on newer ones)
//! probes the board and leaves a description of it in memory. This crate
//! finds that description, turns it into a `HardwareConfig`, and derives from
//! it what the rest of the bootloader needs: the board's identity, the boot
//! device, whether to update or recover, and the board's environment
//! defaults. It also builds the record passed on to Linux.

#![cfg_attr(not(test), no_std)]

pub mod args;
pub mod board;
pub mod boardcfg;
pub mod bootdev;
pub mod bsp;
pub mod descriptor;
pub mod env;
pub mod error;
pub mod gpio;
pub mod handoff;
pub mod recover;
pub mod reloc;

pub use descriptor::{DescriptorFormat, HardwareConfig};
pub use error::Error;
