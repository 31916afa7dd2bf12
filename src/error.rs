//! Error types.
//!
//! Almost nothing in the handoff path is allowed to fail: a board that can't
//! work out its own name should still boot. The errors here cover the few
//! places where we are handed a byte slice or a capability that can actually
//! say no.

use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    /// Input ended before a fixed-size record did.
    #[error("descriptor truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    /// The BOARD-CFG header doesn't start with `FSLX`.
    #[error("bad image magic {0:02x?}")]
    BadMagic([u8; 4]),
    /// The image header is valid but describes something other than a
    /// BOARD-CFG.
    #[error("image is not a BOARD-CFG")]
    WrongType,
    #[error("BOARD-CFG checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
    /// A tagged record runs past the end of the payload, or the payload has
    /// no terminating record.
    #[error("malformed BOARD-CFG record at offset {0:#x}")]
    BadRecord(usize),
    /// The argument cache has already been filled for this boot.
    #[error("argument cache already initialized")]
    AlreadyInitialized,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum GpioError {
    #[error("gpio {0} does not exist")]
    NoSuchPin(u32),
    #[error("gpio {0} is busy")]
    Busy(u32),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
#[error("fuse read failed at bank {bank}, word {word}")]
pub struct FuseError {
    pub bank: u32,
    pub word: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum EnvError {
    #[error("environment full")]
    Full,
    #[error("variable is write-protected")]
    Protected,
}
