//! The self-describing BOARD-CFG format.
//!
//! Newer boards (i.MX8MM, i.MX8ULP, i.MX93) don't get a fixed struct from the
//! prior stage. Instead the SPL loads a BOARD-CFG image: an F&S image header
//! followed by a small tree of named properties. The SPL condenses the bits
//! everybody needs into a `CfgInfo` in OCRAM, and later stages read that in
//! place. There is nothing relocatable about it, so none of the games in
//! `reloc` apply.
//!
//! Payload layout, all little-endian, every record padded to 4 bytes:
//!
//! ```text
//! +--------+--------+------------------+
//! | tag:16 | len:16 | value[len] + pad |   repeated
//! +--------+--------+------------------+
//! ```
//!
//! `NODE` opens a node (value = node name), `PROP` holds `name\0data`,
//! `NODE_END` closes the node, and `END` terminates the payload. Nodes don't
//! nest.

use core::mem::size_of;

use bitflags::bitflags;
use crc::{Crc, CRC_32_ISO_HDLC};
use static_assertions::const_assert_eq;
use zerocopy::{AsBytes, FromBytes};

use crate::board::{self, BoardRev};
use crate::bootdev::BootDevice;
use crate::bsp::Family;
use crate::Error;

pub const FSH_MAGIC: [u8; 4] = *b"FSLX";

/// Image type of a board configuration.
pub const BOARD_CFG_TYPE: &str = "BOARD-CFG";

/// Name of the node holding the board configuration. Variants sharing an
/// image use `board-cfg@<variant>`.
pub const CFG_NODE: &str = "board-cfg";

pub const NBOOT_INFO_NODE: &str = "nboot-info";

const TAG_END: u16 = 0;
const TAG_NODE: u16 = 1;
const TAG_PROP: u16 = 2;
const TAG_NODE_END: u16 = 3;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct HeaderFlags: u16 {
        /// `crc32` covers the payload.
        const CRC32 = 0x4000;
        /// `descr` holds a board id.
        const DESCR = 0x8000;
    }
}

/// F&S image header, version 1.0.
#[derive(Copy, Clone, Debug, Eq, PartialEq, AsBytes, FromBytes)]
#[repr(C)]
pub struct FsHeader {
    pub magic: [u8; 4],
    pub file_size_low: u32,
    pub file_size_high: u32,
    pub flags: u16,
    pub padsize: u8,
    pub version: u8,
    pub type_: [u8; 12],
    pub crc32: u32,
    pub descr: [u8; 32],
}

const_assert_eq!(size_of::<FsHeader>(), 64);

impl FsHeader {
    pub fn file_size(&self) -> u64 {
        u64::from(self.file_size_high) << 32 | u64::from(self.file_size_low)
    }

    pub fn flags(&self) -> HeaderFlags {
        HeaderFlags::from_bits_retain(self.flags)
    }

    pub fn image_type(&self) -> &str {
        cstr(&self.type_)
    }

    pub fn descr(&self) -> Option<&str> {
        if self.flags().contains(HeaderFlags::DESCR) {
            Some(cstr(&self.descr))
        } else {
            None
        }
    }
}

/// Text up to the first NUL. Bytes that aren't UTF-8 read as empty.
fn cstr(bytes: &[u8]) -> &str {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    core::str::from_utf8(&bytes[..len]).unwrap_or("")
}

#[derive(Copy, Clone, Debug)]
struct Record<'a> {
    tag: u16,
    value: &'a [u8],
}

/// Walks the tagged records in `data`, stopping after `END`, or at the first
/// malformed record (which is yielded as an error).
struct Records<'a> {
    data: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Records<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, done: false }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let pos = self.pos;
        let rec = self.data.get(pos..pos + 4).and_then(|hdr| {
            let tag = u16::from_le_bytes([hdr[0], hdr[1]]);
            let len = usize::from(u16::from_le_bytes([hdr[2], hdr[3]]));
            let value = self.data.get(pos + 4..pos + 4 + len)?;
            Some((Record { tag, value }, (len + 3) & !3))
        });
        match rec {
            Some((rec, padded)) => {
                self.pos = pos + 4 + padded;
                if rec.tag == TAG_END {
                    self.done = true;
                }
                Some(Ok(rec))
            }
            None => {
                self.done = true;
                Some(Err(Error::BadRecord(pos)))
            }
        }
    }
}

/// One node of a BOARD-CFG.
#[derive(Copy, Clone, Debug)]
pub struct Node<'a> {
    name: &'a str,
    /// Records following the node's `NODE` record.
    body: &'a [u8],
}

impl<'a> Node<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Raw data of property `name`.
    pub fn prop(&self, name: &str) -> Option<&'a [u8]> {
        for rec in Records::new(self.body) {
            let rec = rec.ok()?;
            match rec.tag {
                TAG_PROP => {
                    let split = rec.value.iter().position(|&b| b == 0)?;
                    let (pname, data) = rec.value.split_at(split);
                    if pname == name.as_bytes() {
                        return Some(&data[1..]);
                    }
                }
                TAG_NODE_END | TAG_END => return None,
                _ => {}
            }
        }
        None
    }

    /// A string property, without its terminating NUL.
    pub fn str(&self, name: &str) -> Option<&'a str> {
        let data = self.prop(name)?;
        let data = data.strip_suffix(&[0]).unwrap_or(data);
        core::str::from_utf8(data).ok()
    }

    pub fn u32(&self, name: &str) -> Option<u32> {
        let data: [u8; 4] = self.prop(name)?.try_into().ok()?;
        Some(u32::from_le_bytes(data))
    }

    pub fn u32_or(&self, name: &str, default: u32) -> u32 {
        self.u32(name).unwrap_or(default)
    }
}

/// A parsed BOARD-CFG image.
#[derive(Copy, Clone, Debug)]
pub struct BoardCfg<'a> {
    header: FsHeader,
    payload: &'a [u8],
}

impl<'a> BoardCfg<'a> {
    /// Checks the header and the record structure of `bytes`. Lookups on the
    /// result can't run off the end.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, Error> {
        let header = FsHeader::read_from_prefix(bytes).ok_or(Error::Truncated {
            needed: size_of::<FsHeader>(),
            available: bytes.len(),
        })?;
        if header.magic != FSH_MAGIC {
            return Err(Error::BadMagic(header.magic));
        }
        if header.image_type() != BOARD_CFG_TYPE {
            return Err(Error::WrongType);
        }

        let start = size_of::<FsHeader>();
        let needed = usize::try_from(header.file_size())
            .ok()
            .and_then(|size| start.checked_add(size))
            .ok_or(Error::Truncated { needed: usize::MAX, available: bytes.len() })?;
        let payload = bytes.get(start..needed).ok_or(Error::Truncated {
            needed,
            available: bytes.len(),
        })?;

        if header.flags().contains(HeaderFlags::CRC32) {
            let computed = CRC32.checksum(payload);
            if computed != header.crc32 {
                return Err(Error::ChecksumMismatch {
                    stored: header.crc32,
                    computed,
                });
            }
        }

        let mut in_node = false;
        let mut terminated = false;
        let mut pos = 0;
        for rec in Records::new(payload) {
            let rec = rec?;
            match (rec.tag, in_node) {
                (TAG_NODE, false) => in_node = true,
                (TAG_PROP, true) => {
                    if !rec.value.contains(&0) {
                        return Err(Error::BadRecord(pos));
                    }
                }
                (TAG_NODE_END, true) => in_node = false,
                (TAG_END, false) => terminated = true,
                _ => return Err(Error::BadRecord(pos)),
            }
            pos += 4 + ((rec.value.len() + 3) & !3);
        }
        if !terminated {
            return Err(Error::BadRecord(pos));
        }

        Ok(Self { header, payload })
    }

    pub fn header(&self) -> &FsHeader {
        &self.header
    }

    /// The board id from the image header, e.g. `PCoreMX8MM-FERT1.130`.
    pub fn board_id(&self) -> Option<&str> {
        self.header.descr()
    }

    pub fn node(&self, name: &str) -> Option<Node<'a>> {
        let mut pos = 0;
        for rec in Records::new(self.payload) {
            let rec = rec.ok()?;
            pos += 4 + ((rec.value.len() + 3) & !3);
            if rec.tag == TAG_NODE && rec.value == name.as_bytes() {
                return Some(Node {
                    name: core::str::from_utf8(rec.value).ok()?,
                    body: self.payload.get(pos..)?,
                });
            }
        }
        None
    }

    /// The configuration node for `variant`, or the common one if the variant
    /// has no node of its own.
    pub fn cfg_node(&self, variant: Option<&str>) -> Option<Node<'a>> {
        if let Some(variant) = variant {
            let mut name = heapless::String::<64>::new();
            let named = name.push_str(CFG_NODE).is_ok()
                && name.push('@').is_ok()
                && name.push_str(variant).is_ok();
            if named {
                if let Some(node) = self.node(&name) {
                    return Some(node);
                }
            }
        }
        self.node(CFG_NODE)
    }

    pub fn board_name(&self, variant: Option<&str>) -> &'a str {
        self.cfg_node(variant)
            .and_then(|n| n.str("board-name"))
            .unwrap_or(board::BoardInfo::UNKNOWN.name)
    }

    pub fn board_rev(&self, variant: Option<&str>) -> BoardRev {
        self.cfg_node(variant)
            .map(|n| BoardRev(n.u32_or("board-rev", BoardRev::DEFAULT.0)))
            .unwrap_or(BoardRev::DEFAULT)
    }

    pub fn nboot_version(&self) -> &'a str {
        self.node(NBOOT_INFO_NODE)
            .and_then(|n| n.str("version"))
            .unwrap_or("(unknown)")
    }
}

/// The condensed board configuration the SPL leaves in OCRAM.
#[derive(Copy, Clone, Debug, Eq, PartialEq, AsBytes, FromBytes)]
#[repr(C)]
pub struct CfgInfo {
    /// Zero-based, already resolved against the family's table.
    pub board_type: u32,
    pub board_rev: u32,
    /// Raw boot mode code; see `BootDevice::from_raw`.
    pub boot_dev: u32,
    pub features: u32,
    /// DRAM size in MiB.
    pub dram_size: u32,
    pub dram_chips: u32,
    pub flags: u32,
    _reserved: u32,
}

const_assert_eq!(size_of::<CfgInfo>(), 32);

impl CfgInfo {
    /// Views the `CfgInfo` at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must be 4-byte aligned and point at an initialized `CfgInfo`
    /// that nobody writes to for `'static`. The SPL puts it at the start of its
    /// BSS area, which later stages leave alone.
    pub unsafe fn at(addr: usize) -> &'static Self {
        &*(addr as *const Self)
    }

    pub fn copy_from(bytes: &[u8]) -> Result<Self, Error> {
        Self::read_from_prefix(bytes).ok_or(Error::Truncated {
            needed: size_of::<Self>(),
            available: bytes.len(),
        })
    }

    /// Condenses a BOARD-CFG the way the SPL does once it has loaded one. The
    /// board type comes from matching the board name against the family's
    /// table.
    pub fn from_board_cfg(cfg: &BoardCfg<'_>, variant: Option<&str>, family: Family) -> Self {
        let name = cfg.board_name(variant);
        let node = cfg.cfg_node(variant);
        let get = |prop, default| node.map(|n| n.u32_or(prop, default)).unwrap_or(default);
        let boot_dev = node
            .and_then(|n| n.str("boot-dev"))
            .map(BootDevice::from_name)
            .unwrap_or(BootDevice::Unknown);

        Self {
            board_type: u32::from(board::index_by_name(family.boards(), name)),
            board_rev: cfg.board_rev(variant).0,
            boot_dev: boot_dev as u32,
            features: get("features", 0),
            dram_size: get("dram-size", 0),
            dram_chips: get("dram-chips", 1),
            flags: 0,
            _reserved: 0,
        }
    }

    pub fn boot_dev(&self) -> BootDevice {
        BootDevice::from_raw(self.boot_dev)
    }

    pub fn board_rev(&self) -> BoardRev {
        BoardRev(self.board_rev)
    }
}
