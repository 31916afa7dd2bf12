//! What we pass on to the OS loader.
//!
//! Linux on these boards reads the same records we do: legacy kernels get the
//! NBoot argument block, newer ones the address of the BOARD-CFG. The kernel
//! parses the revision and feature fields itself, so those go through
//! untouched. Two fields don't: the board type is normalized for families
//! that share numbering, and the NAND health bits include what we added.

use core::mem::size_of;

use zerocopy::AsBytes;

use crate::args::ArgsRegion;
use crate::bsp::{Family, Generation};
use crate::reloc::ArgsCache;
use crate::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Handoff {
    Legacy(ArgsRegion),
    BoardCfg { addr: usize },
}

impl Handoff {
    pub fn legacy(region: &ArgsRegion, family: Family, ecc_state: u8) -> Self {
        let mut out = *region;
        out.fix_sizes();
        out.args.board_type = family.normalize_board_type(region.args.board_type);
        out.args.ecc_state = ecc_state;
        Self::Legacy(out)
    }

    /// Builds the record for `family` from what this boot has gathered.
    /// `raw` is NBoot's original block, used if our copy was never made;
    /// `board_cfg` is where the BOARD-CFG was loaded.
    pub fn collect(family: Family, cache: &ArgsCache, raw: &ArgsRegion, board_cfg: usize) -> Self {
        match family.generation() {
            Generation::Legacy => {
                Self::legacy(cache.region_checked(raw), family, cache.ecc_state(raw))
            }
            Generation::BoardCfg => Self::BoardCfg { addr: board_cfg },
        }
    }

    /// The legacy record as the kernel sees it.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Legacy(region) => Some(region.as_bytes()),
            Self::BoardCfg { .. } => None,
        }
    }

    /// Copies the legacy record into `buf`, returning the number of bytes
    /// written. A BOARD-CFG handoff writes nothing.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let Some(bytes) = self.as_bytes() else {
            return Ok(0);
        };
        let available = buf.len();
        let dst = buf.get_mut(..bytes.len()).ok_or(Error::Truncated {
            needed: size_of::<ArgsRegion>(),
            available,
        })?;
        dst.copy_from_slice(bytes);
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::tests::DUMP;

    #[test]
    fn legacy_passthrough() {
        let raw = ArgsRegion::copy_from(&DUMP).unwrap();
        let cache = ArgsCache::new();
        cache.mark_relocated();
        cache.fill(&raw).unwrap();
        cache.merge_ecc_state(0x02);

        let h = Handoff::collect(Family::Fsimx6, &cache, &raw, 0);
        let bytes = h.as_bytes().unwrap();
        assert_eq!(bytes.len(), 96);
        // Revision and features untouched.
        assert_eq!(bytes[49], 120);
        assert_eq!(bytes[50], 0x12);
        assert_eq!(bytes[51], 0x01);
        // Board type as it was, NAND health merged.
        assert_eq!(bytes[48], 1);
        assert_eq!(bytes[53], 0x02);
        // Sizes are ours.
        assert_eq!(&bytes[4..8], &64u32.to_le_bytes());
        assert_eq!(&bytes[68..72], &32u32.to_le_bytes());
    }

    #[test]
    fn shared_numbering_is_normalized() {
        let mut raw = ArgsRegion::copy_from(&DUMP).unwrap();
        raw.args.board_type = 8;
        let h = Handoff::legacy(&raw, Family::Fsimx6sx, 0);
        assert_eq!(h.as_bytes().unwrap()[48], 0);
    }

    #[test]
    fn uses_raw_when_never_copied() {
        let raw = ArgsRegion::copy_from(&DUMP).unwrap();
        let cache = ArgsCache::new();
        let h = Handoff::collect(Family::Fsimx6, &cache, &raw, 0);
        assert_eq!(h, Handoff::legacy(&raw, Family::Fsimx6, 0));
    }

    #[test]
    fn board_cfg_is_an_address() {
        let raw = ArgsRegion::ZEROED;
        let h = Handoff::collect(Family::Fsimx93, &ArgsCache::new(), &raw, 0x2049_8000);
        assert_eq!(h, Handoff::BoardCfg { addr: 0x2049_8000 });
        assert_eq!(h.as_bytes(), None);
        assert_eq!(h.write_to(&mut [0; 4]), Ok(0));
    }

    #[test]
    fn write_needs_room() {
        let raw = ArgsRegion::copy_from(&DUMP).unwrap();
        let h = Handoff::legacy(&raw, Family::Fsimx6, 0);
        let mut buf = [0u8; 128];
        assert_eq!(h.write_to(&mut buf), Ok(96));
        assert_eq!(&buf[..4], b"NBOO");
        assert_eq!(
            h.write_to(&mut [0; 64]),
            Err(Error::Truncated { needed: 96, available: 64 })
        );
    }
}
