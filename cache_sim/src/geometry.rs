//! Cache geometry and address decomposition.

use std::fmt;

use thiserror::Error;

use crate::bin::{extract, mask_lower};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid cache geometry s={s}, E={e}, b={b}: every parameter must be positive")]
    InvalidGeometry { s: u32, e: usize, b: u32 },
    #[error("s + b = {width} leaves no tag bits in a 64-bit address")]
    AddressTooWide { width: u32 },
    #[error("cache geometry s={s}, E={e}, b={b} exceeds {max} lines or the address space", max = Geometry::MAX_LINES)]
    TooLarge { s: u32, e: usize, b: u32 },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// `(s, E, b)`: set-index bits, lines per set, block-offset bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    s: u32,
    e: usize,
    b: u32,
}

/// an address split into its three fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedAddr {
    pub tag: u64,
    pub set: usize,
    pub offset: u64,
}

impl Geometry {
    /// 1KB direct mapped cache with 32-byte blocks, used to score transposes.
    pub const REFERENCE_DIRECT_MAPPED: Geometry = Geometry { s: 5, e: 1, b: 5 };
    /// upper bound on `S * E`, the number of lines the simulator allocates.
    pub const MAX_LINES: usize = 1 << 24;

    pub fn new(s: u32, e: usize, b: u32) -> Result<Self> {
        if s == 0 || e == 0 || b == 0 {
            return Err(ConfigError::InvalidGeometry { s, e, b });
        }
        let width = s.saturating_add(b);
        if width >= u64::BITS {
            return Err(ConfigError::AddressTooWide { width });
        }
        let lines = 1usize
            .checked_shl(s)
            .and_then(|sets| sets.checked_mul(e))
            .filter(|&lines| lines <= Self::MAX_LINES);
        let capacity = lines.and_then(|lines| lines.checked_mul(1usize.checked_shl(b)?));
        if capacity.is_none() {
            return Err(ConfigError::TooLarge { s, e, b });
        }
        Ok(Self { s, e, b })
    }
    pub fn set_bits(&self) -> u32 {
        self.s
    }
    pub fn associativity(&self) -> usize {
        self.e
    }
    pub fn block_bits(&self) -> u32 {
        self.b
    }
    pub fn num_sets(&self) -> usize {
        1 << self.s
    }
    pub fn block_size(&self) -> usize {
        1 << self.b
    }
    /// total bytes of data the cache can hold.
    pub fn capacity(&self) -> usize {
        self.num_sets() * self.e * self.block_size()
    }
    /// splits `addr` into tag, set index and block offset.
    /// ```
    /// use cache_sim::geometry::Geometry;
    ///
    /// let g = Geometry::new(1, 1, 1).unwrap();
    /// let d = g.decode(0b110);
    /// assert_eq!((d.tag, d.set, d.offset), (0b1, 0b1, 0b0));
    /// ```
    pub fn decode(&self, addr: u64) -> DecodedAddr {
        let width = self.s + self.b;
        DecodedAddr {
            tag: addr >> width,
            set: extract(mask_lower(addr, width), self.b..width) as usize,
            offset: mask_lower(addr, self.b),
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "s={}, E={}, b={} (S={}, B={})",
            self.s,
            self.e,
            self.b,
            self.num_sets(),
            self.block_size()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_zero_parameters() {
        assert_eq!(
            Geometry::new(0, 1, 1),
            Err(ConfigError::InvalidGeometry { s: 0, e: 1, b: 1 })
        );
        assert!(Geometry::new(1, 0, 1).is_err());
        assert!(Geometry::new(1, 1, 0).is_err());
    }
    #[test]
    fn test_reject_wide_address() {
        assert_eq!(
            Geometry::new(32, 1, 32),
            Err(ConfigError::AddressTooWide { width: 64 })
        );
        assert!(Geometry::new(20, 1, 43).is_ok());
    }
    #[test]
    fn test_reject_unallocatable_line_store() {
        for (s, e, b) in [(4, usize::MAX / 2, 4), (62, 1, 1), (32, 1, 31), (12, 1 << 13, 4)] {
            assert_eq!(
                Geometry::new(s, e, b),
                Err(ConfigError::TooLarge { s, e, b }),
                "s={s}, E={e}, b={b}"
            );
        }
        let g = Geometry::new(12, 1 << 12, 4).unwrap();
        assert_eq!(g.num_sets() * g.associativity(), Geometry::MAX_LINES);
    }
    #[test]
    fn test_derived_sizes() {
        let g = Geometry::REFERENCE_DIRECT_MAPPED;
        assert_eq!(g.num_sets(), 32);
        assert_eq!(g.block_size(), 32);
        assert_eq!(g.capacity(), 1024);
        let g = Geometry::new(4, 2, 4).unwrap();
        assert_eq!(g.capacity(), 16 * 2 * 16);
    }
    #[test]
    fn test_decode_small() {
        let g = Geometry::new(1, 1, 1).unwrap();
        let sets: Vec<_> = [0u64, 2, 4].iter().map(|&a| g.decode(a).set).collect();
        assert_eq!(sets, vec![0, 1, 0]);
        assert_eq!(g.decode(0).tag, 0);
        assert_eq!(g.decode(4).tag, 1);
        assert_eq!(g.decode(5).offset, 1);
    }
    #[test]
    fn test_decode_matches_shift_and_mask() {
        let g = Geometry::new(4, 2, 5).unwrap();
        let (s, b) = (4u32, 5u32);
        for addr in [0u64, 0x10, 0x7ff, 0x1234_5678, 0xdead_beef_cafe, u64::MAX] {
            let d = g.decode(addr);
            assert_eq!(d.tag, addr >> (s + b), "addr: {addr:#x}");
            assert_eq!(
                d.set as u64,
                (addr & ((1 << (s + b)) - 1)) >> b,
                "addr: {addr:#x}"
            );
            assert_eq!(d.offset, addr & ((1 << b) - 1));
        }
    }
}
