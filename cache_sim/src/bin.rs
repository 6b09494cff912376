use std::ops::Range;

/// mask with the lower `width` bits set. `width` may be up to 64.
#[inline]
pub const fn bit_range_lower(width: u32) -> u64 {
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// mask covering bits `[r.start, r.end)`.
#[inline]
pub const fn bit_range(r: Range<u32>) -> u64 {
    bit_range_lower(r.end) & !bit_range_lower(r.start)
}

#[inline]
pub const fn mask_lower(value: u64, width: u32) -> u64 {
    value & bit_range_lower(width)
}

/// bits `[r.start, r.end)` of `value`, shifted down to bit 0.
/// ```
/// use cache_sim::bin::extract;
///
/// assert_eq!(extract(0b1011_0100, 2..6), 0b1101);
/// ```
#[inline]
pub const fn extract(value: u64, r: Range<u32>) -> u64 {
    let left = r.start;
    (value & bit_range(r)) >> left
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_range() {
        assert_eq!(0b1, bit_range(0..1));
        assert_eq!(0b110000, bit_range(4..6));
        assert_eq!(0b1111111, bit_range(0..7));
        assert_eq!(u64::MAX, bit_range(0..64));
        assert_eq!(0, bit_range(3..3));
    }
    #[test]
    fn test_mask_lower() {
        assert_eq!(0, bit_range_lower(0));
        assert_eq!(0xef, mask_lower(0xdead_beef, 8));
        assert_eq!(u64::MAX, mask_lower(u64::MAX, 64));
    }
    #[test]
    fn test_extract() {
        let v = 0xdead_beefu64;
        assert_eq!(0xbeef, extract(v, 0..16));
        assert_eq!(0xdead, extract(v, 16..32));
        assert_eq!(v >> 40, extract(v, 40..64));
    }
}
