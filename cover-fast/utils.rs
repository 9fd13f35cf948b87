//! Bit tricks for the FAST segment test

/// Check whether the circular 16-bit mask contains at least `run` consecutive set bits.
///
/// Bit `i` corresponds to circle pixel `i`; the run may wrap from bit 15 to bit 0.
pub fn has_consecutive_bits(mask: u16, run: u32) -> bool {
    if run == 0 || run > 16 {
        return false;
    }
    if mask == u16::MAX {
        return true;
    }

    // AND together rotations; a surviving bit marks the start of a long enough run
    let mut test_mask = mask;
    for i in 1..run {
        test_mask &= mask.rotate_right(i);
        if test_mask == 0 {
            return false;
        }
    }

    test_mask != 0
}

/// Straightforward scan over the doubled circle, used to cross-check the bitmask version
pub fn has_consecutive_bits_scan(mask: u16, run: u32) -> bool {
    if run == 0 || run > 16 {
        return false;
    }

    let mut current = 0;
    for i in 0..32 {
        if mask & (1 << (i % 16)) != 0 {
            current += 1;
            if current >= run {
                return true;
            }
        } else {
            current = 0;
        }
    }

    false
}

/// Pack 16 circle flags into a mask
pub fn mask_from_flags(flags: &[bool; 16]) -> u16 {
    flags
        .iter()
        .enumerate()
        .fold(0u16, |mask, (i, &set)| if set { mask | (1 << i) } else { mask })
}
